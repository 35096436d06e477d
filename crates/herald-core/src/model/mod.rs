//! Domain records shared by the store, the importer, and the API.

mod campaign;
mod contact;
mod message;
mod prompt;

pub use campaign::*;
pub use contact::*;
pub use message::*;
pub use prompt::*;
