//! # herald-core
//!
//! Core types, traits, configuration, and error handling for Herald.

pub mod config;
pub mod error;
pub mod model;
pub mod template;
pub mod tenant;
pub mod traits;

pub use config::shellexpand;
