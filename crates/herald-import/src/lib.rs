//! # herald-import
//!
//! Turns a pasted or uploaded contact list into validated [`ImportContact`]s.
//!
//! [`ImportContact`]: herald_core::model::ImportContact

pub mod parse;
pub mod phone;

pub use parse::{parse_contacts, ImportOutcome, ParseOptions, MAX_COLUMNS};
pub use phone::{
    format_phone_number, normalize_country_code, normalize_phone, validate_phone_number,
    validate_phone_number_for_country, PhoneRejection,
};
