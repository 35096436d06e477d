//! # herald-store
//!
//! SQLite persistence for campaigns, contacts, conversation history, prompts,
//! the tenant directory, and the webhook outbox.

pub mod store;

pub use store::{ContactStats, ImportReport, OutboxEntry, OutboxStatus, Store, UpsertOutcome};
