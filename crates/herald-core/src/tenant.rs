//! Tenant context threaded through every storage call.
//!
//! Each customer's data lives under its own schema name. Handlers resolve a
//! [`TenantContext`] once per request and pass it down explicitly.

use crate::error::HeraldError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a schema name (PostgreSQL identifier limit).
const MAX_SCHEMA_LEN: usize = 63;

/// A validated tenant schema name: ASCII letters, digits and `_`, not
/// starting with a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

impl SchemaName {
    pub fn parse(raw: &str) -> Result<Self, HeraldError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(HeraldError::Unauthorized("missing tenant schema".into()));
        }
        if name.len() > MAX_SCHEMA_LEN {
            return Err(HeraldError::Validation(format!(
                "schema name longer than {MAX_SCHEMA_LEN} characters"
            )));
        }
        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(HeraldError::Validation(format!(
                "invalid schema name '{name}'"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchemaName {
    type Error = HeraldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaName> for String {
    fn from(value: SchemaName) -> Self {
        value.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is calling and which tenant's data they act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub schema: SchemaName,
    /// Authenticated user id, when the session carries one.
    pub auth_user_id: Option<String>,
}

impl TenantContext {
    pub fn new(schema: SchemaName) -> Self {
        Self {
            schema,
            auth_user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.auth_user_id = Some(user_id.into());
        self
    }

    pub fn schema_name(&self) -> &str {
        self.schema.as_str()
    }

    /// The authenticated user id, or `Unauthorized` when absent.
    pub fn require_user(&self) -> Result<&str, HeraldError> {
        self.auth_user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HeraldError::Unauthorized("User not authenticated".into()))
    }
}
