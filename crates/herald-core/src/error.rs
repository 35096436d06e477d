use thiserror::Error;

/// Top-level error type for Herald.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Request data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or unusable caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested record does not exist for this tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(String),

    /// Outbound webhook or template catalog error.
    #[error("webhook error: {0}")]
    Webhook(String),

    /// Contact import error.
    #[error("import error: {0}")]
    Import(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HeraldError::Validation("name is required".into());
        assert_eq!(err.to_string(), "validation error: name is required");

        let err = HeraldError::NotFound("campaign c1".into());
        assert_eq!(err.to_string(), "not found: campaign c1");

        let err = HeraldError::Webhook("returned 502".into());
        assert_eq!(err.to_string(), "webhook error: returned 502");
    }

    #[test]
    fn test_error_from_serde() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: HeraldError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("serialization error:"));
    }
}
