use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScripturaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScripturaError {
    /// Short error code string returned in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ScripturaError::Config(_) => "CONFIG_ERROR",
            ScripturaError::Signature(_) => "SIGNATURE_ERROR",
            ScripturaError::MalformedEvent(_) => "MALFORMED_EVENT",
            ScripturaError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScripturaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ScripturaError::Config("x".into()).code(), "CONFIG_ERROR");
        assert_eq!(
            ScripturaError::Signature("bad".into()).code(),
            "SIGNATURE_ERROR"
        );
        assert_eq!(
            ScripturaError::MalformedEvent("no entry".into()).code(),
            "MALFORMED_EVENT"
        );
    }

    #[test]
    fn json_errors_convert() {
        let err: ScripturaError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "SERIALIZATION_ERROR");
    }
}
