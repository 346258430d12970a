//! Error types shared by the reflection service and the configuration loader.
//!
//! Generation errors never reach the player: `ReflectionGenerator::generate`
//! absorbs every variant and answers with fallback text instead.

/// Failures reported by a [`crate::reflection::TextService`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("rate limited ({status}): {message}")]
    RateLimited { status: u16, message: String },
    #[error("generation request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no API key configured")]
    MissingApiKey,
}

impl GenerationError {
    /// Quota / rate exhaustion is the only class worth retrying.
    ///
    /// Transports do not always surface a structured status, so request
    /// failures whose message mentions 429 or a quota are treated the same way.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GenerationError::RateLimited { .. } => true,
            GenerationError::RequestFailed(msg) => message_signals_rate_limit(msg),
            GenerationError::InvalidResponse(_) | GenerationError::MissingApiKey => false,
        }
    }
}

/// Classify a raw status + message pair coming back from the service.
pub fn classify_failure(status: u16, message: &str) -> GenerationError {
    if status == 429 || message_signals_rate_limit(message) {
        GenerationError::RateLimited {
            status,
            message: message.to_string(),
        }
    } else {
        GenerationError::RequestFailed(format!("HTTP {status}: {message}"))
    }
}

fn message_signals_rate_limit(message: &str) -> bool {
    message.contains("429")
        || message.contains("RESOURCE_EXHAUSTED")
        || message.to_ascii_lowercase().contains("quota")
}

/// Problems found while loading or validating [`crate::config::VignetteConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not parse configuration: {0}")]
    Parse(String),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
