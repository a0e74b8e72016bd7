/// Error types for the bot library
///
/// Storage failures are normally absorbed by the stores (safe default plus a
/// log line). `BotError` is what crosses module boundaries when a caller has
/// to decide what to tell the user.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Candle API error: {0}")]
    Api(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    /// True for errors caused by user input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(self, BotError::Validation(_))
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(e: teloxide::RequestError) -> Self {
        BotError::Telegram(e.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        BotError::Api(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(BotError::Validation("activations must be positive".into()).is_validation());
        assert!(!BotError::Storage("disk full".into()).is_validation());
    }

    #[test]
    fn test_io_conversion_message() {
        let err: BotError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
