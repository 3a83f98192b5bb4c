// ============================================================
// Error Types
// ============================================================
// One error enum for the whole library. Application and CLI
// layers wrap these in anyhow with extra context.
//
// Three families matter to callers:
//   Configuration / DimensionMismatch — declared sizes and the
//                                       data disagree; fatal
//   Io                                — checkpoint or input file
//                                       missing or unreadable
//   NumericInstability                — NaN/Inf in a loss, a
//                                       parameter or an encoding

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = EmbedError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what:     &'static str,
        expected: usize,
        actual:   usize,
    },

    #[error("IO error at '{}': {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Numeric instability during {stage}: non-finite value {value}")]
    NumericInstability { stage: &'static str, value: f64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Tensor error: {0}")]
    Tensor(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

impl EmbedError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for both configuration variants.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = EmbedError::io(
            "checkpoint/encoder_checkpoint.pt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("checkpoint/encoder_checkpoint.pt"));
    }

    #[test]
    fn test_dimension_mismatch_is_configuration() {
        let err = EmbedError::DimensionMismatch { what: "encoder input", expected: 4, actual: 3 };
        assert!(err.is_configuration());
        assert!(!EmbedError::Tensor("x".into()).is_configuration());
    }
}
