use thiserror::Error;

/// Errors emitted while configuring or running a generation pass.
///
/// Every failure aborts the pass; generators never expose a partially built
/// mesh or marker set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Malformed or missing field in a WRLD document.
    #[error("failed to parse `{path}`: {message}")]
    Parse {
        /// Field path inside the document, e.g. `stacks[0].stackHeight`.
        path: String,
        /// What went wrong at that path.
        message: String,
    },
    /// Numeric configuration outside its accepted range.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Layer data disagrees with the declared world dimensions.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
}

impl GenerationError {
    /// Build a [`GenerationError::Parse`] for `path`.
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a [`GenerationError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Build a [`GenerationError::DataIntegrity`].
    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::DataIntegrity(message.into())
    }
}

/// Result alias used across the generator crates.
pub type GenerationResult<T> = Result<T, GenerationError>;
