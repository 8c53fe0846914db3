//! Error types for configuration resolution.

/// Errors raised while resolving a run configuration.
///
/// Only the strict policy produces these; the lenient policy falls back
/// to defaults and logs instead.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Architecture selector is neither `rv32` nor `rv64`.
    #[error("unknown architecture '{value}' (expected rv32 or rv64)")]
    UnknownArch {
        /// The rejected selector text.
        value: String,
    },

    /// Hart count is not a positive integer.
    #[error("invalid hart count '{value}' (expected a positive integer)")]
    InvalidHartCount {
        /// The rejected hart count text.
        value: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
