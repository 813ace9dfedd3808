use thiserror::Error;

/// Boxed error returned by caller-supplied preprocessors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A rule could not be turned into CSS text. Aborts the whole transform.
    #[error("failed to preprocess rule `{selector}`: {message}")]
    Preprocess { selector: String, message: String },

    #[error("syntax transform failed: {0}")]
    Collaborator(String),

    #[error("invalid extraction document: {0}")]
    InvalidExtraction(#[from] serde_json::Error),

    #[error("failed to build stylesheet source map: {0}")]
    SourceMap(#[from] sourcemap::Error),

    #[error("unknown preprocessor `{0}` (expected `none` or `nesting`)")]
    UnknownPreprocessor(String),
}
