use crate::style::preprocessor::Preprocessor;

/// Per-invocation settings for [`crate::transform`].
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Path of the source file being transformed.
    pub filename: String,
    /// Where the stylesheet will be written. Enables rebasing of relative `url(...)`s.
    pub output_filename: Option<String>,
    pub preprocessor: Preprocessor,
    /// Source map of `code`, returned untouched when nothing is extracted.
    pub input_source_map: Option<serde_json::Value>,
}

impl TransformOptions {
    pub fn new(filename: impl Into<String>) -> Self {
        TransformOptions {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn output_filename(mut self, output_filename: impl Into<String>) -> Self {
        self.output_filename = Some(output_filename.into());
        self
    }

    pub fn preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn input_source_map(mut self, source_map: serde_json::Value) -> Self {
        self.input_source_map = Some(source_map);
        self
    }
}
