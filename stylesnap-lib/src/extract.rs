// Fully-owned view of what the syntax transform hands us.
use crate::error::Result;
use crate::options::TransformOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the original source. `line` is 1-based, `column` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One statically extracted style definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Raw declaration body, e.g. `color: red; &:hover { color: blue; }`.
    pub css_text: String,
    /// Human readable name of the definition, usually the variable it was assigned to.
    #[serde(default)]
    pub display_name: String,
    /// Where the definition starts in the source, if the transform could tell.
    #[serde(default)]
    pub start: Option<Location>,
}

impl Rule {
    pub fn new(css_text: impl Into<String>, display_name: impl Into<String>) -> Self {
        Rule {
            css_text: css_text.into(),
            display_name: display_name.into(),
            start: None,
        }
    }

    pub fn with_start(mut self, line: u32, column: u32) -> Self {
        self.start = Some(Location::new(line, column));
        self
    }
}

/// One-line summary used in logs, e.g. `title @ 3:14`.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)?;
        if let Some(start) = self.start {
            write!(f, " @ {}", start)?;
        }
        Ok(())
    }
}

/// Rules keyed by selector, in the order the transform produced them.
pub type Rules = IndexMap<String, Rule>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

/// A span of the original source that the syntax transform collapsed. Passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub original: Span,
    pub length: u32,
}

/// Everything the syntax transform produced for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    /// The program text with style definitions replaced by class names.
    pub code: String,
    #[serde(default)]
    pub source_map: Option<serde_json::Value>,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    /// Modules the extracted styles depend on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The syntax-level half of the pipeline: finds style definitions in `code` and rewrites it.
///
/// Returning `Ok(None)` means nothing was extracted and the input is used as is.
pub trait SyntaxTransform {
    fn transform(&self, code: &str, options: &TransformOptions) -> Result<Option<Extraction>>;
}

impl<F> SyntaxTransform for F
where
    F: Fn(&str, &TransformOptions) -> Result<Option<Extraction>>,
{
    fn transform(&self, code: &str, options: &TransformOptions) -> Result<Option<Extraction>> {
        self(code, options)
    }
}

/// A syntax transform that already ran elsewhere and saved its result as JSON.
///
/// The document is an [`Extraction`] with camelCase keys, or `null` when nothing was found.
#[derive(Debug, Clone)]
pub struct JsonExtraction {
    document: String,
}

impl JsonExtraction {
    pub fn new(document: impl Into<String>) -> Self {
        JsonExtraction {
            document: document.into(),
        }
    }
}

impl SyntaxTransform for JsonExtraction {
    fn transform(&self, _code: &str, options: &TransformOptions) -> Result<Option<Extraction>> {
        let extraction: Option<Extraction> = serde_json::from_str(&self.document)?;
        log::debug!(
            "loaded extraction for {} ({} rules)",
            options.filename,
            extraction.as_ref().map_or(0, |e| e.rules.len())
        );
        Ok(extraction)
    }
}
