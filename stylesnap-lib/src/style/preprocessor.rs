use crate::error::{BoxError, ExtractError, Result};
use crate::options::TransformOptions;
use crate::style::nesting::NestingEngine;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Caller-supplied `(selector, css_text) -> css` function.
pub type CustomPreprocessor =
    Arc<dyn Fn(&str, &str) -> std::result::Result<String, BoxError> + Send + Sync>;

/// How each rule's CSS text is turned into stylesheet text.
#[derive(Clone, Default)]
pub enum Preprocessor {
    /// Wrap the body in the selector block verbatim.
    NoWrap,
    /// Flatten nesting and minify with LightningCSS.
    #[default]
    Nesting,
    Custom(CustomPreprocessor),
}

impl Preprocessor {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        Preprocessor::Custom(Arc::new(f))
    }

    /// Builds the callable used for every rule of one invocation.
    pub fn resolve(&self, options: &TransformOptions) -> ResolvedPreprocessor {
        match self {
            Preprocessor::NoWrap => ResolvedPreprocessor::NoWrap,
            Preprocessor::Nesting => ResolvedPreprocessor::Nesting(NestingEngine::new(options)),
            Preprocessor::Custom(f) => ResolvedPreprocessor::Custom(Arc::clone(f)),
        }
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preprocessor::NoWrap => f.write_str("NoWrap"),
            Preprocessor::Nesting => f.write_str("Nesting"),
            Preprocessor::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for Preprocessor {
    type Err = ExtractError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "none" => Ok(Preprocessor::NoWrap),
            "nesting" => Ok(Preprocessor::Nesting),
            other => Err(ExtractError::UnknownPreprocessor(other.to_string())),
        }
    }
}

/// A [`Preprocessor`] bound to one invocation's filenames.
pub enum ResolvedPreprocessor {
    NoWrap,
    Nesting(NestingEngine),
    Custom(CustomPreprocessor),
}

impl ResolvedPreprocessor {
    pub fn process(&self, selector: &str, css_text: &str) -> Result<String> {
        match self {
            ResolvedPreprocessor::NoWrap => Ok(format!("{} {{{}}}\n", selector, css_text)),
            ResolvedPreprocessor::Nesting(engine) => engine.process(selector, css_text),
            ResolvedPreprocessor::Custom(f) => {
                f(selector, css_text).map_err(|e| ExtractError::Preprocess {
                    selector: selector.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
