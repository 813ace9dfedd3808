//! Turns style rules extracted from program source into a standalone stylesheet.
//!
//! The syntax-level work (finding `css`/`styled` definitions and rewriting the program) is
//! done by a [`extract::SyntaxTransform`] collaborator. This crate takes its output, runs
//! every rule through a [`style::preprocessor::Preprocessor`], and assembles the stylesheet
//! together with a source map pointing back at the original definitions.

pub mod assemble;
pub mod error;
pub mod extract;
pub mod guard;
pub mod options;
pub mod snap_transform;
pub mod source_map;
pub mod style;

pub use error::{ExtractError, Result};
pub use extract::{Extraction, JsonExtraction, Location, Replacement, Rule, Rules, SyntaxTransform};
pub use options::TransformOptions;
pub use snap_transform::{transform, Stylesheet, TransformResult};
pub use style::preprocessor::Preprocessor;
