use crate::assemble::{assemble, Mapping};
use crate::error::Result;
use crate::extract::{Extraction, Replacement, Rules, SyntaxTransform};
use crate::guard::might_contain_styles;
use crate::options::TransformOptions;
use crate::source_map::build_source_map;

/// The stylesheet assembled from one file's rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    css_text: String,
    mappings: Vec<Mapping>,
    filename: String,
    source: String,
}

impl Stylesheet {
    pub fn css_text(&self) -> &str {
        &self.css_text
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Builds the stylesheet's source map. Empty when there are no rules.
    ///
    /// Computed from the stored mappings on every call; nothing upstream runs again.
    pub fn source_map(&self) -> Result<String> {
        build_source_map(&self.mappings, &self.filename, &self.source)
    }
}

/// Output of [`transform`].
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Rewritten program text, or the input when nothing was extracted.
    pub code: String,
    pub source_map: Option<serde_json::Value>,
    /// `None` when the file had nothing to extract.
    pub stylesheet: Option<Stylesheet>,
    pub rules: Rules,
    pub replacements: Vec<Replacement>,
    pub dependencies: Vec<String>,
}

impl TransformResult {
    fn unchanged(code: &str, options: &TransformOptions) -> Self {
        TransformResult {
            code: code.to_string(),
            source_map: options.input_source_map.clone(),
            stylesheet: None,
            rules: Rules::new(),
            replacements: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn is_extracted(&self) -> bool {
        self.stylesheet.is_some()
    }

    pub fn css_text(&self) -> &str {
        self.stylesheet.as_ref().map_or("", Stylesheet::css_text)
    }

    /// Source map of [`Self::css_text`], or an empty string when there is none.
    pub fn css_source_map(&self) -> Result<String> {
        match &self.stylesheet {
            Some(stylesheet) => stylesheet.source_map(),
            None => Ok(String::new()),
        }
    }
}

/// Extracts the styles defined in `code` into a stylesheet.
///
/// Code that never mentions `css` or `styled` is returned as is without calling `syntax`.
/// Any preprocessor failure fails the whole call.
pub fn transform<S>(code: &str, options: &TransformOptions, syntax: &S) -> Result<TransformResult>
where
    S: SyntaxTransform + ?Sized,
{
    if !might_contain_styles(code) {
        log::debug!("{}: no style definitions, skipping", options.filename);
        return Ok(TransformResult::unchanged(code, options));
    }

    let Some(extraction) = syntax.transform(code, options)? else {
        log::debug!("{}: nothing extracted", options.filename);
        return Ok(TransformResult::unchanged(code, options));
    };

    let Extraction {
        code: transformed_code,
        source_map,
        rules,
        replacements,
        dependencies,
    } = extraction;

    let preprocessor = options.preprocessor.resolve(options);
    let assembly = assemble(&rules, &preprocessor)?;
    log::debug!(
        "{}: extracted {} rules ({} dependencies)",
        options.filename,
        rules.len(),
        dependencies.len()
    );

    Ok(TransformResult {
        code: transformed_code,
        source_map,
        stylesheet: Some(Stylesheet {
            css_text: assembly.css_text,
            mappings: assembly.mappings,
            filename: options.filename.clone(),
            source: code.to_string(),
        }),
        rules,
        replacements,
        dependencies,
    })
}
