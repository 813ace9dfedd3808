use crate::error::Result;
use crate::extract::{Location, Rules};
use crate::style::preprocessor::ResolvedPreprocessor;

/// Ties the start of one rule in the stylesheet to its definition in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Line (1-based) where the rule's output begins; column is always 0.
    pub generated: Location,
    /// `None` when the syntax transform could not locate the definition.
    pub original: Option<Location>,
    /// The rule's selector.
    pub name: String,
}

/// Stylesheet text plus one [`Mapping`] per rule, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub css_text: String,
    pub mappings: Vec<Mapping>,
}

/// Runs every rule through `preprocessor` and concatenates the results.
///
/// Each rule's output is terminated by exactly one newline. With single-line output (the
/// nesting engine always produces it) rule `i` starts on line `i + 1`; multi-line output from
/// other preprocessors shifts the following rules and their mappings accordingly.
///
/// A rule whose output is empty (an empty body under the nesting engine) still takes up a
/// blank line, so the rules after it keep their positions.
///
/// The first preprocessor error aborts assembly and is returned as is.
pub fn assemble(rules: &Rules, preprocessor: &ResolvedPreprocessor) -> Result<Assembly> {
    let mut assembly = Assembly {
        css_text: String::new(),
        mappings: Vec::with_capacity(rules.len()),
    };
    let mut line: u32 = 1;

    for (selector, rule) in rules {
        assembly.mappings.push(Mapping {
            generated: Location::new(line, 0),
            original: rule.start,
            name: selector.clone(),
        });

        log::trace!("{}: assembling {} at line {}", selector, rule, line);
        let css = preprocessor.process(selector, &rule.css_text)?;
        let css = css.trim_end_matches(['\n', '\r']);

        assembly.css_text.push_str(css);
        assembly.css_text.push('\n');
        line += css.matches('\n').count() as u32 + 1;
    }

    log::debug!(
        "assembled {} rules into {} lines of css",
        assembly.mappings.len(),
        line - 1
    );
    Ok(assembly)
}
