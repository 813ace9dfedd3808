use crate::error::{ExtractError, Result};
use crate::options::TransformOptions;
use crate::style::url_rebase::AssetRebaser;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Features, Targets};
use lightningcss::values::url::Url;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use once_cell::sync::Lazy;
use regex::Regex;
use std::convert::Infallible;

/// `:global(.dark)` opts a selector out of scoping; here it just becomes `.dark`.
static GLOBAL_SELECTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r":global\(([^)]*)\)").unwrap());

/// The default preprocessor: flattens nested rules and minifies with LightningCSS.
///
/// Built fresh for every transform so the URL hook only ever sees the filenames of the
/// current invocation.
#[derive(Debug, Clone)]
pub struct NestingEngine {
    filename: String,
    rebaser: Option<AssetRebaser>,
}

impl NestingEngine {
    pub fn new(options: &TransformOptions) -> Self {
        NestingEngine {
            filename: options.filename.clone(),
            rebaser: options
                .output_filename
                .as_deref()
                .map(|output| AssetRebaser::new(&options.filename, output)),
        }
    }

    /// Wraps `css_text` in `selector { ... }` and prints it back as a single minified line.
    pub fn process(&self, selector: &str, css_text: &str) -> Result<String> {
        let css_text = GLOBAL_SELECTOR.replace_all(css_text, "$1");
        let source = format!("{} {{{}}}", selector, css_text);
        let parser_opts = ParserOptions {
            filename: self.filename.clone(),
            ..ParserOptions::default()
        };

        let mut sheet = StyleSheet::parse(&source, parser_opts)
            .map_err(|e| preprocess_error(selector, e))?;

        // The only hook: declaration values get their relative url()s rebased.
        if let Some(rebaser) = &self.rebaser {
            let mut hook = UrlRebaseHook { rebaser };
            sheet
                .visit(&mut hook)
                .unwrap_or_else(|never: Infallible| match never {});
        }

        sheet
            .minify(MinifyOptions {
                targets: flatten_nesting(),
                ..MinifyOptions::default()
            })
            .map_err(|e| preprocess_error(selector, e))?;

        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                targets: flatten_nesting(),
                ..PrinterOptions::default()
            })
            .map_err(|e| preprocess_error(selector, e))?;

        log::trace!("{} -> {}", selector, printed.code);
        Ok(printed.code)
    }
}

/// Targets that never support nesting, so every nested rule is lowered to a flat one.
fn flatten_nesting() -> Targets {
    Targets {
        include: Features::Nesting,
        ..Targets::default()
    }
}

fn preprocess_error(selector: &str, err: impl std::fmt::Display) -> ExtractError {
    ExtractError::Preprocess {
        selector: selector.to_string(),
        message: err.to_string(),
    }
}

/// Visitor that rebases relative URLs found in declarations.
struct UrlRebaseHook<'a> {
    rebaser: &'a AssetRebaser,
}

impl<'i, 'a> Visitor<'i> for UrlRebaseHook<'a> {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        lightningcss::visit_types!(URLS)
    }

    fn visit_url(&mut self, url: &mut Url<'i>) -> std::result::Result<(), Self::Error> {
        if let Some(rebased) = self.rebaser.rebase_url(url.url.as_ref()) {
            url.url = rebased.into();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flattens_nested_rules_on_one_line() {
        let engine = NestingEngine::new(&TransformOptions::new("/app/src/button.js"));
        let css = engine
            .process(
                ".button_x1",
                "\n  color: red;\n  &:hover {\n    color: green;\n  }\n",
            )
            .unwrap();

        assert!(!css.contains('\n'), "expected a single line, got {css:?}");
        assert!(!css.contains('&'), "nesting was not flattened: {css:?}");
        assert!(css.starts_with(".button_x1{color:red}"), "got {css:?}");
        assert!(css.contains(".button_x1:hover{"), "got {css:?}");
    }

    #[test]
    fn plain_declarations_are_minified() {
        let engine = NestingEngine::new(&TransformOptions::new("/app/src/title.js"));
        let css = engine.process(".title_x2", "  margin: 0 ;  ").unwrap();
        assert_eq!(css, ".title_x2{margin:0}");
    }

    #[test]
    fn unwraps_global_selectors() {
        let engine = NestingEngine::new(&TransformOptions::new("/app/src/theme.js"));
        let css = engine
            .process(".theme_x3", "color: black; :global(.dark) & { color: white; }")
            .unwrap();

        assert!(!css.contains(":global"), "got {css:?}");
        assert!(css.contains(".dark .theme_x3{"), "got {css:?}");
    }

    #[test]
    fn rebases_urls_only_with_an_output_file() {
        let declaration = "background: url(./img.png)";

        let without_output = NestingEngine::new(&TransformOptions::new("/proj/src/a.js"));
        let css = without_output.process(".a", declaration).unwrap();
        assert!(css.contains("./img.png"), "got {css:?}");
        assert!(!css.contains("../src/img.png"), "got {css:?}");

        let with_output = NestingEngine::new(
            &TransformOptions::new("/proj/src/a.js").output_filename("/proj/dist/a.css"),
        );
        let css = with_output.process(".a", declaration).unwrap();
        assert!(css.contains("../src/img.png"), "got {css:?}");
    }

    #[test]
    fn leaves_remote_urls_untouched() {
        let engine = NestingEngine::new(
            &TransformOptions::new("/proj/src/a.js").output_filename("/proj/dist/a.css"),
        );
        let css = engine
            .process(".a", "background: url(http://cdn.example.com/img.png)")
            .unwrap();
        assert!(css.contains("http://cdn.example.com/img.png"), "got {css:?}");
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let engine = NestingEngine::new(&TransformOptions::new("/app/src/broken.js"));
        let err = engine.process("..broken", "color: red;").unwrap_err();
        assert!(matches!(err, ExtractError::Preprocess { ref selector, .. } if selector == "..broken"));
    }
}
