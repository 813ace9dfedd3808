use once_cell::sync::Lazy;
use regex::Regex;

/// Names of the style-definition APIs. Anything extractable mentions one of them.
static STYLE_API_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(styled|css)").unwrap());

/// Cheap pre-check run before the syntax transform.
///
/// Never returns `false` for code that uses `css` or `styled`; a `true` for code that doesn't
/// only costs one wasted transform.
pub fn might_contain_styles(code: &str) -> bool {
    STYLE_API_MARKER.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_style_apis() {
        assert!(might_contain_styles("const a = css`color: red;`;"));
        assert!(might_contain_styles("const B = styled.div`margin: 0;`;"));
        assert!(might_contain_styles("import { css } from 'linaria';"));
        assert!(might_contain_styles("const b = styled(Button)`color: red;`;"));
    }

    #[test]
    fn false_positives_are_allowed() {
        // Only a word boundary in front of the marker is required.
        assert!(might_contain_styles("const cssText = 'x';"));
    }

    #[test]
    fn skips_unrelated_code() {
        assert!(!might_contain_styles("export default function add(a, b) { return a + b; }"));
        assert!(!might_contain_styles("const mycss = 1;"));
        assert!(!might_contain_styles("const Styled = 1; const CSS = 2;"));
        assert!(!might_contain_styles(""));
    }
}
