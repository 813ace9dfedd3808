//! Rebasing of relative asset references.
//!
//! A `url(./img.png)` written next to `src/button.js` points at `src/img.png`. Once the rule
//! lands in `dist/app.css` the same text would point at `dist/img.png`, so relative paths are
//! re-expressed from the stylesheet's directory. Everything here is lexical; the filesystem
//! is never touched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Component, Path};

static RELATIVE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(url\()(\.[^)]+)(\))").unwrap());

/// Rewrites relative asset paths from the source file's directory to the output file's.
#[derive(Debug, Clone)]
pub struct AssetRebaser {
    source_dir: Option<NormalPath>,
    output_dir: Option<NormalPath>,
}

impl AssetRebaser {
    /// `filename` is the source file, `output_filename` the stylesheet being written.
    pub fn new(filename: &str, output_filename: &str) -> Self {
        AssetRebaser {
            source_dir: NormalPath::parent_of(filename),
            output_dir: NormalPath::parent_of(output_filename),
        }
    }

    /// Returns the rebased form of `url`, or `None` when it should be left alone.
    ///
    /// Only paths starting with `.` are considered. Paths that cannot be resolved lexically
    /// (climbing above the root, or mixing absolute and relative filenames) are left alone too.
    pub fn rebase_url(&self, url: &str) -> Option<String> {
        if !url.starts_with('.') {
            return None;
        }

        let rebased = self.source_dir.as_ref().zip(self.output_dir.as_ref()).and_then(
            |(source_dir, output_dir)| {
                let asset = source_dir.join(url)?;
                asset.relative_to(output_dir)
            },
        );

        if rebased.is_none() {
            log::warn!("cannot rebase asset url `{}`, leaving it as written", url);
        }
        rebased
    }

    /// Rewrites every unquoted relative `url(...)` in a raw declaration.
    pub fn rebase_declaration(&self, declaration: &str) -> String {
        RELATIVE_URL
            .replace_all(declaration, |caps: &Captures<'_>| match self.rebase_url(&caps[2]) {
                Some(url) => format!("{}{}{}", &caps[1], url, &caps[3]),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// A path with `.` and `..` resolved away.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalPath {
    /// `None` for relative paths, otherwise the root (plus any Windows prefix).
    root: Option<String>,
    /// Relative paths may keep leading `..` segments.
    parts: Vec<String>,
}

impl NormalPath {
    fn parent_of(filename: &str) -> Option<Self> {
        let parent = Path::new(filename).parent().unwrap_or_else(|| Path::new(""));
        NormalPath::from_path(parent)
    }

    fn from_path(path: &Path) -> Option<Self> {
        let mut normal = NormalPath {
            root: None,
            parts: Vec::new(),
        };
        normal.push_components(path)?;
        Some(normal)
    }

    fn join(&self, relative: &str) -> Option<Self> {
        let mut joined = self.clone();
        joined.push_components(Path::new(relative))?;
        Some(joined)
    }

    fn push_components(&mut self, path: &Path) -> Option<()> {
        for component in path.components() {
            match component {
                Component::Prefix(prefix) => {
                    self.root = Some(prefix.as_os_str().to_string_lossy().into_owned());
                    self.parts.clear();
                }
                Component::RootDir => {
                    let mut root = self.root.take().unwrap_or_default();
                    root.push('/');
                    self.root = Some(root);
                    self.parts.clear();
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    let can_pop = self.parts.last().is_some_and(|last| last != "..");
                    if can_pop {
                        self.parts.pop();
                    } else if self.root.is_none() {
                        self.parts.push("..".to_string());
                    } else {
                        return None;
                    }
                }
                Component::Normal(part) => self.parts.push(part.to_string_lossy().into_owned()),
            }
        }
        Some(())
    }

    /// `self` as seen from directory `base`, joined with `/`.
    fn relative_to(&self, base: &NormalPath) -> Option<String> {
        if self.root != base.root {
            return None;
        }

        let common = self
            .parts
            .iter()
            .zip(&base.parts)
            .take_while(|(a, b)| a == b)
            .count();

        let climbs = &base.parts[common..];
        // Can't climb out of a directory whose name is unknown.
        if climbs.iter().any(|part| part == "..") {
            return None;
        }

        let segments: Vec<&str> = climbs
            .iter()
            .map(|_| "..")
            .chain(self.parts[common..].iter().map(String::as_str))
            .collect();

        if segments.is_empty() {
            Some(".".to_string())
        } else {
            Some(segments.join("/"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rebases_into_sibling_directory() {
        let rebaser = AssetRebaser::new("/proj/src/a.js", "/proj/dist/a.css");
        assert_eq!(rebaser.rebase_url("./img.png"), Some("../src/img.png".to_string()));
        assert_eq!(
            rebaser.rebase_url("../assets/logo.svg"),
            Some("../assets/logo.svg".to_string())
        );
    }

    #[test]
    fn rebases_into_nested_and_same_directory() {
        let nested = AssetRebaser::new("/proj/src/a.js", "/proj/src/styles/out/a.css");
        assert_eq!(nested.rebase_url("./img.png"), Some("../../img.png".to_string()));

        let same = AssetRebaser::new("/proj/src/a.js", "/proj/src/a.css");
        assert_eq!(same.rebase_url("./img/x.png"), Some("img/x.png".to_string()));
    }

    #[test]
    fn rebases_between_relative_filenames() {
        let rebaser = AssetRebaser::new("src/components/button.js", "build/app.css");
        assert_eq!(
            rebaser.rebase_url("./icons/../arrow.svg"),
            Some("../src/components/arrow.svg".to_string())
        );
    }

    #[test]
    fn leaves_non_relative_urls_alone() {
        let rebaser = AssetRebaser::new("/proj/src/a.js", "/proj/dist/a.css");
        assert_eq!(rebaser.rebase_url("/static/img.png"), None);
        assert_eq!(rebaser.rebase_url("http://cdn.example.com/img.png"), None);
        assert_eq!(rebaser.rebase_url("data:image/png;base64,AAAA"), None);
        assert_eq!(rebaser.rebase_url("img.png"), None);
    }

    #[test]
    fn unresolvable_paths_are_left_alone() {
        let above_root = AssetRebaser::new("/a.js", "/dist/a.css");
        assert_eq!(above_root.rebase_url("../../img.png"), None);

        let mixed = AssetRebaser::new("src/a.js", "/proj/dist/a.css");
        assert_eq!(mixed.rebase_url("./img.png"), None);

        let unknown_dir = AssetRebaser::new("../a.js", "b.css");
        assert_eq!(unknown_dir.rebase_url("./img.png"), Some("../img.png".to_string()));
        let climbing_output = AssetRebaser::new("a.js", "../out/b.css");
        assert_eq!(climbing_output.rebase_url("./img.png"), None);
    }

    #[test]
    fn rewrites_declaration_text() {
        let rebaser = AssetRebaser::new("/proj/src/a.js", "/proj/dist/a.css");
        assert_eq!(
            rebaser.rebase_declaration("background:url(./img.png)"),
            "background:url(../src/img.png)"
        );
        assert_eq!(
            rebaser.rebase_declaration(
                "background:url(./a.png),url(http://x.io/b.png),url(/c.png),url(../d.png)"
            ),
            "background:url(../src/a.png),url(http://x.io/b.png),url(/c.png),url(../d.png)"
        );
        assert_eq!(rebaser.rebase_declaration("color:red"), "color:red");
    }
}
