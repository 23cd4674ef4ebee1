//! Client path normalisation.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use percent_encoding::percent_decode_str;

/// A client-supplied path resolved to a normalised location inside a user's
/// root directory.
///
/// Parsing rejects absolute paths and NUL bytes, and folds `.` and `..`
/// components lexically. A path whose `..` components would ever climb above
/// the root is rejected, even if later components descend again. The same
/// checks run against the percent-decoded form so encoded traversal is
/// refused, but the stored location always uses the literal name the client
/// sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath {
    relative: Utf8PathBuf,
}

impl SafePath {
    /// Parses a client path, returning `None` when it is unsafe.
    ///
    /// ```
    /// use nasd::SafePath;
    ///
    /// let path = SafePath::parse("docs/./drafts/../report.txt").expect("safe");
    /// assert_eq!(path.as_path().as_str(), "docs/report.txt");
    /// assert!(SafePath::parse("../../etc/passwd").is_none());
    /// assert!(SafePath::parse("docs/%2e%2e/%2e%2e/secret").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        resolve(&percent_decode_str(raw).decode_utf8_lossy())?;
        resolve(raw).map(|relative| Self { relative })
    }

    /// Returns true when the path names the user's root itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.relative.as_str().is_empty()
    }

    /// Normalised path relative to the user's root; empty for the root.
    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        &self.relative
    }

    /// Path suitable for capability-relative calls; `.` for the root.
    pub(crate) fn as_dir_path(&self) -> &Utf8Path {
        if self.is_root() {
            Utf8Path::new(".")
        } else {
            self.relative.as_path()
        }
    }

    /// Parent directory and final component, or `None` for the root.
    pub(crate) fn split_parent(&self) -> Option<(&Utf8Path, &str)> {
        let name = self.relative.file_name()?;
        let parent = self.relative.parent().unwrap_or_else(|| Utf8Path::new(""));
        Some((parent, name))
    }
}

fn resolve(path: &str) -> Option<Utf8PathBuf> {
    if path.contains('\0') {
        return None;
    }
    let mut relative = Utf8PathBuf::new();
    for component in Utf8Path::new(path).components() {
        match component {
            Utf8Component::Normal(name) => relative.push(name),
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Utf8Component::RootDir | Utf8Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Returns whether `raw` stays inside the user's root.
#[must_use]
pub fn is_path_safe(raw: &str) -> bool {
    SafePath::parse(raw).is_some()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("docs/report.txt", "docs/report.txt")]
    #[case::current_dir("./docs/./report.txt", "docs/report.txt")]
    #[case::inner_parent("docs/old/../report.txt", "docs/report.txt")]
    #[case::encoded_space("my%20docs/a.txt", "my%20docs/a.txt")]
    #[case::literal_percent("x%41.txt", "x%41.txt")]
    #[case::encoded_inner_parent("docs%2f..%2fa.txt", "docs%2f..%2fa.txt")]
    #[case::undecodable("docs/%ff", "docs/%ff")]
    #[case::trailing_slash("docs/", "docs")]
    #[case::root("", "")]
    #[case::dot(".", "")]
    #[case::back_to_root("docs/..", "")]
    fn accepts_paths_inside_root(#[case] raw: &str, #[case] expected: &str) {
        let path = SafePath::parse(raw).expect("path should be safe");
        assert_eq!(path.as_path().as_str(), expected);
    }

    #[rstest]
    #[case::escape("../../etc/passwd")]
    #[case::parent("..")]
    #[case::sibling("../x")]
    #[case::climb_then_descend("docs/../../alice/secret")]
    #[case::absolute("/etc/passwd")]
    #[case::encoded_dots("%2e%2e/secret")]
    #[case::encoded_slash("docs%2f..%2f..%2fsecret")]
    #[case::nul("docs/a\0b")]
    #[case::encoded_nul("docs/a%00b")]
    #[case::encoded_parent_segment("docs/%2E%2E/%2e%2e/secret")]
    fn rejects_paths_outside_root(#[case] raw: &str) {
        assert!(!is_path_safe(raw), "{raw:?} should be rejected");
    }

    #[test]
    fn root_has_no_parent_split() {
        let root = SafePath::parse("").expect("root is safe");
        assert!(root.is_root());
        assert_eq!(root.as_dir_path().as_str(), ".");
        assert!(root.split_parent().is_none());
    }

    #[test]
    fn splits_nested_path() {
        let path = SafePath::parse("a/b/c.txt").expect("safe");
        assert_eq!(path.split_parent(), Some((Utf8Path::new("a/b"), "c.txt")));
    }
}
