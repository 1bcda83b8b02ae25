use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of fully-qualified branch refs.
pub const R_HEADS: &str = "refs/heads/";

/// Prefix of fully-qualified tag refs.
pub const R_TAGS: &str = "refs/tags/";

static COMMIT_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").expect("commit hash pattern is valid"));

/// How a branch specification selects refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSpecKind {
    /// `refs/heads/...` or `refs/tags/...` without wildcards
    LiteralRef,
    /// Contains `*`
    Wildcard,
    /// `:<regex>`
    Regex,
    /// 40 hex characters
    CommitHash,
    /// Bare name such as `master` or `origin/master`
    ShortName,
}

/// A branch specification as entered in a job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BranchSpec {
    name: String,
}

impl BranchSpec {
    /// Create a branch spec. A blank name selects every branch.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        Self {
            name: if trimmed.is_empty() {
                "**".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BranchSpecKind {
        if self.name.starts_with(':') {
            BranchSpecKind::Regex
        } else if self.name.contains('*') {
            BranchSpecKind::Wildcard
        } else if COMMIT_HASH.is_match(&self.name) {
            BranchSpecKind::CommitHash
        } else if self.name.starts_with(R_HEADS) || self.name.starts_with(R_TAGS) {
            BranchSpecKind::LiteralRef
        } else {
            BranchSpecKind::ShortName
        }
    }

    /// The ref this spec names, if it unambiguously names exactly one.
    pub fn literal_ref(&self) -> Option<&str> {
        match self.kind() {
            BranchSpecKind::LiteralRef => Some(&self.name),
            _ => None,
        }
    }

    /// Whether `ref_name` (a fully-qualified ref) is selected by this spec.
    ///
    /// Short names are matched against branch refs only, optionally prefixed
    /// with `*/` or the remote name, e.g. `*/main` and `origin/main` both
    /// select `refs/heads/main`.
    pub fn matches(&self, ref_name: &str, remote_name: &str) -> bool {
        let short_name = ref_name.strip_prefix(R_HEADS);

        match self.kind() {
            BranchSpecKind::LiteralRef => self.name == ref_name,
            BranchSpecKind::CommitHash => false,
            BranchSpecKind::Regex => {
                let pattern = format!("^(?:{})$", &self.name[1..]);
                let Ok(regex) = Regex::new(&pattern) else {
                    return false;
                };
                regex.is_match(ref_name)
                    || short_name.map_or(false, |short| {
                        regex.is_match(short) || regex.is_match(&format!("{remote_name}/{short}"))
                    })
            }
            BranchSpecKind::Wildcard | BranchSpecKind::ShortName => {
                if self.name.starts_with("refs/") {
                    return glob_matches(&self.name, ref_name);
                }
                let Some(short) = short_name else {
                    return false;
                };
                if self.name == "**" {
                    return true;
                }
                let remote_prefix = format!("{remote_name}/");
                let pattern = self
                    .name
                    .strip_prefix("*/")
                    .or_else(|| self.name.strip_prefix(remote_prefix.as_str()))
                    .unwrap_or(&self.name);
                glob_matches(pattern, short)
            }
        }
    }
}

fn glob_matches(pattern: &str, candidate: &str) -> bool {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                regex.push_str(".*");
            } else {
                regex.push_str("[^/]*");
            }
        } else {
            regex.push_str(&regex::escape(&ch.to_string()));
        }
    }
    regex.push('$');
    Regex::new(&regex).map_or(false, |r| r.is_match(candidate))
}

impl fmt::Display for BranchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<String> for BranchSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for BranchSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<BranchSpec> for String {
    fn from(spec: BranchSpec) -> Self {
        spec.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_spec_selects_everything() {
        let spec = BranchSpec::new("  ");
        assert_eq!(spec.name(), "**");
        assert_eq!(spec.kind(), BranchSpecKind::Wildcard);
        assert!(spec.matches("refs/heads/feature/x", "origin"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(BranchSpec::new("refs/heads/master").kind(), BranchSpecKind::LiteralRef);
        assert_eq!(BranchSpec::new("refs/tags/v1.0").kind(), BranchSpecKind::LiteralRef);
        assert_eq!(BranchSpec::new("refs/heads/*").kind(), BranchSpecKind::Wildcard);
        assert_eq!(BranchSpec::new(":^release-.*").kind(), BranchSpecKind::Regex);
        assert_eq!(
            BranchSpec::new("0a943a29376f2336b78312d99e65da17048951db").kind(),
            BranchSpecKind::CommitHash
        );
        assert_eq!(BranchSpec::new("master").kind(), BranchSpecKind::ShortName);
    }

    #[test]
    fn test_literal_ref() {
        assert_eq!(BranchSpec::new("refs/heads/master").literal_ref(), Some("refs/heads/master"));
        assert_eq!(BranchSpec::new("*/master").literal_ref(), None);
        assert_eq!(BranchSpec::new("refs/head/master").literal_ref(), None);
    }

    #[test]
    fn test_short_name_matching() {
        let spec = BranchSpec::new("*/main");
        assert!(spec.matches("refs/heads/main", "origin"));
        assert!(!spec.matches("refs/heads/main-2", "origin"));
        assert!(!spec.matches("refs/tags/main", "origin"));

        let spec = BranchSpec::new("origin/feature/*");
        assert!(spec.matches("refs/heads/feature/a", "origin"));
        assert!(!spec.matches("refs/heads/feature/a/b", "origin"));
    }

    #[test]
    fn test_regex_matching() {
        let spec = BranchSpec::new(":release-[0-9]+");
        assert!(spec.matches("refs/heads/release-12", "origin"));
        assert!(!spec.matches("refs/heads/release-x", "origin"));
    }

    #[test]
    fn test_serde_is_a_plain_string() {
        let spec: BranchSpec = serde_json::from_str("\"refs/tags/v1\"").unwrap();
        assert_eq!(spec, BranchSpec::new("refs/tags/v1"));
        assert_eq!(serde_json::to_string(&spec).unwrap(), "\"refs/tags/v1\"");
    }
}
