use serde::{Deserialize, Serialize};

/// Behaviours layered on top of a full checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScmExtension {
    /// `git clean -fdx` before checking out
    CleanBeforeCheckout,
    /// Check out to a local branch instead of a detached head
    LocalBranch { name: Option<String> },
    CloneOption {
        #[serde(default)]
        shallow: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<u32>,
        #[serde(default)]
        no_tags: bool,
    },
    /// Check out into a subdirectory of the workspace
    RelativeTargetDirectory { path: String },
}
