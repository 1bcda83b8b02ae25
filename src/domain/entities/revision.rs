use crate::domain::value_objects::{R_HEADS, R_TAGS};
use serde::{Deserialize, Serialize};

/// A head discovered by a branch-source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScmHead {
    Branch {
        name: String,
    },
    Tag {
        name: String,
    },
    PullRequest {
        id: u64,
        source_branch: String,
        target_branch: String,
    },
    /// Head without a stable remote ref, e.g. a replayed build.
    Anonymous {
        name: String,
    },
}

impl ScmHead {
    pub fn branch(name: impl Into<String>) -> Self {
        Self::Branch { name: name.into() }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag { name: name.into() }
    }

    pub fn name(&self) -> String {
        match self {
            ScmHead::Branch { name } | ScmHead::Tag { name } | ScmHead::Anonymous { name } => {
                name.clone()
            }
            ScmHead::PullRequest { id, .. } => format!("PR-{}", id),
        }
    }

    /// Fully-qualified ref for heads that carry one.
    pub fn ref_name(&self) -> Option<String> {
        match self {
            ScmHead::Branch { name } => Some(format!("{R_HEADS}{name}")),
            ScmHead::Tag { name } => Some(format!("{R_TAGS}{name}")),
            ScmHead::PullRequest { .. } | ScmHead::Anonymous { .. } => None,
        }
    }
}

/// A head pinned to an optional commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScmRevision {
    pub head: ScmHead,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl ScmRevision {
    pub fn new(head: ScmHead, hash: Option<String>) -> Self {
        Self { head, hash }
    }
}
