use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of links into the Bitbucket UI shown next to a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkType {
    Branch,
    Repo,
}

impl LinkType {
    pub fn display_name(&self) -> &'static str {
        match self {
            LinkType::Branch => "View Branch",
            LinkType::Repo => "Browse Repo",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
