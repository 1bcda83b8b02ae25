use super::link_type::LinkType;
use super::branch_spec::R_HEADS;
use serde::{Deserialize, Serialize};

/// Builds links into the Bitbucket UI for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitbucketBrowser {
    repository_url: String,
}

impl BitbucketBrowser {
    pub fn new(repository_url: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Derive the repository URL from a repository self link, which ends in
    /// `/browse`. A link without `/browse` yields an empty URL.
    pub fn from_self_link(self_link: &str) -> Self {
        let repository_url = self_link
            .find("/browse")
            .map(|index| &self_link[..index])
            .unwrap_or("");
        Self::new(repository_url)
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    fn base(&self) -> Option<&str> {
        if self.repository_url.is_empty() {
            None
        } else {
            Some(&self.repository_url)
        }
    }

    pub fn changeset_link(&self, commit: &str) -> Option<String> {
        self.base().map(|base| format!("{}/commits/{}", base, commit))
    }

    pub fn file_link(&self, path: &str, commit: &str) -> Option<String> {
        self.base().map(|base| {
            format!("{}/browse/{}?at={}", base, path.trim_start_matches('/'), commit)
        })
    }

    pub fn diff_link(&self, path: &str, commit: &str) -> Option<String> {
        self.base().map(|base| {
            format!("{}/commits/{}#{}", base, commit, path.trim_start_matches('/'))
        })
    }

    /// Link for a branch given by short name or fully-qualified ref.
    pub fn branch_link(&self, branch: &str) -> Option<String> {
        let ref_name = if branch.starts_with("refs/") {
            branch.to_string()
        } else {
            format!("{R_HEADS}{branch}")
        };
        self.base().map(|base| {
            let at: String = url::form_urlencoded::byte_serialize(ref_name.as_bytes()).collect();
            format!("{}/browse?at={}", base, at)
        })
    }

    /// Display name and URL for a UI link.
    pub fn link(&self, link_type: LinkType, branch: Option<&str>) -> Option<(&'static str, String)> {
        let url = match (link_type, branch) {
            (LinkType::Branch, Some(branch)) => self.branch_link(branch)?,
            (LinkType::Branch, None) => return None,
            (LinkType::Repo, _) => format!("{}/browse", self.base()?),
        };
        Some((link_type.display_name(), url))
    }
}
