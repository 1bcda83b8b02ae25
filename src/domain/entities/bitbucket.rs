//! Models returned by the Bitbucket Server REST API.

use serde::{Deserialize, Serialize};

/// Repository id used by placeholder repositories that were never fetched.
pub const PLACEHOLDER_REPOSITORY_ID: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// A link with a name, e.g. a clone URL labelled `http` or `ssh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLink {
    pub name: String,
    pub href: String,
}

impl NamedLink {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLinks {
    #[serde(default)]
    pub clone: Vec<NamedLink>,
    #[serde(default, rename = "self")]
    pub self_links: Vec<Link>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Normal,
    Personal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketProject {
    pub key: String,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
}

impl BitbucketProject {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            project_type: None,
        }
    }

    /// Personal projects are keyed `~username`.
    pub fn is_personal(&self) -> bool {
        self.project_type == Some(ProjectType::Personal) || self.key.starts_with('~')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepositoryState {
    Available,
    InitialisationFailed,
    Initialising,
    Offline,
}

impl Default for RepositoryState {
    fn default() -> Self {
        Self::Available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitbucketRepository {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub project: BitbucketProject,
    #[serde(default)]
    pub state: RepositoryState,
    #[serde(default)]
    pub links: RepositoryLinks,
}

impl BitbucketRepository {
    /// A repository that stands in for one that could not be fetched.
    ///
    /// The project key and name are both `project_name`, slug and name are
    /// both `repository_name`, and no links are present.
    pub fn placeholder(project_name: &str, repository_name: &str) -> Self {
        Self {
            id: PLACEHOLDER_REPOSITORY_ID,
            name: repository_name.to_string(),
            slug: repository_name.to_string(),
            project: BitbucketProject::new(project_name, project_name),
            state: RepositoryState::Available,
            links: RepositoryLinks::default(),
        }
    }

    pub fn clone_urls(&self) -> &[NamedLink] {
        &self.links.clone
    }

    pub fn self_link(&self) -> Option<&str> {
        self.links.self_links.first().map(|link| link.href.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorServer {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfLinks {
    #[serde(default, rename = "self")]
    pub self_links: Vec<Link>,
}

/// Entry of the upstream's mirror list for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredRepositoryDescriptor {
    pub mirror_server: MirrorServer,
    #[serde(default)]
    pub links: SelfLinks,
}

impl MirroredRepositoryDescriptor {
    pub fn self_link(&self) -> Option<&str> {
        self.links.self_links.first().map(|link| link.href.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MirroredRepositoryStatus {
    Available,
    Initializing,
    NotMirrored,
    Error,
    #[serde(other)]
    Unknown,
}

/// Mirror-side view of a repository, including the mirror's clone links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredRepository {
    pub available: bool,
    pub mirror_name: String,
    pub repository_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MirroredRepositoryStatus>,
    #[serde(default)]
    pub links: RepositoryLinks,
}

impl MirroredRepository {
    pub fn clone_urls(&self) -> &[NamedLink] {
        &self.links.clone
    }
}

/// A mirrored repository paired with the upstream repository it mirrors.
///
/// Only produced by the mirror resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedMirroredRepository {
    repository: BitbucketRepository,
    mirroring_details: MirroredRepository,
}

impl EnrichedMirroredRepository {
    pub(crate) fn new(repository: BitbucketRepository, mirroring_details: MirroredRepository) -> Self {
        Self {
            repository,
            mirroring_details,
        }
    }

    pub fn repository(&self) -> &BitbucketRepository {
        &self.repository
    }

    pub fn mirroring_details(&self) -> &MirroredRepository {
        &self.mirroring_details
    }
}

/// One page of a paged REST collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitbucketPage<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default = "default_last_page")]
    pub is_last_page: bool,
    #[serde(default)]
    pub next_page_start: Option<u32>,
}

fn default_last_page() -> bool {
    true
}
