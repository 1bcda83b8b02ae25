use super::error::ApiError;
use crate::domain::entities::{BitbucketRepository, MirroredRepository, MirroredRepositoryDescriptor};
use crate::infrastructure::credentials::Credential;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of entry at a path within a ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Directory,
    NonExistent,
}

/// Entry of a directory listing. `path` is relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryChild {
    pub path: String,
    pub file_type: FileType,
}

/// Project, repository and mirror lookups against one Bitbucket server.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteApiClient: Send + Sync {
    /// Find a repository by its display names.
    fn find_repository(
        &self,
        project_name: &str,
        repository_name: &str,
    ) -> Result<BitbucketRepository, ApiError>;

    /// Mirrors registered for an upstream repository.
    fn get_mirror_descriptors(
        &self,
        repository_id: i64,
    ) -> Result<Vec<MirroredRepositoryDescriptor>, ApiError>;

    /// Mirror-side details, fetched through the descriptor's self link.
    fn get_mirrored_repository(
        &self,
        descriptor: &MirroredRepositoryDescriptor,
    ) -> Result<MirroredRepository, ApiError>;

    /// File access scoped to one repository.
    fn file_path_client(&self, project_key: &str, repository_slug: &str) -> Arc<dyn FilePathClient>;
}

/// Read-only file access within a repository, addressed by ref and path.
#[cfg_attr(test, mockall::automock)]
pub trait FilePathClient: Send + Sync {
    fn file_type(&self, path: &str, ref_name: &str) -> Result<FileType, ApiError>;

    fn directory_children(&self, path: &str, ref_name: &str) -> Result<Vec<DirectoryChild>, ApiError>;

    fn raw_content(&self, path: &str, ref_name: &str) -> Result<Vec<u8>, ApiError>;
}

/// Creates clients for a server base URL and optional credentials.
pub trait ClientFactory: Send + Sync {
    fn client(
        &self,
        base_url: &str,
        credentials: Option<&Credential>,
    ) -> Result<Arc<dyn RemoteApiClient>, ApiError>;
}
