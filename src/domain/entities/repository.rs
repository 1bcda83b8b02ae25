use super::bitbucket::{BitbucketRepository, PLACEHOLDER_REPOSITORY_ID};
use crate::domain::value_objects::CloneEndpoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential ids configured for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_credentials_id: Option<String>,
}

impl CredentialIds {
    pub fn new(credentials_id: Option<String>, ssh_credentials_id: Option<String>) -> Self {
        Self {
            credentials_id: non_blank(credentials_id),
            ssh_credentials_id: non_blank(ssh_credentials_id),
        }
    }

    pub fn http(credentials_id: impl Into<String>) -> Self {
        Self::new(Some(credentials_id.into()), None)
    }

    /// Credential handed to the clone engine: SSH wins over HTTP.
    pub fn for_checkout(&self) -> Option<&str> {
        self.ssh_credentials_id
            .as_deref()
            .or(self.credentials_id.as_deref())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Checkout-ready reference to one Bitbucket repository.
///
/// Immutable once built; configuration changes produce a new reference.
/// An empty `mirror_name` means the upstream server is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryReference {
    credentials: CredentialIds,
    project_name: String,
    project_key: String,
    repository_id: i64,
    repository_name: String,
    repository_slug: String,
    server_id: Option<String>,
    mirror_name: String,
}

impl RepositoryReference {
    pub fn from_repository(
        credentials: CredentialIds,
        server_id: Option<String>,
        mirror_name: impl Into<String>,
        repository: &BitbucketRepository,
    ) -> Self {
        Self {
            credentials,
            project_name: repository.project.name.clone(),
            project_key: repository.project.key.clone(),
            repository_id: repository.id,
            repository_name: repository.name.clone(),
            repository_slug: repository.slug.clone(),
            server_id,
            mirror_name: mirror_name.into(),
        }
    }

    pub fn credentials(&self) -> &CredentialIds {
        &self.credentials
    }

    pub fn credentials_id(&self) -> Option<&str> {
        self.credentials.credentials_id.as_deref()
    }

    pub fn ssh_credentials_id(&self) -> Option<&str> {
        self.credentials.ssh_credentials_id.as_deref()
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn repository_id(&self) -> i64 {
        self.repository_id
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    pub fn repository_slug(&self) -> &str {
        &self.repository_slug
    }

    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    pub fn mirror_name(&self) -> &str {
        &self.mirror_name
    }

    pub fn is_mirrored(&self) -> bool {
        !self.mirror_name.is_empty()
    }

    pub fn is_personal(&self) -> bool {
        self.project_key.starts_with('~')
    }

    pub fn is_placeholder(&self) -> bool {
        self.repository_id == PLACEHOLDER_REPOSITORY_ID
    }

    /// Project name as it should be persisted: personal projects are
    /// addressed by key.
    pub fn configured_project_name(&self) -> &str {
        if self.is_personal() {
            &self.project_key
        } else {
            &self.project_name
        }
    }
}

/// Why a reference degraded to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaceholderReason {
    UnknownServer { server_id: Option<String> },
    BlankProjectName,
    BlankRepositoryName,
    MirrorFetchFailed { mirror_name: String, message: String },
    RepositoryFetchFailed { message: String },
}

impl fmt::Display for PlaceholderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderReason::UnknownServer { server_id } => write!(
                f,
                "no Bitbucket Server configuration for serverId {}",
                server_id.as_deref().unwrap_or("<none>")
            ),
            PlaceholderReason::BlankProjectName => f.write_str("the project name is blank"),
            PlaceholderReason::BlankRepositoryName => f.write_str("the repository name is blank"),
            PlaceholderReason::MirrorFetchFailed {
                mirror_name,
                message,
            } => write!(f, "mirror '{}' could not be used: {}", mirror_name, message),
            PlaceholderReason::RepositoryFetchFailed { message } => {
                write!(f, "repository could not be fetched: {}", message)
            }
        }
    }
}

/// Whether resolution reached the remote state or degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved,
    Placeholder { reason: PlaceholderReason },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved)
    }

    pub fn placeholder_reason(&self) -> Option<&PlaceholderReason> {
        match self {
            Resolution::Resolved => None,
            Resolution::Placeholder { reason } => Some(reason),
        }
    }
}

/// Output of repository resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRepository {
    pub reference: RepositoryReference,
    pub clone_endpoint: CloneEndpoint,
    /// Repository UI URL with the trailing `/browse` removed, empty when unknown.
    pub repository_url: String,
    pub resolution: Resolution,
}

impl ResolvedRepository {
    pub fn is_placeholder(&self) -> bool {
        !self.resolution.is_resolved()
    }
}

/// Repositories a configuration points at.
///
/// Only a single repository is supported; a `Multiple` variant is the
/// intended extension point for multi-repository configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RepositorySelection {
    Single(RepositoryReference),
}

impl RepositorySelection {
    pub fn primary(&self) -> &RepositoryReference {
        match self {
            RepositorySelection::Single(reference) => reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::bitbucket::BitbucketProject;

    #[test]
    fn test_blank_credential_ids_are_dropped() {
        let ids = CredentialIds::new(Some("".to_string()), Some("  ".to_string()));
        assert_eq!(ids, CredentialIds::default());
        assert_eq!(ids.for_checkout(), None);
    }

    #[test]
    fn test_ssh_credentials_win_for_checkout() {
        let ids = CredentialIds::new(Some("http".to_string()), Some("ssh".to_string()));
        assert_eq!(ids.for_checkout(), Some("ssh"));
        assert_eq!(CredentialIds::http("http").for_checkout(), Some("http"));
    }

    #[test]
    fn test_reference_from_repository() {
        let mut repository = BitbucketRepository::placeholder("ignored", "rep_1");
        repository.id = 7;
        repository.project = BitbucketProject::new("~ADMIN", "Administrator");

        let reference = RepositoryReference::from_repository(
            CredentialIds::http("creds"),
            Some("server".to_string()),
            "",
            &repository,
        );

        assert_eq!(reference.repository_id(), 7);
        assert!(!reference.is_placeholder());
        assert!(!reference.is_mirrored());
        assert!(reference.is_personal());
        assert_eq!(reference.configured_project_name(), "~ADMIN");
        assert_eq!(reference.credentials_id(), Some("creds"));
    }

    #[test]
    fn test_placeholder_reason_display() {
        let reason = PlaceholderReason::UnknownServer { server_id: None };
        assert_eq!(
            reason.to_string(),
            "no Bitbucket Server configuration for serverId <none>"
        );
        let resolution = Resolution::Placeholder { reason };
        assert!(!resolution.is_resolved());
        assert!(resolution.placeholder_reason().is_some());
    }
}
