use crate::domain::entities::{RepositoryReference, ResolvedRepository, ScmSourceConfig};

/// Branch-source (multi-branch) configuration of a Bitbucket repository.
///
/// Heads are discovered elsewhere; this only carries the resolved
/// repository every discovered revision is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketScmSource {
    id: String,
    resolved: ResolvedRepository,
}

impl BitbucketScmSource {
    pub(crate) fn new(id: String, resolved: ResolvedRepository) -> Self {
        Self { id, resolved }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reference(&self) -> &RepositoryReference {
        &self.resolved.reference
    }

    pub fn resolved(&self) -> &ResolvedRepository {
        &self.resolved
    }

    pub fn server_id(&self) -> Option<&str> {
        self.reference().server_id()
    }

    pub fn persisted_config(&self) -> ScmSourceConfig {
        let reference = self.reference();
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());
        ScmSourceConfig {
            id: Some(self.id.clone()),
            credentials: reference.credentials().clone(),
            project_name: non_empty(reference.configured_project_name()),
            repository_name: non_empty(reference.repository_name()),
            server_id: reference.server_id().map(str::to_string),
            mirror_name: non_empty(reference.mirror_name()),
        }
    }
}
