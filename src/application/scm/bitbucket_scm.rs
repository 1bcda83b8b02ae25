use crate::domain::entities::{
    RepositoryReference, RepositorySelection, Resolution, ResolvedRepository, ScmConfig,
};
use crate::domain::value_objects::{BitbucketBrowser, BranchSpec, CloneEndpoint, LinkType, ScmExtension};
use crate::infrastructure::scm::{
    BuildContext, BuiltRevision, ChangeLogParser, PollingResult, RevisionState, ScmError, VcsEngine,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A Bitbucket repository as a job's source control.
///
/// Holds the resolved repository and a full checkout engine configured for
/// it. Every checkout operation is forwarded to the engine unchanged. Build
/// one through [`ScmFactory`](super::ScmFactory); regenerate it to pick up
/// renames on the server.
pub struct BitbucketScm {
    id: String,
    config: ScmConfig,
    resolved: ResolvedRepository,
    repositories: RepositorySelection,
    engine: Arc<dyn VcsEngine>,
}

impl BitbucketScm {
    pub(crate) fn new(
        id: String,
        config: ScmConfig,
        resolved: ResolvedRepository,
        engine: Arc<dyn VcsEngine>,
    ) -> Self {
        let repositories = RepositorySelection::Single(resolved.reference.clone());
        Self {
            id,
            config,
            resolved,
            repositories,
            engine,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reference(&self) -> &RepositoryReference {
        self.repositories.primary()
    }

    pub fn repositories(&self) -> &RepositorySelection {
        &self.repositories
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolved.resolution
    }

    pub fn resolved(&self) -> &ResolvedRepository {
        &self.resolved
    }

    pub fn clone_endpoint(&self) -> &CloneEndpoint {
        &self.resolved.clone_endpoint
    }

    /// Repository UI URL, empty when the repository was not resolved.
    pub fn repository_url(&self) -> &str {
        &self.resolved.repository_url
    }

    pub fn branches(&self) -> &[BranchSpec] {
        &self.config.branches
    }

    pub fn extensions(&self) -> &[ScmExtension] {
        &self.config.extensions
    }

    pub fn git_tool(&self) -> Option<&str> {
        self.config.git_tool.as_deref()
    }

    pub fn server_id(&self) -> Option<&str> {
        self.reference().server_id()
    }

    pub fn project_name(&self) -> &str {
        self.reference().configured_project_name()
    }

    pub fn repository_name(&self) -> &str {
        self.reference().repository_name()
    }

    pub fn mirror_name(&self) -> &str {
        self.reference().mirror_name()
    }

    pub fn credentials_id(&self) -> Option<&str> {
        self.reference().credentials_id()
    }

    pub fn ssh_credentials_id(&self) -> Option<&str> {
        self.reference().ssh_credentials_id()
    }

    pub fn engine(&self) -> &Arc<dyn VcsEngine> {
        &self.engine
    }

    /// Configuration to persist, with names taken from the resolved
    /// repository so that server-side renames are carried forward.
    pub fn persisted_config(&self) -> ScmConfig {
        let reference = self.reference();
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());
        ScmConfig {
            id: Some(self.id.clone()),
            branches: self.config.branches.clone(),
            credentials: reference.credentials().clone(),
            extensions: self.config.extensions.clone(),
            git_tool: self.config.git_tool.clone(),
            project_name: non_empty(reference.configured_project_name()),
            repository_name: non_empty(reference.repository_name()),
            server_id: reference.server_id().map(str::to_string),
            mirror_name: non_empty(reference.mirror_name()),
        }
    }

    pub async fn checkout(
        &self,
        build: &BuildContext,
        changelog_file: Option<&Path>,
        baseline: Option<&RevisionState>,
    ) -> Result<BuiltRevision, ScmError> {
        self.engine.checkout(build, changelog_file, baseline).await
    }

    pub async fn calc_revisions_from_build(
        &self,
        build: &BuildContext,
    ) -> Result<Option<RevisionState>, ScmError> {
        self.engine.calc_revisions_from_build(build).await
    }

    pub async fn compare_remote_revision_with(
        &self,
        baseline: &RevisionState,
    ) -> Result<PollingResult, ScmError> {
        self.engine.compare_remote_revision_with(baseline).await
    }

    pub fn build_environment(&self, build: &BuildContext, env: &mut HashMap<String, String>) {
        self.engine.build_environment(build, env)
    }

    pub fn changelog_parser(&self) -> Box<dyn ChangeLogParser> {
        self.engine.changelog_parser()
    }

    pub fn browser(&self) -> Option<&BitbucketBrowser> {
        self.engine.browser()
    }

    /// UI link for the repository or one of its branches
    pub fn link(&self, link_type: LinkType, branch: Option<&str>) -> Option<(&'static str, String)> {
        self.browser()?.link(link_type, branch)
    }
}

impl fmt::Debug for BitbucketScm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitbucketScm")
            .field("id", &self.id)
            .field("reference", self.reference())
            .field("clone_endpoint", self.clone_endpoint())
            .field("resolution", self.resolution())
            .finish()
    }
}
