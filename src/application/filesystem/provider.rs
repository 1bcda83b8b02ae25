use super::filesystem_view::FilesystemView;
use crate::application::scm::{BitbucketScm, BitbucketScmSource};
use crate::application::services::RepositoryResolver;
use crate::domain::entities::{RepositoryReference, ScmRevision};
use crate::domain::value_objects::BranchSpec;
use crate::infrastructure::bitbucket::{ClientFactory, FilePathClient};
use crate::infrastructure::credentials::CredentialResolver;
use crate::infrastructure::filesystem::ConfigurationStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a configuration can be browsed without a clone, and
/// builds the view when it can.
///
/// A negative answer is never an error: the caller falls back to a full
/// checkout.
pub struct LightweightFilesystemProvider {
    config_store: Arc<dyn ConfigurationStore>,
    credentials: Arc<dyn CredentialResolver>,
    clients: Arc<dyn ClientFactory>,
}

impl LightweightFilesystemProvider {
    pub fn new(
        config_store: Arc<dyn ConfigurationStore>,
        credentials: Arc<dyn CredentialResolver>,
        clients: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            config_store,
            credentials,
            clients,
        }
    }

    /// Share the collaborators of a resolver
    pub fn from_resolver(resolver: &RepositoryResolver) -> Self {
        Self::new(
            Arc::clone(resolver.config_store()),
            Arc::clone(resolver.credentials()),
            Arc::clone(resolver.clients()),
        )
    }

    /// The single literal ref the branch specs name, if any.
    ///
    /// Wildcards, regular expressions and bare commit hashes need a clone to
    /// resolve, so they never qualify.
    pub fn single_ref(branches: &[BranchSpec]) -> Option<&str> {
        match branches {
            [only] => only.literal_ref(),
            _ => None,
        }
    }

    pub fn supports_branches(branches: &[BranchSpec]) -> bool {
        Self::single_ref(branches).is_some()
    }

    pub fn supports_scm(&self, scm: &BitbucketScm) -> bool {
        Self::supports_branches(scm.branches())
    }

    /// Every branch source qualifies; revisions are filtered by
    /// [`build_for_source`](Self::build_for_source).
    pub fn supports_source(&self, _source: &BitbucketScmSource) -> bool {
        true
    }

    pub fn build_for_scm(
        &self,
        scm: &BitbucketScm,
        revision: Option<&ScmRevision>,
    ) -> Option<FilesystemView> {
        let Some(ref_name) = Self::single_ref(scm.branches()) else {
            debug!("SCM {} does not name a single ref", scm.id());
            return None;
        };
        let client = self.file_client(scm.reference())?;
        Some(FilesystemView::new(client, ref_name, revision.cloned()))
    }

    pub fn build_for_source(
        &self,
        source: &BitbucketScmSource,
        revision: &ScmRevision,
    ) -> Option<FilesystemView> {
        let client = self.file_client(source.reference())?;
        let Some(ref_name) = revision.head.ref_name() else {
            debug!(
                "Head {} carries no ref, lightweight checkout not supported",
                revision.head.name()
            );
            return None;
        };
        Some(FilesystemView::new(client, ref_name, Some(revision.clone())))
    }

    fn file_client(&self, reference: &RepositoryReference) -> Option<Arc<dyn FilePathClient>> {
        let server = reference
            .server_id()
            .and_then(|id| self.config_store.get_server_by_id(id))?;
        if server.validate().is_error() {
            debug!("Server {} is not valid", server.id);
            return None;
        }
        if reference.is_placeholder() {
            debug!(
                "Repository {}/{} was not resolved",
                reference.project_name(),
                reference.repository_name()
            );
            return None;
        }

        let credential = self
            .credentials
            .resolve_for_api(reference.credentials_id(), server.admin_credentials_id());
        match self.clients.client(server.base_url(), credential.as_ref()) {
            Ok(client) => Some(
                client.file_path_client(reference.project_key(), reference.repository_slug()),
            ),
            Err(e) => {
                warn!("No client for {}: {}", server.base_url(), e);
                None
            }
        }
    }
}
