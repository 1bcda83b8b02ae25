use super::mirror_resolver::{MirrorFetchRequest, MirrorResolver};
use crate::domain::entities::{
    BitbucketRepository, CredentialIds, NamedLink, PlaceholderReason, RepositoryReference,
    Resolution, ResolvedRepository, ScmConfig, ScmSourceConfig, ServerConfig,
};
use crate::domain::value_objects::{BitbucketBrowser, CloneEndpoint};
use crate::infrastructure::bitbucket::ClientFactory;
use crate::infrastructure::credentials::{Credential, CredentialResolver};
use crate::infrastructure::filesystem::ConfigurationStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persisted names a repository reference is resolved from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveRequest {
    pub server_id: Option<String>,
    pub project_name: Option<String>,
    pub repository_name: Option<String>,
    pub mirror_name: Option<String>,
    pub credentials: CredentialIds,
}

impl ResolveRequest {
    pub fn new(
        server_id: impl Into<String>,
        project_name: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        Self {
            server_id: Some(server_id.into()),
            project_name: Some(project_name.into()),
            repository_name: Some(repository_name.into()),
            ..Self::default()
        }
    }

    pub fn with_mirror(mut self, mirror_name: impl Into<String>) -> Self {
        self.mirror_name = Some(mirror_name.into());
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialIds) -> Self {
        self.credentials = credentials;
        self
    }

    fn mirror(&self) -> Option<&str> {
        self.mirror_name.as_deref().filter(|m| !m.trim().is_empty())
    }
}

impl From<&ScmConfig> for ResolveRequest {
    fn from(config: &ScmConfig) -> Self {
        Self {
            server_id: config.server_id.clone(),
            project_name: config.project_name.clone(),
            repository_name: config.repository_name.clone(),
            mirror_name: config.mirror_name.clone(),
            credentials: config.credentials.clone(),
        }
    }
}

impl From<&ScmSourceConfig> for ResolveRequest {
    fn from(config: &ScmSourceConfig) -> Self {
        Self {
            server_id: config.server_id.clone(),
            project_name: config.project_name.clone(),
            repository_name: config.repository_name.clone(),
            mirror_name: config.mirror_name.clone(),
            credentials: config.credentials.clone(),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Turns persisted names into a checkout-ready repository reference.
///
/// Resolution never fails: unknown servers, blank names and remote errors
/// all produce a placeholder reference carrying the reason.
pub struct RepositoryResolver {
    config_store: Arc<dyn ConfigurationStore>,
    credentials: Arc<dyn CredentialResolver>,
    clients: Arc<dyn ClientFactory>,
    mirrors: MirrorResolver,
}

impl RepositoryResolver {
    pub fn new(
        config_store: Arc<dyn ConfigurationStore>,
        credentials: Arc<dyn CredentialResolver>,
        clients: Arc<dyn ClientFactory>,
    ) -> Self {
        let mirrors = MirrorResolver::new(Arc::clone(&clients), Arc::clone(&credentials));
        Self {
            config_store,
            credentials,
            clients,
            mirrors,
        }
    }

    pub fn with_mirror_resolver(mut self, mirrors: MirrorResolver) -> Self {
        self.mirrors = mirrors;
        self
    }

    pub fn mirror_resolver(&self) -> &MirrorResolver {
        &self.mirrors
    }

    pub fn config_store(&self) -> &Arc<dyn ConfigurationStore> {
        &self.config_store
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialResolver> {
        &self.credentials
    }

    pub fn clients(&self) -> &Arc<dyn ClientFactory> {
        &self.clients
    }

    /// Server configuration for an id; blank or unknown ids yield `None`
    pub fn server(&self, server_id: Option<&str>) -> Option<ServerConfig> {
        server_id.and_then(|id| self.config_store.get_server_by_id(id))
    }

    /// Mirror request for the given names against a configured server
    pub fn mirror_request(&self, server: &ServerConfig, request: &ResolveRequest) -> MirrorFetchRequest {
        MirrorFetchRequest::new(
            server.base_url(),
            request.project_name.clone().unwrap_or_default(),
            request.repository_name.clone().unwrap_or_default(),
            request.mirror_name.clone().unwrap_or_default(),
        )
        .with_credentials(
            request.credentials.credentials_id.clone(),
            server.admin_credentials_id().map(str::to_string),
        )
    }

    /// Resolve names into a repository reference plus clone endpoint.
    pub fn resolve(&self, request: &ResolveRequest) -> ResolvedRepository {
        let Some(server) = self.server(request.server_id.as_deref()) else {
            info!(
                "No Bitbucket Server configuration for serverId {}",
                request.server_id.as_deref().unwrap_or("<none>")
            );
            return self.placeholder(
                request,
                PlaceholderReason::UnknownServer {
                    server_id: request.server_id.clone(),
                },
            );
        };

        if is_blank(request.project_name.as_deref()) {
            info!("Error resolving the Bitbucket repository: the project name is blank");
            return self.placeholder(request, PlaceholderReason::BlankProjectName);
        }
        if is_blank(request.repository_name.as_deref()) {
            info!("Error resolving the Bitbucket repository: the repository name is blank");
            return self.placeholder(request, PlaceholderReason::BlankRepositoryName);
        }

        match request.mirror() {
            Some(mirror_name) => self.resolve_mirrored(&server, request, mirror_name),
            None => self.resolve_direct(&server, request),
        }
    }

    fn resolve_mirrored(
        &self,
        server: &ServerConfig,
        request: &ResolveRequest,
        mirror_name: &str,
    ) -> ResolvedRepository {
        match self.mirrors.fetch_repository(&self.mirror_request(server, request)) {
            Ok(enriched) => {
                let details = enriched.mirroring_details();
                self.resolved(
                    request,
                    details.mirror_name.clone(),
                    enriched.repository(),
                    details.clone_urls(),
                )
            }
            Err(e) => {
                warn!("Mirror '{}' could not be resolved: {}", mirror_name, e);
                self.placeholder(
                    request,
                    PlaceholderReason::MirrorFetchFailed {
                        mirror_name: mirror_name.to_string(),
                        message: e.to_string(),
                    },
                )
            }
        }
    }

    fn resolve_direct(&self, server: &ServerConfig, request: &ResolveRequest) -> ResolvedRepository {
        let project_name = request.project_name.as_deref().unwrap_or_default();
        let repository_name = request.repository_name.as_deref().unwrap_or_default();
        debug!(
            "Querying {} for project [{}] repo [{}]",
            server.base_url(),
            project_name,
            repository_name
        );

        let fetched = self
            .clients
            .client(server.base_url(), self.admin_credential(server).as_ref())
            .and_then(|client| client.find_repository(project_name, repository_name));

        match fetched {
            Ok(repository) => {
                self.resolved(request, String::new(), &repository, repository.clone_urls())
            }
            Err(e) => {
                warn!(
                    "Repository {}/{} could not be fetched: {}",
                    project_name, repository_name, e
                );
                self.placeholder(
                    request,
                    PlaceholderReason::RepositoryFetchFailed {
                        message: e.to_string(),
                    },
                )
            }
        }
    }

    fn admin_credential(&self, server: &ServerConfig) -> Option<Credential> {
        self.credentials
            .resolve_for_api(None, server.admin_credentials_id())
    }

    fn resolved(
        &self,
        request: &ResolveRequest,
        mirror_name: String,
        repository: &BitbucketRepository,
        clone_links: &[NamedLink],
    ) -> ResolvedRepository {
        let reference = RepositoryReference::from_repository(
            request.credentials.clone(),
            request.server_id.clone(),
            mirror_name,
            repository,
        );
        let clone_endpoint =
            CloneEndpoint::select(clone_links, request.credentials.ssh_credentials_id.as_deref());
        let repository_url = repository
            .self_link()
            .map(|link| BitbucketBrowser::from_self_link(link).repository_url().to_string())
            .unwrap_or_default();

        ResolvedRepository {
            reference,
            clone_endpoint,
            repository_url,
            resolution: Resolution::Resolved,
        }
    }

    fn placeholder(&self, request: &ResolveRequest, reason: PlaceholderReason) -> ResolvedRepository {
        let repository = BitbucketRepository::placeholder(
            request.project_name.as_deref().unwrap_or_default(),
            request.repository_name.as_deref().unwrap_or_default(),
        );
        let mut resolved = self.resolved(
            request,
            request.mirror_name.clone().unwrap_or_default(),
            &repository,
            &[],
        );
        resolved.resolution = Resolution::Placeholder { reason };
        resolved
    }
}
