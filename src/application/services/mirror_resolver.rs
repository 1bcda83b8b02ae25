use crate::domain::entities::{BitbucketRepository, EnrichedMirroredRepository};
use crate::infrastructure::bitbucket::{ApiError, ClientFactory, RemoteApiClient};
use crate::infrastructure::credentials::CredentialResolver;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Mirror lookup failures
#[derive(Debug, Error)]
pub enum MirrorFetchError {
    #[error("Mirror '{mirror_name}' is not registered for repository {project_name}/{repository_name}")]
    NotFound {
        mirror_name: String,
        project_name: String,
        repository_name: String,
    },

    #[error("Mirror '{mirror_name}' is not available")]
    Unavailable { mirror_name: String },

    #[error("Mirror API request failed: {source}")]
    Api {
        #[from]
        source: ApiError,
    },

    #[error("Repository {project_name}/{repository_name} could not be looked up: {source}")]
    RepositoryLookup {
        project_name: String,
        repository_name: String,
        #[source]
        source: ApiError,
    },
}

/// Looks up the upstream repository a mirror request refers to
pub type RepositoryLookup =
    dyn Fn(&dyn RemoteApiClient, &str, &str) -> Result<BitbucketRepository, ApiError> + Send + Sync;

/// A repository/mirror pair on one Bitbucket server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFetchRequest {
    pub server_url: String,
    /// Job credential, used for API calls when usable over HTTP
    pub credentials_id: Option<String>,
    /// Fallback when the job credential is missing or SSH-only
    pub admin_credentials_id: Option<String>,
    pub project_name: String,
    pub repository_name: String,
    pub mirror_name: String,
}

impl MirrorFetchRequest {
    pub fn new(
        server_url: impl Into<String>,
        project_name: impl Into<String>,
        repository_name: impl Into<String>,
        mirror_name: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            credentials_id: None,
            admin_credentials_id: None,
            project_name: project_name.into(),
            repository_name: repository_name.into(),
            mirror_name: mirror_name.into(),
        }
    }

    pub fn with_credentials(
        mut self,
        credentials_id: Option<String>,
        admin_credentials_id: Option<String>,
    ) -> Self {
        self.credentials_id = credentials_id;
        self.admin_credentials_id = admin_credentials_id;
        self
    }
}

/// Queries the mirror topology of one repository
pub struct MirrorResolver {
    clients: Arc<dyn ClientFactory>,
    credentials: Arc<dyn CredentialResolver>,
    repository_lookup: Arc<RepositoryLookup>,
}

impl MirrorResolver {
    /// Create a resolver that finds the upstream repository by display name
    pub fn new(clients: Arc<dyn ClientFactory>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            clients,
            credentials,
            repository_lookup: Arc::new(|client, project, repository| {
                client.find_repository(project, repository)
            }),
        }
    }

    /// Replace how the upstream repository is looked up
    pub fn with_repository_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&dyn RemoteApiClient, &str, &str) -> Result<BitbucketRepository, ApiError>
            + Send
            + Sync
            + 'static,
    {
        self.repository_lookup = Arc::new(lookup);
        self
    }

    fn client(&self, request: &MirrorFetchRequest) -> Result<Arc<dyn RemoteApiClient>, ApiError> {
        let credential = self.credentials.resolve_for_api(
            request.credentials_id.as_deref(),
            request.admin_credentials_id.as_deref(),
        );
        self.clients.client(&request.server_url, credential.as_ref())
    }

    fn upstream(
        &self,
        client: &dyn RemoteApiClient,
        request: &MirrorFetchRequest,
    ) -> Result<BitbucketRepository, MirrorFetchError> {
        (self.repository_lookup)(client, &request.project_name, &request.repository_name).map_err(
            |source| MirrorFetchError::RepositoryLookup {
                project_name: request.project_name.clone(),
                repository_name: request.repository_name.clone(),
                source,
            },
        )
    }

    /// Fetch the named mirror of a repository together with the upstream
    /// repository it mirrors.
    pub fn fetch_repository(
        &self,
        request: &MirrorFetchRequest,
    ) -> Result<EnrichedMirroredRepository, MirrorFetchError> {
        debug!(
            "Fetching mirror '{}' of {}/{}",
            request.mirror_name, request.project_name, request.repository_name
        );
        let client = self.client(request)?;
        let repository = self.upstream(client.as_ref(), request)?;

        let descriptor = client
            .get_mirror_descriptors(repository.id)?
            .into_iter()
            .find(|descriptor| descriptor.mirror_server.name == request.mirror_name)
            .ok_or_else(|| MirrorFetchError::NotFound {
                mirror_name: request.mirror_name.clone(),
                project_name: request.project_name.clone(),
                repository_name: request.repository_name.clone(),
            })?;

        let mirrored = client.get_mirrored_repository(&descriptor)?;
        if !mirrored.available {
            return Err(MirrorFetchError::Unavailable {
                mirror_name: request.mirror_name.clone(),
            });
        }

        Ok(EnrichedMirroredRepository::new(repository, mirrored))
    }

    /// Names of the mirrors that currently serve the repository.
    /// `request.mirror_name` is ignored.
    pub fn available_mirrors(
        &self,
        request: &MirrorFetchRequest,
    ) -> Result<Vec<String>, MirrorFetchError> {
        let client = self.client(request)?;
        let repository = self.upstream(client.as_ref(), request)?;

        let mut names = Vec::new();
        for descriptor in client.get_mirror_descriptors(repository.id)? {
            match client.get_mirrored_repository(&descriptor) {
                Ok(mirrored) if mirrored.available => names.push(mirrored.mirror_name),
                Ok(_) => debug!("Mirror '{}' is not available", descriptor.mirror_server.name),
                Err(e) => warn!(
                    "Skipping mirror '{}': {}",
                    descriptor.mirror_server.name, e
                ),
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        MirrorServer, MirroredRepository, MirroredRepositoryDescriptor, NamedLink, RepositoryLinks,
        SelfLinks,
    };
    use crate::infrastructure::bitbucket::client::MockRemoteApiClient;
    use crate::infrastructure::credentials::{Credential, CredentialStore};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct SingleClientFactory {
        client: Arc<dyn RemoteApiClient>,
        seen_credentials: Mutex<Vec<Option<Credential>>>,
    }

    impl ClientFactory for SingleClientFactory {
        fn client(
            &self,
            _base_url: &str,
            credentials: Option<&Credential>,
        ) -> Result<Arc<dyn RemoteApiClient>, ApiError> {
            self.seen_credentials
                .lock()
                .unwrap()
                .push(credentials.cloned());
            Ok(Arc::clone(&self.client))
        }
    }

    fn upstream() -> BitbucketRepository {
        let mut repository = BitbucketRepository::placeholder("Project 1", "rep_1");
        repository.id = 11;
        repository.project.key = "PROJECT_1".to_string();
        repository
    }

    fn descriptor(name: &str) -> MirroredRepositoryDescriptor {
        MirroredRepositoryDescriptor {
            mirror_server: MirrorServer {
                id: format!("{}-id", name),
                name: name.to_string(),
                base_url: None,
            },
            links: SelfLinks::default(),
        }
    }

    fn mirrored(name: &str, available: bool) -> MirroredRepository {
        MirroredRepository {
            available,
            mirror_name: name.to_string(),
            repository_id: 11,
            status: None,
            links: RepositoryLinks {
                clone: vec![NamedLink::new(
                    "http",
                    format!("http://{}/scm/project_1/rep_1.git", name),
                )],
                self_links: vec![],
            },
        }
    }

    fn resolver(client: MockRemoteApiClient) -> (MirrorResolver, Arc<SingleClientFactory>) {
        let factory = Arc::new(SingleClientFactory {
            client: Arc::new(client),
            seen_credentials: Mutex::new(Vec::new()),
        });
        let credentials = CredentialStore::new().with_credential(
            "job",
            Credential::Token {
                secret: "job-token".to_string(),
            },
        );
        (
            MirrorResolver::new(factory.clone(), Arc::new(credentials)),
            factory,
        )
    }

    fn request(mirror: &str) -> MirrorFetchRequest {
        MirrorFetchRequest::new("http://upstream", "Project 1", "rep_1", mirror)
            .with_credentials(Some("job".to_string()), None)
    }

    #[test]
    fn test_fetch_repository_returns_enriched_mirror() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .withf(|project, repo| project == "Project 1" && repo == "rep_1")
            .returning(|_, _| Ok(upstream()));
        client
            .expect_get_mirror_descriptors()
            .withf(|id| *id == 11)
            .returning(|_| Ok(vec![descriptor("mirror-a"), descriptor("mirror-b")]));
        client
            .expect_get_mirrored_repository()
            .withf(|d| d.mirror_server.name == "mirror-b")
            .returning(|_| Ok(mirrored("mirror-b", true)));

        let (resolver, factory) = resolver(client);
        let enriched = resolver.fetch_repository(&request("mirror-b")).unwrap();

        assert_eq!(enriched.repository().slug, "rep_1");
        assert_eq!(enriched.mirroring_details().mirror_name, "mirror-b");
        assert_eq!(
            factory.seen_credentials.lock().unwrap().as_slice(),
            &[Some(Credential::Token {
                secret: "job-token".to_string()
            })]
        );
    }

    #[test]
    fn test_unregistered_mirror_is_not_found() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, _| Ok(upstream()));
        client
            .expect_get_mirror_descriptors()
            .returning(|_| Ok(vec![descriptor("mirror-a")]));
        client.expect_get_mirrored_repository().never();

        let (resolver, _) = resolver(client);
        let result = resolver.fetch_repository(&request("mirror-z"));
        assert!(matches!(result, Err(MirrorFetchError::NotFound { .. })));
    }

    #[test]
    fn test_unavailable_mirror_fails() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, _| Ok(upstream()));
        client
            .expect_get_mirror_descriptors()
            .returning(|_| Ok(vec![descriptor("mirror-a")]));
        client
            .expect_get_mirrored_repository()
            .returning(|_| Ok(mirrored("mirror-a", false)));

        let (resolver, _) = resolver(client);
        let result = resolver.fetch_repository(&request("mirror-a"));
        assert!(matches!(result, Err(MirrorFetchError::Unavailable { .. })));
    }

    #[test]
    fn test_upstream_lookup_failure() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, _| Err(ApiError::not_found("http://upstream/rest/api/1.0/repos")));
        client.expect_get_mirror_descriptors().never();

        let (resolver, _) = resolver(client);
        let result = resolver.fetch_repository(&request("mirror-a"));
        assert!(matches!(
            result,
            Err(MirrorFetchError::RepositoryLookup { .. })
        ));
    }

    #[test]
    fn test_api_failure_while_listing_mirrors() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, _| Ok(upstream()));
        client
            .expect_get_mirror_descriptors()
            .returning(|_| Err(ApiError::from_status(401, "http://upstream")));

        let (resolver, _) = resolver(client);
        let result = resolver.fetch_repository(&request("mirror-a"));
        assert!(matches!(result, Err(MirrorFetchError::Api { .. })));
    }

    #[test]
    fn test_custom_repository_lookup() {
        let mut client = MockRemoteApiClient::new();
        client.expect_find_repository().never();
        client
            .expect_get_mirror_descriptors()
            .returning(|_| Ok(vec![descriptor("mirror-a")]));
        client
            .expect_get_mirrored_repository()
            .returning(|_| Ok(mirrored("mirror-a", true)));

        let (resolver, _) = resolver(client);
        let resolver = resolver.with_repository_lookup(|_, _, _| Ok(upstream()));
        assert!(resolver.fetch_repository(&request("mirror-a")).is_ok());
    }

    #[test]
    fn test_available_mirrors_skips_unavailable_and_failing() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, _| Ok(upstream()));
        client.expect_get_mirror_descriptors().returning(|_| {
            Ok(vec![
                descriptor("mirror-a"),
                descriptor("mirror-b"),
                descriptor("mirror-c"),
            ])
        });
        client
            .expect_get_mirrored_repository()
            .returning(|d| match d.mirror_server.name.as_str() {
                "mirror-a" => Ok(mirrored("mirror-a", true)),
                "mirror-b" => Ok(mirrored("mirror-b", false)),
                _ => Err(ApiError::from_status(403, "http://mirror-c")),
            });

        let (resolver, _) = resolver(client);
        let names = resolver.available_mirrors(&request("")).unwrap();
        assert_eq!(names, vec!["mirror-a".to_string()]);
    }
}
