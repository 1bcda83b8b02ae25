use super::bitbucket_scm::BitbucketScm;
use super::scm_source::BitbucketScmSource;
use crate::application::services::{RepositoryResolver, ResolveRequest};
use crate::domain::entities::{ResolvedRepository, ScmConfig, ScmSourceConfig};
use crate::domain::value_objects::{BitbucketBrowser, BranchSpec};
use crate::infrastructure::scm::{EngineConfig, EngineFactory, RemoteConfig};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Builds fully configured SCM adapters from persisted configuration
pub struct ScmFactory {
    resolver: Arc<RepositoryResolver>,
    engines: Arc<dyn EngineFactory>,
}

impl ScmFactory {
    pub fn new(resolver: Arc<RepositoryResolver>, engines: Arc<dyn EngineFactory>) -> Self {
        Self { resolver, engines }
    }

    pub fn resolver(&self) -> &Arc<RepositoryResolver> {
        &self.resolver
    }

    /// Resolve the configured repository and configure an engine for it.
    pub fn build(&self, config: &ScmConfig) -> BitbucketScm {
        let id = scm_id(config.id.as_deref());
        let resolved = self.resolver.resolve(&ResolveRequest::from(config));
        let engine = self.engines.create(engine_config(config, &resolved));
        debug!(
            "Built SCM {} for {}/{}",
            id,
            resolved.reference.project_key(),
            resolved.reference.repository_slug()
        );
        BitbucketScm::new(id, config.clone(), resolved, engine)
    }

    /// Re-run resolution from the names an existing adapter persisted.
    pub fn regenerate(&self, scm: &BitbucketScm) -> BitbucketScm {
        self.build(&scm.persisted_config())
    }

    pub fn build_source(&self, config: &ScmSourceConfig) -> BitbucketScmSource {
        let id = scm_id(config.id.as_deref());
        let resolved = self.resolver.resolve(&ResolveRequest::from(config));
        BitbucketScmSource::new(id, resolved)
    }
}

fn scm_id(configured: Option<&str>) -> String {
    configured
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn engine_config(config: &ScmConfig, resolved: &ResolvedRepository) -> EngineConfig {
    let reference = &resolved.reference;
    let branches = if config.branches.is_empty() {
        vec![BranchSpec::new("")]
    } else {
        config.branches.clone()
    };
    let browser = (!resolved.repository_url.is_empty())
        .then(|| BitbucketBrowser::new(resolved.repository_url.as_str()));

    EngineConfig {
        remotes: vec![RemoteConfig {
            url: resolved.clone_endpoint.url.clone(),
            name: reference.repository_slug().to_string(),
            credentials_id: reference.credentials().for_checkout().map(str::to_string),
        }],
        branches,
        extensions: config.extensions.clone(),
        browser,
        git_tool: config.git_tool.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        BitbucketProject, BitbucketRepository, CredentialIds, Link, NamedLink, RepositoryLinks,
        ServerConfig,
    };
    use crate::domain::value_objects::LinkType;
    use crate::infrastructure::bitbucket::client::MockRemoteApiClient;
    use crate::infrastructure::bitbucket::{ApiError, ClientFactory, RemoteApiClient};
    use crate::infrastructure::credentials::{Credential, CredentialStore};
    use crate::infrastructure::filesystem::PluginConfiguration;
    use crate::infrastructure::scm::{
        BuildContext, BuiltRevision, ChangeLogParser, GitChangeLogParser, PollingResult,
        RevisionState, ScmError, VcsEngine,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    struct SingleClientFactory(Arc<dyn RemoteApiClient>);

    impl ClientFactory for SingleClientFactory {
        fn client(
            &self,
            _base_url: &str,
            _credentials: Option<&Credential>,
        ) -> Result<Arc<dyn RemoteApiClient>, ApiError> {
            Ok(Arc::clone(&self.0))
        }
    }

    struct RecordingEngine {
        config: EngineConfig,
    }

    #[async_trait]
    impl VcsEngine for RecordingEngine {
        fn config(&self) -> &EngineConfig {
            &self.config
        }

        async fn checkout(
            &self,
            _build: &BuildContext,
            _changelog_file: Option<&Path>,
            _baseline: Option<&RevisionState>,
        ) -> Result<BuiltRevision, ScmError> {
            Ok(BuiltRevision {
                sha1: "0a943a29376f2336b78312d99e65da17048951db".to_string(),
                ref_name: "refs/heads/master".to_string(),
            })
        }

        async fn calc_revisions_from_build(
            &self,
            _build: &BuildContext,
        ) -> Result<Option<RevisionState>, ScmError> {
            Ok(None)
        }

        async fn compare_remote_revision_with(
            &self,
            _baseline: &RevisionState,
        ) -> Result<PollingResult, ScmError> {
            Ok(PollingResult::NoChanges)
        }

        fn build_environment(&self, _build: &BuildContext, env: &mut HashMap<String, String>) {
            env.insert("GIT_URL".to_string(), self.config.remotes[0].url.clone());
        }

        fn changelog_parser(&self) -> Box<dyn ChangeLogParser> {
            Box::new(GitChangeLogParser)
        }
    }

    #[derive(Default)]
    struct RecordingEngineFactory {
        created: Mutex<Vec<EngineConfig>>,
    }

    impl EngineFactory for RecordingEngineFactory {
        fn create(&self, config: EngineConfig) -> Arc<dyn VcsEngine> {
            self.created.lock().unwrap().push(config.clone());
            Arc::new(RecordingEngine { config })
        }
    }

    fn repository(name: &str) -> BitbucketRepository {
        BitbucketRepository {
            id: 1,
            name: name.to_string(),
            slug: name.to_lowercase(),
            project: BitbucketProject::new("PROJECT_1", "Project 1"),
            state: Default::default(),
            links: RepositoryLinks {
                clone: vec![NamedLink::new(
                    "http",
                    format!("http://localhost:7990/scm/project_1/{}.git", name.to_lowercase()),
                )],
                self_links: vec![Link {
                    href: format!(
                        "http://localhost:7990/projects/PROJECT_1/repos/{}/browse",
                        name.to_lowercase()
                    ),
                }],
            },
        }
    }

    fn scm_factory(client: MockRemoteApiClient) -> (ScmFactory, Arc<RecordingEngineFactory>) {
        let config = PluginConfiguration::new().with_server(ServerConfig::new(
            "server",
            "Bitbucket",
            "http://localhost:7990",
        ));
        let resolver = RepositoryResolver::new(
            Arc::new(config),
            Arc::new(CredentialStore::new()),
            Arc::new(SingleClientFactory(Arc::new(client))),
        );
        let engines = Arc::new(RecordingEngineFactory::default());
        (ScmFactory::new(Arc::new(resolver), engines.clone()), engines)
    }

    #[test]
    fn test_build_configures_engine_from_resolution() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, repo| Ok(repository(repo)));
        let (factory, engines) = scm_factory(client);

        let config = ScmConfig::new("server", "Project 1", "rep_1")
            .with_branches(["refs/heads/master"])
            .with_credentials(CredentialIds::new(
                Some("http".to_string()),
                Some("ssh".to_string()),
            ));
        let scm = factory.build(&config);

        assert!(!scm.id().is_empty());
        assert_eq!(scm.repository_name(), "rep_1");
        let created = engines.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        let remote = &created[0].remotes[0];
        assert_eq!(remote.name, "rep_1");
        assert_eq!(remote.credentials_id.as_deref(), Some("ssh"));
        assert_eq!(created[0].branches, vec![BranchSpec::new("refs/heads/master")]);
        assert_eq!(
            created[0].browser.as_ref().map(|b| b.repository_url()),
            Some("http://localhost:7990/projects/PROJECT_1/repos/rep_1")
        );
        assert_eq!(
            scm.link(LinkType::Repo, None).map(|(name, _)| name),
            Some("Browse Repo")
        );
    }

    #[test]
    fn test_build_keeps_configured_id_and_defaults_branches() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, repo| Ok(repository(repo)));
        let (factory, engines) = scm_factory(client);

        let mut config = ScmConfig::new("server", "Project 1", "rep_1");
        config.id = Some("fixed-id".to_string());
        let scm = factory.build(&config);

        assert_eq!(scm.id(), "fixed-id");
        assert_eq!(
            engines.created.lock().unwrap()[0].branches,
            vec![BranchSpec::new("**")]
        );
    }

    #[test]
    fn test_regenerate_resolves_again() {
        let mut client = MockRemoteApiClient::new();
        let mut calls = 0;
        client.expect_find_repository().times(2).returning(move |_, repo| {
            calls += 1;
            let mut repository = repository(repo);
            if calls > 1 {
                repository.links.clone = vec![NamedLink::new(
                    "http",
                    "http://new-host/scm/project_1/rep_1.git",
                )];
            }
            Ok(repository)
        });
        let (factory, engines) = scm_factory(client);

        let scm = factory.build(&ScmConfig::new("server", "Project 1", "rep_1"));
        let regenerated = factory.regenerate(&scm);

        assert_eq!(regenerated.id(), scm.id());
        assert_eq!(regenerated.persisted_config(), scm.persisted_config());
        assert_eq!(
            regenerated.clone_endpoint().url,
            "http://new-host/scm/project_1/rep_1.git"
        );
        assert_eq!(engines.created.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unresolvable_configuration_still_builds() {
        let client = MockRemoteApiClient::new();
        let (factory, engines) = scm_factory(client);

        let scm = factory.build(&ScmConfig::new("unknown", "Project 1", "rep_1"));

        assert!(scm.resolved().is_placeholder());
        assert_eq!(scm.clone_endpoint().url, "");
        assert!(scm.browser().is_none());
        assert_eq!(engines.created.lock().unwrap()[0].remotes[0].url, "");
        assert_eq!(scm.persisted_config().project_name.as_deref(), Some("Project 1"));
    }

    #[tokio::test]
    async fn test_operations_are_forwarded_to_engine() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, repo| Ok(repository(repo)));
        let (factory, _) = scm_factory(client);
        let scm = factory.build(&ScmConfig::new("server", "Project 1", "rep_1"));

        let build = BuildContext::default();
        let revision = scm.checkout(&build, None, None).await.unwrap();
        assert_eq!(revision.ref_name, "refs/heads/master");
        assert_eq!(
            scm.compare_remote_revision_with(&RevisionState::default())
                .await
                .unwrap(),
            PollingResult::NoChanges
        );
        assert_eq!(scm.calc_revisions_from_build(&build).await.unwrap(), None);

        let mut env = HashMap::new();
        scm.build_environment(&build, &mut env);
        assert_eq!(env["GIT_URL"], "http://localhost:7990/scm/project_1/rep_1.git");
    }

    #[test]
    fn test_build_source() {
        let mut client = MockRemoteApiClient::new();
        client
            .expect_find_repository()
            .returning(|_, repo| Ok(repository(repo)));
        let (factory, _) = scm_factory(client);

        let source = factory.build_source(&ScmSourceConfig::new("server", "Project 1", "rep_1"));
        assert_eq!(source.server_id(), Some("server"));
        assert_eq!(source.reference().repository_slug(), "rep_1");
        assert_eq!(source.persisted_config().project_name.as_deref(), Some("Project 1"));
    }
}
