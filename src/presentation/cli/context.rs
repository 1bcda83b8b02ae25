use crate::application::filesystem::LightweightFilesystemProvider;
use crate::application::scm::ScmFactory;
use crate::application::services::RepositoryResolver;
use crate::common::error::BbsError;
use crate::common::result::BbsResult;
use crate::infrastructure::bitbucket::HttpClientFactory;
use crate::infrastructure::credentials::CredentialStore;
use crate::infrastructure::filesystem::PluginConfiguration;
use crate::infrastructure::scm::GitScmFactory;
use std::path::Path;
use std::sync::Arc;

/// Collaborators wired from one configuration file
pub struct AppContext {
    config: Arc<PluginConfiguration>,
    credentials: Arc<CredentialStore>,
    resolver: Arc<RepositoryResolver>,
}

impl AppContext {
    /// Load the configuration file and wire the HTTP client factory.
    ///
    /// Must run outside of an async runtime: the REST client is blocking.
    pub fn load(path: &Path) -> BbsResult<Self> {
        let config = PluginConfiguration::load(path)?;
        let credentials = config.credential_store().map_err(|e| {
            BbsError::config_error_with_source(
                "Credentials could not be loaded",
                Some(path.to_path_buf()),
                e,
            )
        })?;
        let credentials = Arc::new(credentials);
        let clients = Arc::new(HttpClientFactory::new(config.http.timeout())?);
        let config = Arc::new(config);
        let resolver = Arc::new(RepositoryResolver::new(
            config.clone(),
            credentials.clone(),
            clients,
        ));
        Ok(Self {
            config,
            credentials,
            resolver,
        })
    }

    pub fn config(&self) -> &PluginConfiguration {
        &self.config
    }

    pub fn resolver(&self) -> &RepositoryResolver {
        &self.resolver
    }

    pub fn scm_factory(&self) -> ScmFactory {
        ScmFactory::new(
            self.resolver.clone(),
            Arc::new(GitScmFactory::new(self.credentials.clone())),
        )
    }

    pub fn filesystem_provider(&self) -> LightweightFilesystemProvider {
        LightweightFilesystemProvider::from_resolver(&self.resolver)
    }
}
