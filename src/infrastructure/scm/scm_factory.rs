use super::git_scm::GitScm;
use super::scm_interface::{EngineConfig, EngineFactory, VcsEngine};
use crate::infrastructure::credentials::CredentialResolver;
use std::sync::Arc;

/// Creates git engines sharing one credential resolver
pub struct GitScmFactory {
    credentials: Arc<dyn CredentialResolver>,
    git_executable: Option<String>,
}

impl GitScmFactory {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            credentials,
            git_executable: None,
        }
    }

    /// Use a custom git executable unless the configuration names one
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.git_executable = Some(executable.into());
        self
    }
}

impl EngineFactory for GitScmFactory {
    fn create(&self, config: EngineConfig) -> Arc<dyn VcsEngine> {
        let configured_tool = config.git_tool.is_some();
        let engine = GitScm::new(config, Arc::clone(&self.credentials));
        match &self.git_executable {
            Some(executable) if !configured_tool => Arc::new(engine.with_executable(executable)),
            _ => Arc::new(engine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::BranchSpec;
    use crate::infrastructure::credentials::CredentialStore;
    use crate::infrastructure::scm::RemoteConfig;

    #[test]
    fn test_create_keeps_configuration() {
        let factory = GitScmFactory::new(Arc::new(CredentialStore::new()));
        let config = EngineConfig {
            remotes: vec![RemoteConfig {
                url: "https://h/scm/p/r.git".to_string(),
                name: "r".to_string(),
                credentials_id: None,
            }],
            branches: vec![BranchSpec::new("refs/heads/main")],
            extensions: vec![],
            browser: None,
            git_tool: None,
        };
        let engine = factory.create(config.clone());
        assert_eq!(engine.config(), &config);
        assert!(engine.browser().is_none());
    }
}
