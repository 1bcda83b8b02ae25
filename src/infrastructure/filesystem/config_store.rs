use crate::domain::entities::ServerConfig;
use crate::infrastructure::credentials::{Credential, CredentialStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Configuration file read failed: {path}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing failed: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Credential '{id}' has no secret: set `secret` or the environment variable {variable}")]
    MissingSecret { id: String, variable: String },
}

/// Transport settings shared by every REST client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Token,
    UsernamePassword,
    SshKey,
}

/// Credential as written in the configuration file.
///
/// Secrets are either inline (`secret`) or read from the environment
/// variable named by `secret_env`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub id: String,
    pub kind: CredentialKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,
}

impl CredentialEntry {
    fn secret(&self) -> Result<String, ConfigStoreError> {
        if let Some(secret) = &self.secret {
            return Ok(secret.clone());
        }
        let variable = self
            .secret_env
            .clone()
            .unwrap_or_else(|| format!("BBSCM_SECRET_{}", self.id.to_uppercase().replace('-', "_")));
        std::env::var(&variable).map_err(|_| ConfigStoreError::MissingSecret {
            id: self.id.clone(),
            variable,
        })
    }

    pub fn to_credential(&self) -> Result<Credential, ConfigStoreError> {
        let username = || {
            self.username.clone().ok_or_else(|| {
                ConfigStoreError::ValidationFailed(format!("credential '{}' needs a username", self.id))
            })
        };
        match self.kind {
            CredentialKind::Token => Ok(Credential::Token {
                secret: self.secret()?,
            }),
            CredentialKind::UsernamePassword => Ok(Credential::UsernamePassword {
                username: username()?,
                password: self.secret()?,
            }),
            CredentialKind::SshKey => Ok(Credential::SshKey {
                username: self.username.clone().unwrap_or_else(|| "git".to_string()),
                private_key_path: self.private_key_path.clone().ok_or_else(|| {
                    ConfigStoreError::ValidationFailed(format!(
                        "credential '{}' needs a private_key_path",
                        self.id
                    ))
                })?,
            }),
        }
    }
}

/// Lookup of configured Bitbucket servers.
pub trait ConfigurationStore: Send + Sync {
    fn get_server_by_id(&self, server_id: &str) -> Option<ServerConfig>;

    fn servers(&self) -> Vec<ServerConfig>;
}

/// Contents of `bbscm.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfiguration {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

impl PluginConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.servers.push(server);
        self
    }

    /// Read and check a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigStoreError> {
        if !path.exists() {
            return Err(ConfigStoreError::ConfigFileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigStoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(
            "Loaded {} server(s) and {} credential(s) from {}",
            config.servers.len(),
            config.credentials.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigStoreError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Reject duplicate ids. Individual servers are validated on use.
    pub fn check(&self) -> Result<(), ConfigStoreError> {
        let mut server_ids = HashSet::new();
        for server in &self.servers {
            if !server_ids.insert(server.id.as_str()) {
                return Err(ConfigStoreError::ValidationFailed(format!(
                    "duplicate server id '{}'",
                    server.id
                )));
            }
        }
        let mut credential_ids = HashSet::new();
        for credential in &self.credentials {
            if !credential_ids.insert(credential.id.as_str()) {
                return Err(ConfigStoreError::ValidationFailed(format!(
                    "duplicate credential id '{}'",
                    credential.id
                )));
            }
        }
        Ok(())
    }

    pub fn credential_store(&self) -> Result<CredentialStore, ConfigStoreError> {
        let mut store = CredentialStore::new();
        for entry in &self.credentials {
            store.insert(entry.id.clone(), entry.to_credential()?);
        }
        Ok(store)
    }
}

impl ConfigurationStore for PluginConfiguration {
    fn get_server_by_id(&self, server_id: &str) -> Option<ServerConfig> {
        if server_id.trim().is_empty() {
            return None;
        }
        self.servers.iter().find(|server| server.id == server_id).cloned()
    }

    fn servers(&self) -> Vec<ServerConfig> {
        self.servers.clone()
    }
}
