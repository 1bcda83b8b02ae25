//! Credential lookup by id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// A usable secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credential {
    /// Personal or project access token
    Token { secret: String },
    UsernamePassword { username: String, password: String },
    SshKey {
        username: String,
        private_key_path: PathBuf,
    },
}

impl Credential {
    pub fn is_ssh(&self) -> bool {
        matches!(self, Credential::SshKey { .. })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token { .. } => f.write_str("Token(****)"),
            Credential::UsernamePassword { username, .. } => {
                write!(f, "UsernamePassword({}, ****)", username)
            }
            Credential::SshKey {
                username,
                private_key_path,
            } => write!(f, "SshKey({}, {})", username, private_key_path.display()),
        }
    }
}

/// Maps a credential id to a usable credential.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, credentials_id: &str) -> Option<Credential>;

    /// Credential for REST calls: the job's own credential when it can be
    /// used over HTTP, otherwise the server's admin credential.
    fn resolve_for_api(
        &self,
        credentials_id: Option<&str>,
        admin_credentials_id: Option<&str>,
    ) -> Option<Credential> {
        credentials_id
            .into_iter()
            .chain(admin_credentials_id)
            .filter_map(|id| self.resolve(id))
            .find(|credential| !credential.is_ssh())
    }
}

/// In-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credentials: HashMap<String, Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, id: impl Into<String>, credential: Credential) -> Self {
        self.insert(id, credential);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, credential: Credential) {
        self.credentials.insert(id.into(), credential);
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialResolver for CredentialStore {
    fn resolve(&self, credentials_id: &str) -> Option<Credential> {
        let credential = self.credentials.get(credentials_id).cloned();
        if credential.is_none() {
            tracing::debug!("No credentials found for id {}", credentials_id);
        }
        credential
    }
}
