/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - Bitbucket Server REST client (repositories, mirrors, file browsing)
/// - Credential lookup
/// - Configuration file loading
/// - Full checkout engines (git command line)
pub mod bitbucket;
pub mod credentials;
pub mod filesystem;
pub mod scm;

// Re-export commonly used types
pub use bitbucket::{ApiError, ClientFactory, FilePathClient, HttpClientFactory, RemoteApiClient};
pub use credentials::{Credential, CredentialResolver, CredentialStore};
pub use filesystem::{ConfigurationStore, PluginConfiguration};
pub use scm::{EngineConfig, EngineFactory, GitScm, GitScmFactory, ScmError, VcsEngine};
