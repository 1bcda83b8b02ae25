use crate::domain::value_objects::{BitbucketBrowser, BranchSpec, ScmExtension};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Remote the engine fetches from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Clone URL, possibly empty when resolution failed
    pub url: String,
    /// Local name of the remote (the repository slug)
    pub name: String,
    /// Credential used to fetch
    pub credentials_id: Option<String>,
}

/// Everything a full checkout engine is configured with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub remotes: Vec<RemoteConfig>,
    pub branches: Vec<BranchSpec>,
    pub extensions: Vec<ScmExtension>,
    pub browser: Option<BitbucketBrowser>,
    /// Name or path of the git executable
    pub git_tool: Option<String>,
}

impl EngineConfig {
    pub fn primary_remote(&self) -> Option<&RemoteConfig> {
        self.remotes.first()
    }
}

/// A commit that was built, and the ref it was found on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuiltRevision {
    pub sha1: String,
    pub ref_name: String,
}

/// The build an operation runs for
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub number: u64,
    pub workspace: PathBuf,
    /// Revision checked out by this build, once known
    pub revision: Option<BuiltRevision>,
    /// Revision built by the previous build of the same job
    pub previous_revision: Option<BuiltRevision>,
}

/// Remote heads seen by a build, keyed by ref
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionState {
    pub heads: HashMap<String, String>,
}

impl RevisionState {
    pub fn single(ref_name: impl Into<String>, sha1: impl Into<String>) -> Self {
        let mut heads = HashMap::new();
        heads.insert(ref_name.into(), sha1.into());
        Self { heads }
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }
}

/// Outcome of polling the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollingResult {
    NoChanges,
    Significant,
    /// No baseline to compare against
    BuildNow,
}

/// One commit of a changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub commit: String,
    pub author: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Reads the changelog file a checkout wrote
pub trait ChangeLogParser: Send + Sync {
    fn parse(&self, changelog_file: &Path) -> Result<Vec<ChangeLogEntry>, ScmError>;
}

/// Full, clone-based checkout engine
#[async_trait]
pub trait VcsEngine: Send + Sync {
    /// Configuration the engine was built with
    fn config(&self) -> &EngineConfig;

    /// Check out the newest revision matching the branch specs into the
    /// build workspace, writing the changes since `baseline` to
    /// `changelog_file`
    async fn checkout(
        &self,
        build: &BuildContext,
        changelog_file: Option<&Path>,
        baseline: Option<&RevisionState>,
    ) -> Result<BuiltRevision, ScmError>;

    /// State to compare later polls against
    async fn calc_revisions_from_build(
        &self,
        build: &BuildContext,
    ) -> Result<Option<RevisionState>, ScmError>;

    /// Poll the remote for changes since `baseline`
    async fn compare_remote_revision_with(
        &self,
        baseline: &RevisionState,
    ) -> Result<PollingResult, ScmError>;

    /// Add SCM variables to the build environment
    fn build_environment(&self, build: &BuildContext, env: &mut HashMap<String, String>);

    fn changelog_parser(&self) -> Box<dyn ChangeLogParser>;

    fn browser(&self) -> Option<&BitbucketBrowser> {
        self.config().browser.as_ref()
    }
}

/// Builds configured engines
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: EngineConfig) -> Arc<dyn VcsEngine>;
}

/// Errors that can occur during full checkout operations
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    #[error("No remote configured")]
    NoRemote,

    #[error("Invalid remote URL: '{url}'")]
    InvalidRemote { url: String },

    #[error("No revision matches branch specs [{specs}]")]
    NoMatchingRevision { specs: String },

    #[error("Checkout failed: {message}")]
    CheckoutFailed { message: String },

    #[error("Credentials '{credentials_id}' not found")]
    CredentialsNotFound { credentials_id: String },

    #[error("SCM executable not found: {executable}")]
    ExecutableNotFound { executable: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Command execution failed: {command}, exit code: {exit_code}, stderr: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Malformed changelog entry: {line}")]
    MalformedChangeLog { line: String },
}

impl ScmError {
    pub fn checkout_failed(message: impl Into<String>) -> Self {
        Self::CheckoutFailed {
            message: message.into(),
        }
    }

    pub fn executable_not_found(executable: impl Into<String>) -> Self {
        Self::ExecutableNotFound {
            executable: executable.into(),
        }
    }

    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }
}
