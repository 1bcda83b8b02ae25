//! Full, clone-based checkout engines.
//!
//! The Bitbucket adapter never checks out code itself; it configures a
//! [`VcsEngine`] and forwards every full checkout operation to it.

pub mod git_scm;
pub mod scm_factory;
pub mod scm_interface;

pub use git_scm::{GitChangeLogParser, GitScm};
pub use scm_factory::GitScmFactory;
pub use scm_interface::{
    BuildContext, BuiltRevision, ChangeLogEntry, ChangeLogParser, EngineConfig, EngineFactory,
    PollingResult, RemoteConfig, RevisionState, ScmError, VcsEngine,
};
