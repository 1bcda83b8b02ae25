//! # bbs-scm - Bitbucket Server SCM adapter
//!
//! `bbs-scm` turns the names a job configuration persists (server id,
//! project, repository, optional mirror) into a checkout-ready repository
//! reference, and offers two ways of reading the repository:
//!
//! - a full checkout through a clone-based VCS engine (git), and
//! - a lightweight, clone-free filesystem view of a single ref served by the
//!   Bitbucket Server REST API.
//!
//! ## Resolution never fails
//!
//! [`RepositoryResolver::resolve`](application::services::RepositoryResolver::resolve)
//! always returns a value. An unknown server, blank names, an unreachable
//! server or an unusable mirror degrade to a placeholder repository (id `-1`,
//! empty links) so that a half-configured job can still be loaded and saved.
//! The reason is carried in
//! [`Resolution::Placeholder`](domain::entities::Resolution).
//!
//! ## Architecture
//!
//! - [`domain`]: Bitbucket payloads, repository references, branch specs
//! - [`application`]: resolvers, the SCM facade and the lightweight filesystem
//! - [`infrastructure`]: REST client, credentials, configuration, git engine
//! - [`presentation`]: the `bbscm` command line
//! - [`common`]: error handling
//!
//! ## Example
//!
//! ```rust,no_run
//! use bbs_scm::application::services::ResolveRequest;
//! use bbs_scm::presentation::cli::context::AppContext;
//! use std::path::Path;
//!
//! # fn example() -> bbs_scm::Result<()> {
//! let context = AppContext::load(Path::new("bbscm.yaml"))?;
//! let request = ResolveRequest::new("bitbucket", "Project 1", "rep_1");
//! let resolved = context.resolver().resolve(&request);
//!
//! println!("{} ({})", resolved.clone_endpoint.url, resolved.clone_endpoint.protocol);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::BbsError;
pub use crate::common::result::BbsResult as Result;
