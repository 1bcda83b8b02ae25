pub mod bitbucket;
pub mod repository;
pub mod revision;
pub mod scm_config;
pub mod server_config;

pub use bitbucket::{
    BitbucketPage, BitbucketProject, BitbucketRepository, EnrichedMirroredRepository, Link,
    MirrorServer, MirroredRepository, MirroredRepositoryDescriptor, MirroredRepositoryStatus,
    NamedLink, ProjectType, RepositoryLinks, RepositoryState, SelfLinks,
    PLACEHOLDER_REPOSITORY_ID,
};
pub use repository::{
    CredentialIds, PlaceholderReason, RepositoryReference, RepositorySelection, Resolution,
    ResolvedRepository,
};
pub use revision::{ScmHead, ScmRevision};
pub use scm_config::{ScmConfig, ScmSourceConfig};
pub use server_config::ServerConfig;
