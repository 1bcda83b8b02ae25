pub mod mirror_resolver;
pub mod repository_resolver;

pub use mirror_resolver::{MirrorFetchError, MirrorFetchRequest, MirrorResolver, RepositoryLookup};
pub use repository_resolver::{RepositoryResolver, ResolveRequest};
