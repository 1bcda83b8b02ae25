pub mod branch_spec;
pub mod clone_protocol;
pub mod link_type;
pub mod repository_browser;
pub mod scm_extension;
pub mod validation_kind;

pub use branch_spec::{BranchSpec, BranchSpecKind, R_HEADS, R_TAGS};
pub use clone_protocol::{CloneEndpoint, CloneProtocol};
pub use link_type::LinkType;
pub use repository_browser::BitbucketBrowser;
pub use scm_extension::ScmExtension;
pub use validation_kind::ValidationKind;
