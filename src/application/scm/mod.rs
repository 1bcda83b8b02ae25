pub mod bitbucket_scm;
pub mod scm_factory;
pub mod scm_source;

pub use bitbucket_scm::BitbucketScm;
pub use scm_factory::ScmFactory;
pub use scm_source::BitbucketScmSource;
