use crate::common::error::BbsError;

/// Result alias used across the crate.
///
/// # Examples
///
/// ```
/// use bbs_scm::common::result::BbsResult;
/// use bbs_scm::infrastructure::filesystem::PluginConfiguration;
///
/// fn load(yaml: &str) -> BbsResult<PluginConfiguration> {
///     Ok(PluginConfiguration::from_yaml_str(yaml)?)
/// }
///
/// assert!(load("servers: []").is_ok());
/// assert!(load("servers: {").is_err());
/// ```
pub type BbsResult<T> = Result<T, BbsError>;
