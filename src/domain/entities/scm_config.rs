use super::repository::CredentialIds;
use crate::domain::value_objects::{BranchSpec, ScmExtension};
use serde::{Deserialize, Serialize};

/// Persisted configuration of a single-repository job.
///
/// Everything is optional: a half-filled form must still round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub branches: Vec<BranchSpec>,
    #[serde(flatten)]
    pub credentials: CredentialIds,
    #[serde(default)]
    pub extensions: Vec<ScmExtension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_name: Option<String>,
}

impl ScmConfig {
    pub fn new(
        server_id: impl Into<String>,
        project_name: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        Self {
            server_id: Some(server_id.into()),
            project_name: Some(project_name.into()),
            repository_name: Some(repository_name.into()),
            ..Self::default()
        }
    }

    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BranchSpec>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialIds) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_mirror(mut self, mirror_name: impl Into<String>) -> Self {
        self.mirror_name = Some(mirror_name.into());
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<ScmExtension>) -> Self {
        self.extensions = extensions;
        self
    }
}

/// Persisted configuration of a branch-source (multi-branch) job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmSourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub credentials: CredentialIds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_name: Option<String>,
}

impl ScmSourceConfig {
    pub fn new(
        server_id: impl Into<String>,
        project_name: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        Self {
            server_id: Some(server_id.into()),
            project_name: Some(project_name.into()),
            repository_name: Some(repository_name.into()),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialIds) -> Self {
        self.credentials = credentials;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scm_config_yaml_round_trip_with_missing_fields() {
        let yaml = "branches: [\"refs/heads/master\"]\ncredentials_id: creds\nproject_name: PROJECT_1\n";
        let config: ScmConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.branches, vec![BranchSpec::new("refs/heads/master")]);
        assert_eq!(config.credentials.credentials_id.as_deref(), Some("creds"));
        assert_eq!(config.repository_name, None);

        let written = serde_yaml::to_string(&config).unwrap();
        let reread: ScmConfig = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reread, config);
    }
}
