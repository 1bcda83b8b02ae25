use crate::domain::value_objects::ValidationKind;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// Connection settings for one Bitbucket Server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1, max = 255))]
    pub id: String,

    #[validate(length(min = 1, max = 255))]
    pub server_name: String,

    #[validate(url)]
    pub base_url: String,

    /// Credentials used for lookups that are not tied to a job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_credentials_id: Option<String>,
}

impl ServerConfig {
    pub fn new(
        id: impl Into<String>,
        server_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            server_name: server_name.into(),
            base_url: base_url.into(),
            admin_credentials_id: None,
        }
    }

    pub fn with_admin_credentials(mut self, credentials_id: impl Into<String>) -> Self {
        self.admin_credentials_id = Some(credentials_id.into());
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn admin_credentials_id(&self) -> Option<&str> {
        self.admin_credentials_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// `Error` for an unusable server, `Warning` when no admin credentials
    /// are configured.
    pub fn validate(&self) -> ValidationKind {
        if <Self as Validate>::validate(self).is_err() {
            return ValidationKind::Error;
        }
        match Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return ValidationKind::Error,
        }
        if self.admin_credentials_id().is_none() {
            return ValidationKind::Warning;
        }
        ValidationKind::Ok
    }
}
