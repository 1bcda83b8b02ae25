use crate::domain::entities::bitbucket::NamedLink;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport used for a full clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    Http,
    Ssh,
}

impl CloneProtocol {
    /// SSH when an SSH credential is configured, HTTP otherwise.
    pub fn for_credentials(ssh_credentials_id: Option<&str>) -> Self {
        match ssh_credentials_id {
            Some(id) if !id.trim().is_empty() => CloneProtocol::Ssh,
            _ => CloneProtocol::Http,
        }
    }

    /// Name of the clone link carrying this protocol's URL.
    pub fn link_name(&self) -> &'static str {
        match self {
            CloneProtocol::Http => "http",
            CloneProtocol::Ssh => "ssh",
        }
    }
}

impl fmt::Display for CloneProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.link_name())
    }
}

/// Protocol and URL used to clone a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloneEndpoint {
    pub protocol: CloneProtocol,
    pub url: String,
}

impl CloneEndpoint {
    /// Pick the clone link for the protocol implied by `ssh_credentials_id`.
    ///
    /// A missing link yields an empty URL; the checkout fails later with the
    /// engine's own diagnostics.
    pub fn select(links: &[NamedLink], ssh_credentials_id: Option<&str>) -> Self {
        let protocol = CloneProtocol::for_credentials(ssh_credentials_id);
        let url = links
            .iter()
            .find(|link| link.name == protocol.link_name())
            .map(|link| link.href.clone())
            .unwrap_or_default();
        Self { protocol, url }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<NamedLink> {
        vec![
            NamedLink::new("ssh", "ssh://git@bitbucket:7999/proj/repo.git"),
            NamedLink::new("http", "https://bitbucket/scm/proj/repo.git"),
        ]
    }

    #[test]
    fn test_ssh_credentials_select_ssh_link() {
        let endpoint = CloneEndpoint::select(&links(), Some("ssh-key"));
        assert_eq!(endpoint.protocol, CloneProtocol::Ssh);
        assert_eq!(endpoint.url, "ssh://git@bitbucket:7999/proj/repo.git");
    }

    #[test]
    fn test_no_ssh_credentials_select_http_link() {
        let endpoint = CloneEndpoint::select(&links(), None);
        assert_eq!(endpoint.protocol, CloneProtocol::Http);
        assert_eq!(endpoint.url, "https://bitbucket/scm/proj/repo.git");

        let endpoint = CloneEndpoint::select(&links(), Some("   "));
        assert_eq!(endpoint.protocol, CloneProtocol::Http);
    }

    #[test]
    fn test_missing_link_yields_empty_url() {
        let endpoint = CloneEndpoint::select(&[], Some("ssh-key"));
        assert_eq!(endpoint.url, "");
        assert!(endpoint.is_empty());

        let only_ssh = vec![NamedLink::new("ssh", "ssh://x")];
        assert!(CloneEndpoint::select(&only_ssh, None).is_empty());
    }
}
