//! Test fixtures for creating test data

use bbs_scm::domain::entities::{
    BitbucketProject, BitbucketRepository, Link, MirrorServer, MirroredRepository,
    MirroredRepositoryDescriptor, NamedLink, RepositoryLinks, RepositoryState, SelfLinks,
    ServerConfig,
};
use bbs_scm::infrastructure::credentials::{Credential, CredentialStore};
use bbs_scm::infrastructure::filesystem::PluginConfiguration;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

pub const SERVER_ID: &str = "bitbucket";
pub const BASE_URL: &str = "http://bitbucket.example.com:7990";

/// Fixtures for Bitbucket REST payloads
pub struct BitbucketFixture;

impl BitbucketFixture {
    /// `PROJECT_1/rep_1` with both clone links and a browse link
    pub fn repository() -> BitbucketRepository {
        BitbucketRepository {
            id: 1,
            name: "rep_1".to_string(),
            slug: "rep_1".to_string(),
            project: BitbucketProject::new("PROJECT_1", "Project 1"),
            state: RepositoryState::Available,
            links: RepositoryLinks {
                clone: vec![
                    NamedLink::new("http", format!("{}/scm/project_1/rep_1.git", BASE_URL)),
                    NamedLink::new("ssh", "ssh://git@bitbucket.example.com:7999/project_1/rep_1.git"),
                ],
                self_links: vec![Link {
                    href: format!("{}/projects/PROJECT_1/repos/rep_1/browse", BASE_URL),
                }],
            },
        }
    }

    pub fn mirror_descriptor(mirror_name: &str) -> MirroredRepositoryDescriptor {
        MirroredRepositoryDescriptor {
            mirror_server: MirrorServer {
                id: format!("{}-id", mirror_name),
                name: mirror_name.to_string(),
                base_url: Some(format!("http://{}.example.com", mirror_name)),
            },
            links: SelfLinks {
                self_links: vec![Link {
                    href: format!("http://{}.example.com/rest/mirroring/1.0/repos/1", mirror_name),
                }],
            },
        }
    }

    pub fn mirrored_repository(mirror_name: &str, available: bool) -> MirroredRepository {
        MirroredRepository {
            available,
            mirror_name: mirror_name.to_string(),
            repository_id: 1,
            status: None,
            links: RepositoryLinks {
                clone: vec![
                    NamedLink::new(
                        "http",
                        format!("http://{}.example.com/scm/project_1/rep_1.git", mirror_name),
                    ),
                    NamedLink::new(
                        "ssh",
                        format!("ssh://git@{}.example.com:7999/project_1/rep_1.git", mirror_name),
                    ),
                ],
                self_links: Vec::new(),
            },
        }
    }
}

/// Fixtures for plugin configuration
pub struct ConfigFixture;

impl ConfigFixture {
    pub fn server() -> ServerConfig {
        ServerConfig::new(SERVER_ID, "Bitbucket", BASE_URL).with_admin_credentials("admin")
    }

    pub fn configuration() -> PluginConfiguration {
        PluginConfiguration::new().with_server(Self::server())
    }

    pub fn credentials() -> CredentialStore {
        CredentialStore::new()
            .with_credential(
                "admin",
                Credential::UsernamePassword {
                    username: "admin".to_string(),
                    password: "admin".to_string(),
                },
            )
            .with_credential(
                "ssh",
                Credential::SshKey {
                    username: "git".to_string(),
                    private_key_path: PathBuf::from("/tmp/id_ed25519"),
                },
            )
    }

    /// Write a configuration file that points at an unreachable server
    pub fn write_config_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
http:
  timeout_secs: 1
servers:
  - id: {SERVER_ID}
    server_name: Bitbucket
    base_url: http://127.0.0.1:9
    admin_credentials_id: admin
credentials:
  - id: admin
    kind: token
    secret: not-a-real-token
"#
        )
        .unwrap();
        file
    }
}
