//! Blocking HTTP implementation of the Bitbucket REST client.

use super::client::{ClientFactory, DirectoryChild, FilePathClient, FileType, RemoteApiClient};
use super::error::ApiError;
use crate::domain::entities::{
    BitbucketPage, BitbucketRepository, MirroredRepository, MirroredRepositoryDescriptor,
};
use crate::infrastructure::credentials::Credential;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const API_PREFIX: [&str; 3] = ["rest", "api", "1.0"];
const MIRRORING_PREFIX: [&str; 3] = ["rest", "mirroring", "1.0"];
const PAGE_LIMIT: u32 = 100;

#[derive(Clone)]
enum Auth {
    Anonymous,
    Bearer(String),
    Basic { username: String, password: String },
}

impl Auth {
    fn from_credentials(credentials: Option<&Credential>) -> Self {
        match credentials {
            Some(Credential::Token { secret }) => Auth::Bearer(secret.clone()),
            Some(Credential::UsernamePassword { username, password }) => Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            Some(Credential::SshKey { .. }) | None => Auth::Anonymous,
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Anonymous => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

/// Builds [`HttpRemoteApiClient`]s that share one connection pool.
pub struct HttpClientFactory {
    http: Client,
}

impl HttpClientFactory {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bbs-scm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

impl ClientFactory for HttpClientFactory {
    fn client(
        &self,
        base_url: &str,
        credentials: Option<&Credential>,
    ) -> Result<Arc<dyn RemoteApiClient>, ApiError> {
        let client = HttpRemoteApiClient::new(self.http.clone(), base_url, credentials)?;
        Ok(Arc::new(client))
    }
}

#[derive(Clone)]
struct Transport {
    http: Client,
    base_url: Url,
    auth: Auth,
}

impl Transport {
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::invalid_url(self.base_url.as_str()))?
            .pop_if_empty()
            .extend(segments.iter().filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn send(&self, url: &Url) -> Result<Response, ApiError> {
        debug!("GET {}", url);
        let response = self
            .auth
            .apply(self.http.get(url.clone()))
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), url.as_str()));
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        self.send(url)?
            .json::<T>()
            .map_err(|e| ApiError::decode(url.as_str(), e.to_string()))
    }

    fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        self.send(url)?
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })
    }

    /// Follow `nextPageStart` until the last page.
    fn get_all_pages<T: DeserializeOwned>(&self, url: &Url) -> Result<Vec<T>, ApiError> {
        let mut values = Vec::new();
        let mut start = 0;
        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("start", &start.to_string())
                .append_pair("limit", &PAGE_LIMIT.to_string());
            let page: BitbucketPage<T> = self.get_json(&page_url)?;
            let next = next_page_start(&page_url, start, &page)?;
            values.extend(page.values);
            match next {
                Some(next) => start = next,
                None => return Ok(values),
            }
        }
    }
}

/// Start of the page after `page`, or `None` on the last page. A server that
/// does not move past `start` would otherwise be polled forever.
fn next_page_start<T>(
    url: &Url,
    start: u32,
    page: &BitbucketPage<T>,
) -> Result<Option<u32>, ApiError> {
    match page.next_page_start {
        Some(next) if !page.is_last_page && next <= start => Err(ApiError::decode(
            url.as_str(),
            format!("nextPageStart {} does not advance past {}", next, start),
        )),
        Some(next) if !page.is_last_page => Ok(Some(next)),
        _ => Ok(None),
    }
}

/// [`RemoteApiClient`] backed by `reqwest`'s blocking client.
pub struct HttpRemoteApiClient {
    transport: Transport,
}

impl HttpRemoteApiClient {
    pub fn new(
        http: Client,
        base_url: &str,
        credentials: Option<&Credential>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|_| ApiError::invalid_url(base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::invalid_url(base_url.as_str()));
        }
        Ok(Self {
            transport: Transport {
                http,
                base_url,
                auth: Auth::from_credentials(credentials),
            },
        })
    }

    fn api(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut all: Vec<&str> = API_PREFIX.to_vec();
        all.extend_from_slice(segments);
        self.transport.endpoint(&all)
    }
}

impl RemoteApiClient for HttpRemoteApiClient {
    fn find_repository(
        &self,
        project_name: &str,
        repository_name: &str,
    ) -> Result<BitbucketRepository, ApiError> {
        let mut url = self.api(&["repos"])?;
        url.query_pairs_mut()
            .append_pair("projectname", project_name)
            .append_pair("name", repository_name);

        let candidates: Vec<BitbucketRepository> = self.transport.get_all_pages(&url)?;
        candidates
            .into_iter()
            .find(|repository| {
                repository.name.eq_ignore_ascii_case(repository_name)
                    && (repository.project.name.eq_ignore_ascii_case(project_name)
                        || repository.project.key.eq_ignore_ascii_case(project_name))
            })
            .ok_or_else(|| ApiError::not_found(url.as_str()))
    }

    fn get_mirror_descriptors(
        &self,
        repository_id: i64,
    ) -> Result<Vec<MirroredRepositoryDescriptor>, ApiError> {
        let id = repository_id.to_string();
        let mut segments: Vec<&str> = MIRRORING_PREFIX.to_vec();
        segments.extend(["repos", id.as_str(), "mirrors"]);
        let url = self.transport.endpoint(&segments)?;
        self.transport.get_all_pages(&url)
    }

    fn get_mirrored_repository(
        &self,
        descriptor: &MirroredRepositoryDescriptor,
    ) -> Result<MirroredRepository, ApiError> {
        let href = descriptor
            .self_link()
            .ok_or_else(|| ApiError::invalid_url(format!("mirror {}", descriptor.mirror_server.name)))?;
        let url = Url::parse(href).map_err(|_| ApiError::invalid_url(href))?;
        self.transport.get_json(&url)
    }

    fn file_path_client(&self, project_key: &str, repository_slug: &str) -> Arc<dyn FilePathClient> {
        Arc::new(HttpFilePathClient {
            transport: self.transport.clone(),
            project_key: project_key.to_string(),
            repository_slug: repository_slug.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct BrowsePath {
    #[serde(rename = "toString")]
    to_string: String,
}

#[derive(Deserialize)]
struct BrowseChild {
    path: BrowsePath,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct BrowseResponse {
    #[serde(default)]
    children: Option<BitbucketPage<BrowseChild>>,
    #[serde(default)]
    lines: Option<Vec<serde_json::Value>>,
}

/// [`FilePathClient`] over the `browse` and `raw` REST resources.
pub struct HttpFilePathClient {
    transport: Transport,
    project_key: String,
    repository_slug: String,
}

impl HttpFilePathClient {
    fn resource(&self, resource: &str, path: &str, ref_name: &str) -> Result<Url, ApiError> {
        let mut segments: Vec<&str> = API_PREFIX.to_vec();
        segments.extend([
            "projects",
            self.project_key.as_str(),
            "repos",
            self.repository_slug.as_str(),
            resource,
        ]);
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.transport.endpoint(&segments)?;
        url.query_pairs_mut().append_pair("at", ref_name);
        Ok(url)
    }
}

fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

impl FilePathClient for HttpFilePathClient {
    fn file_type(&self, path: &str, ref_name: &str) -> Result<FileType, ApiError> {
        let mut url = self.resource("browse", path, ref_name)?;
        url.query_pairs_mut().append_pair("limit", "1");
        match self.transport.get_json::<BrowseResponse>(&url) {
            Ok(BrowseResponse {
                children: Some(_), ..
            }) => Ok(FileType::Directory),
            Ok(BrowseResponse { lines: Some(_), .. }) => Ok(FileType::File),
            Ok(_) => Err(ApiError::decode(url.as_str(), "neither children nor lines")),
            Err(e) if e.is_not_found() => Ok(FileType::NonExistent),
            Err(e) => Err(e),
        }
    }

    fn directory_children(&self, path: &str, ref_name: &str) -> Result<Vec<DirectoryChild>, ApiError> {
        let url = self.resource("browse", path, ref_name)?;
        let mut children = Vec::new();
        let mut start = 0;
        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("start", &start.to_string())
                .append_pair("limit", &PAGE_LIMIT.to_string());
            let response: BrowseResponse = self.transport.get_json(&page_url)?;
            let page = response
                .children
                .ok_or_else(|| ApiError::decode(page_url.as_str(), "path is not a directory"))?;
            let next = next_page_start(&page_url, start, &page)?;

            children.extend(page.values.into_iter().filter_map(|child| {
                let file_type = match child.kind.as_str() {
                    "FILE" => FileType::File,
                    "DIRECTORY" => FileType::Directory,
                    // submodules cannot be browsed within this repository
                    _ => return None,
                };
                Some(DirectoryChild {
                    path: join_path(path, &child.path.to_string),
                    file_type,
                })
            }));

            match next {
                Some(next) => start = next,
                None => return Ok(children),
            }
        }
    }

    fn raw_content(&self, path: &str, ref_name: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.resource("raw", path, ref_name)?;
        self.transport.get_bytes(&url)
    }
}
