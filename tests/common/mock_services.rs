//! Mock services for testing
//!
//! In-memory stand-ins for the Bitbucket Server REST API. Every call is
//! recorded so tests can verify which requests were made.

use bbs_scm::domain::entities::{
    BitbucketRepository, MirroredRepository, MirroredRepositoryDescriptor,
};
use bbs_scm::infrastructure::bitbucket::{
    ApiError, ClientFactory, DirectoryChild, FilePathClient, FileType, RemoteApiClient,
};
use bbs_scm::infrastructure::credentials::Credential;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock Bitbucket server holding repositories, mirrors and files
#[derive(Default)]
pub struct MockBitbucketServer {
    /// Repositories keyed by (project name, repository name)
    repositories: Mutex<HashMap<(String, String), BitbucketRepository>>,
    /// Mirror descriptors and mirror-side details per upstream repository id
    mirrors: Mutex<HashMap<i64, Vec<(MirroredRepositoryDescriptor, MirroredRepository)>>>,
    /// File contents keyed by (ref, path)
    files: Mutex<HashMap<(String, String), Vec<u8>>>,
    /// Call history for verification
    call_history: Mutex<Vec<String>>,
    /// Whether to simulate an unreachable server
    should_error: Mutex<bool>,
}

impl MockBitbucketServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_repository(&self, project_name: &str, repository: BitbucketRepository) {
        self.repositories.lock().unwrap().insert(
            (project_name.to_string(), repository.name.clone()),
            repository,
        );
    }

    pub fn add_mirror(
        &self,
        repository_id: i64,
        descriptor: MirroredRepositoryDescriptor,
        mirrored: MirroredRepository,
    ) {
        self.mirrors
            .lock()
            .unwrap()
            .entry(repository_id)
            .or_default()
            .push((descriptor, mirrored));
    }

    pub fn add_file(&self, ref_name: &str, path: &str, content: &str) {
        self.files.lock().unwrap().insert(
            (ref_name.to_string(), path.to_string()),
            content.as_bytes().to_vec(),
        );
    }

    pub fn set_should_error(&self, should_error: bool) {
        *self.should_error.lock().unwrap() = should_error;
    }

    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.call_history.lock().unwrap().push(call);
        if *self.should_error.lock().unwrap() {
            return Err(ApiError::UnexpectedStatus {
                status: 503,
                url: "http://bitbucket.example.com".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteApiClient for MockBitbucketServer {
    fn find_repository(
        &self,
        project_name: &str,
        repository_name: &str,
    ) -> Result<BitbucketRepository, ApiError> {
        self.record(format!("find_repository:{}/{}", project_name, repository_name))?;
        self.repositories
            .lock()
            .unwrap()
            .get(&(project_name.to_string(), repository_name.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("{}/{}", project_name, repository_name)))
    }

    fn get_mirror_descriptors(
        &self,
        repository_id: i64,
    ) -> Result<Vec<MirroredRepositoryDescriptor>, ApiError> {
        self.record(format!("get_mirror_descriptors:{}", repository_id))?;
        Ok(self
            .mirrors
            .lock()
            .unwrap()
            .get(&repository_id)
            .map(|mirrors| mirrors.iter().map(|(d, _)| d.clone()).collect())
            .unwrap_or_default())
    }

    fn get_mirrored_repository(
        &self,
        descriptor: &MirroredRepositoryDescriptor,
    ) -> Result<MirroredRepository, ApiError> {
        self.record(format!("get_mirrored_repository:{}", descriptor.mirror_server.name))?;
        self.mirrors
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|(d, _)| d == descriptor)
            .map(|(_, m)| m.clone())
            .ok_or_else(|| ApiError::not_found(descriptor.mirror_server.name.clone()))
    }

    fn file_path_client(&self, project_key: &str, repository_slug: &str) -> Arc<dyn FilePathClient> {
        self.call_history
            .lock()
            .unwrap()
            .push(format!("file_path_client:{}/{}", project_key, repository_slug));
        Arc::new(MockFilePathClient {
            files: self.files.lock().unwrap().clone(),
        })
    }
}

/// File access backed by a snapshot of the mock server's files
pub struct MockFilePathClient {
    files: HashMap<(String, String), Vec<u8>>,
}

impl MockFilePathClient {
    /// Paths below `path` on `ref_name`, relative to `path`
    fn entries_below<'a>(&'a self, path: &str, ref_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };
        self.files
            .keys()
            .filter(move |(r, _)| r == ref_name)
            .filter_map(move |(_, p)| p.strip_prefix(prefix.as_str()))
    }
}

impl FilePathClient for MockFilePathClient {
    fn file_type(&self, path: &str, ref_name: &str) -> Result<FileType, ApiError> {
        if self
            .files
            .contains_key(&(ref_name.to_string(), path.to_string()))
        {
            Ok(FileType::File)
        } else if self.entries_below(path, ref_name).next().is_some() {
            Ok(FileType::Directory)
        } else {
            Ok(FileType::NonExistent)
        }
    }

    fn directory_children(&self, path: &str, ref_name: &str) -> Result<Vec<DirectoryChild>, ApiError> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };
        let mut children: Vec<DirectoryChild> = Vec::new();
        for rest in self.entries_below(path, ref_name) {
            let (name, file_type) = match rest.split_once('/') {
                Some((dir, _)) => (dir, FileType::Directory),
                None => (rest, FileType::File),
            };
            let child_path = format!("{}{}", prefix, name);
            if !children.iter().any(|c| c.path == child_path) {
                children.push(DirectoryChild {
                    path: child_path,
                    file_type,
                });
            }
        }
        Ok(children)
    }

    fn raw_content(&self, path: &str, ref_name: &str) -> Result<Vec<u8>, ApiError> {
        self.files
            .get(&(ref_name.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::not_found(path))
    }
}

/// Client factory handing out the same mock server for every base URL
pub struct MockClientFactory {
    server: Arc<MockBitbucketServer>,
    requests: Mutex<Vec<(String, Option<Credential>)>>,
}

impl MockClientFactory {
    pub fn new(server: Arc<MockBitbucketServer>) -> Arc<Self> {
        Arc::new(Self {
            server,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Base URLs and credentials clients were requested with
    pub fn requests(&self) -> Vec<(String, Option<Credential>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl ClientFactory for MockClientFactory {
    fn client(
        &self,
        base_url: &str,
        credentials: Option<&Credential>,
    ) -> Result<Arc<dyn RemoteApiClient>, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push((base_url.to_string(), credentials.cloned()));
        Ok(self.server.clone())
    }
}
