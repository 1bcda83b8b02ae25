use crate::domain::entities::ScmRevision;
use crate::infrastructure::bitbucket::{ApiError, FilePathClient, FileType};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Read-only view of a repository at a single ref.
///
/// Nothing is fetched until a [`FileNode`] is asked for its kind, children
/// or content. Views are built per request and never cached.
#[derive(Clone)]
pub struct FilesystemView {
    client: Arc<dyn FilePathClient>,
    ref_name: String,
    revision: Option<ScmRevision>,
}

impl FilesystemView {
    pub(crate) fn new(
        client: Arc<dyn FilePathClient>,
        ref_name: impl Into<String>,
        revision: Option<ScmRevision>,
    ) -> Self {
        Self {
            client,
            ref_name: ref_name.into(),
            revision,
        }
    }

    /// Root directory of the repository at the bound ref
    pub fn root(&self) -> FileNode {
        FileNode {
            client: Arc::clone(&self.client),
            ref_name: self.ref_name.clone(),
            path: String::new(),
        }
    }

    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    pub fn revision(&self) -> Option<&ScmRevision> {
        self.revision.as_ref()
    }

    /// Always the Unix epoch: the REST API exposes no modification times.
    pub fn last_modified(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(UNIX_EPOCH)
    }
}

impl fmt::Debug for FilesystemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesystemView")
            .field("ref_name", &self.ref_name)
            .field("revision", &self.revision)
            .finish()
    }
}

/// A path within a [`FilesystemView`]
#[derive(Clone)]
pub struct FileNode {
    client: Arc<dyn FilePathClient>,
    ref_name: String,
    path: String,
}

impl FileNode {
    /// Path relative to the repository root; empty for the root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment; empty for the root
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn parent(&self) -> Option<FileNode> {
        if self.is_root() {
            return None;
        }
        let parent = self
            .path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .unwrap_or_default();
        Some(self.with_path(parent.to_string()))
    }

    /// Node for a relative path from this one. Nothing is fetched.
    ///
    /// `.` segments are dropped and `..` steps up one directory; stepping
    /// above the repository root stays at the root.
    pub fn child(&self, relative_path: &str) -> FileNode {
        let mut segments: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in relative_path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name),
            }
        }
        self.with_path(segments.join("/"))
    }

    pub fn kind(&self) -> Result<FileType, ApiError> {
        self.client.file_type(&self.path, &self.ref_name)
    }

    pub fn is_file(&self) -> Result<bool, ApiError> {
        Ok(self.kind()? == FileType::File)
    }

    pub fn is_directory(&self) -> Result<bool, ApiError> {
        Ok(self.kind()? == FileType::Directory)
    }

    pub fn exists(&self) -> Result<bool, ApiError> {
        Ok(self.kind()? != FileType::NonExistent)
    }

    pub fn children(&self) -> Result<Vec<FileNode>, ApiError> {
        Ok(self
            .client
            .directory_children(&self.path, &self.ref_name)?
            .into_iter()
            .map(|child| self.with_path(child.path))
            .collect())
    }

    pub fn content(&self) -> Result<Vec<u8>, ApiError> {
        self.client.raw_content(&self.path, &self.ref_name)
    }

    /// Content decoded as UTF-8, with invalid sequences replaced
    pub fn content_as_string(&self) -> Result<String, ApiError> {
        Ok(String::from_utf8_lossy(&self.content()?).into_owned())
    }

    fn with_path(&self, path: String) -> FileNode {
        FileNode {
            client: Arc::clone(&self.client),
            ref_name: self.ref_name.clone(),
            path,
        }
    }
}

impl fmt::Debug for FileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileNode")
            .field("path", &self.path)
            .field("ref_name", &self.ref_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bitbucket::client::MockFilePathClient;
    use crate::infrastructure::bitbucket::DirectoryChild;
    use pretty_assertions::assert_eq;

    fn view(client: MockFilePathClient) -> FilesystemView {
        FilesystemView::new(Arc::new(client), "refs/heads/master", None)
    }

    #[test]
    fn test_root_is_bound_to_ref() {
        let view = view(MockFilePathClient::new());
        let root = view.root();
        assert!(root.is_root());
        assert_eq!(root.path(), "");
        assert_eq!(root.name(), "");
        assert_eq!(root.ref_name(), "refs/heads/master");
        assert_eq!(view.last_modified().timestamp(), 0);
    }

    #[test]
    fn test_child_and_parent_paths() {
        let root = view(MockFilePathClient::new()).root();
        let nested = root.child("src/").child("/main/Jenkinsfile");
        assert_eq!(nested.path(), "src/main/Jenkinsfile");
        assert_eq!(nested.name(), "Jenkinsfile");
        assert_eq!(nested.parent().map(|p| p.path().to_string()), Some("src/main".to_string()));
        assert_eq!(root.child("a").parent().map(|p| p.is_root()), Some(true));
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_child_resolves_dot_segments() {
        let root = view(MockFilePathClient::new()).root();
        assert_eq!(root.child("src/./a/../main.rs").path(), "src/main.rs");
        assert_eq!(root.child("src").child("..").path(), "");
        assert!(root.child("src").child("..").is_root());
        assert_eq!(root.child("../../Jenkinsfile").path(), "Jenkinsfile");
        assert_eq!(root.child("src/main").child("../lib.rs").path(), "src/lib.rs");
        assert_eq!(root.child("./").path(), "");
    }

    #[test]
    fn test_kind_and_content_use_ref() {
        let mut client = MockFilePathClient::new();
        client
            .expect_file_type()
            .withf(|path, ref_name| path == "Jenkinsfile" && ref_name == "refs/heads/master")
            .returning(|_, _| Ok(FileType::File));
        client
            .expect_raw_content()
            .withf(|path, ref_name| path == "Jenkinsfile" && ref_name == "refs/heads/master")
            .returning(|_, _| Ok(b"pipeline {}".to_vec()));

        let file = view(client).root().child("Jenkinsfile");
        assert!(file.is_file().unwrap());
        assert!(file.exists().unwrap());
        assert_eq!(file.content_as_string().unwrap(), "pipeline {}");
    }

    #[test]
    fn test_children() {
        let mut client = MockFilePathClient::new();
        client
            .expect_directory_children()
            .withf(|path, _| path.is_empty())
            .returning(|_, _| {
                Ok(vec![
                    DirectoryChild {
                        path: "src".to_string(),
                        file_type: FileType::Directory,
                    },
                    DirectoryChild {
                        path: "README.md".to_string(),
                        file_type: FileType::File,
                    },
                ])
            });

        let children = view(client).root().children().unwrap();
        let paths: Vec<&str> = children.iter().map(FileNode::path).collect();
        assert_eq!(paths, vec!["src", "README.md"]);
        assert!(children.iter().all(|c| c.ref_name() == "refs/heads/master"));
    }

    #[test]
    fn test_missing_path() {
        let mut client = MockFilePathClient::new();
        client
            .expect_file_type()
            .returning(|_, _| Ok(FileType::NonExistent));
        assert!(!view(client).root().child("nope").exists().unwrap());
    }
}
