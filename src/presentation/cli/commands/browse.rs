use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;

use crate::application::filesystem::{FileNode, FilesystemView};
use crate::infrastructure::bitbucket::FileType;
use crate::presentation::cli::context::AppContext;
use crate::presentation::cli::RepositoryArgs;

/// Build a lightweight view of the ref, failing with the reason it is unavailable
fn open_view(context: &AppContext, repository: &RepositoryArgs, ref_name: &str) -> Result<FilesystemView> {
    let scm = context
        .scm_factory()
        .build(&repository.to_config(&[ref_name.to_string()]));
    if let Some(reason) = scm.resolution().placeholder_reason() {
        anyhow::bail!("Repository is not available: {}", reason);
    }

    let provider = context.filesystem_provider();
    if !provider.supports_scm(&scm) {
        anyhow::bail!("'{}' does not name a single branch or tag", ref_name);
    }
    provider
        .build_for_scm(&scm, None)
        .ok_or_else(|| anyhow::anyhow!("Lightweight checkout is not available for this repository"))
}

fn resolve_node(view: &FilesystemView, path: &str) -> FileNode {
    let root = view.root();
    if path.trim_matches('/').is_empty() {
        root
    } else {
        root.child(path)
    }
}

/// Handler for the ls command
pub struct ListCommand {
    pub repository: RepositoryArgs,
    pub ref_name: String,
    pub path: String,
}

impl ListCommand {
    pub fn new(repository: RepositoryArgs, ref_name: &str, path: &str) -> Self {
        Self {
            repository,
            ref_name: ref_name.to_string(),
            path: path.to_string(),
        }
    }

    pub fn execute(&self, context: &AppContext) -> Result<()> {
        let view = open_view(context, &self.repository, &self.ref_name)?;
        let node = resolve_node(&view, &self.path);

        let mut children = node
            .children()
            .with_context(|| format!("Failed to list '{}' at {}", self.path, view.ref_name()))?;
        children.sort_by(|a, b| a.path().cmp(b.path()));

        for child in children {
            match child.kind() {
                Ok(FileType::Directory) => println!("{}/", child.name().blue().bold()),
                Ok(_) => println!("{}", child.name()),
                Err(e) => println!("{} ({})", child.name(), e.to_string().red()),
            }
        }
        Ok(())
    }
}

/// Handler for the cat command
pub struct CatCommand {
    pub repository: RepositoryArgs,
    pub ref_name: String,
    pub path: String,
}

impl CatCommand {
    pub fn new(repository: RepositoryArgs, ref_name: &str, path: &str) -> Self {
        Self {
            repository,
            ref_name: ref_name.to_string(),
            path: path.to_string(),
        }
    }

    pub fn execute(&self, context: &AppContext) -> Result<()> {
        let view = open_view(context, &self.repository, &self.ref_name)?;
        let node = resolve_node(&view, &self.path);

        if !node.is_file()? {
            anyhow::bail!("'{}' is not a file at {}", self.path, view.ref_name());
        }
        let content = node
            .content()
            .with_context(|| format!("Failed to read '{}' at {}", self.path, view.ref_name()))?;
        std::io::stdout().write_all(&content)?;
        Ok(())
    }
}
