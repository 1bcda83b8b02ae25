use anyhow::{Context, Result};
use colored::Colorize;

use crate::application::services::ResolveRequest;
use crate::presentation::cli::context::AppContext;
use crate::presentation::cli::RepositoryArgs;

/// Handler for the mirrors command
pub struct MirrorsCommand {
    pub repository: RepositoryArgs,
}

impl MirrorsCommand {
    pub fn new(repository: RepositoryArgs) -> Self {
        Self { repository }
    }

    pub fn execute(&self, context: &AppContext) -> Result<()> {
        let resolver = context.resolver();
        let server = resolver
            .server(Some(&self.repository.server))
            .ok_or_else(|| anyhow::anyhow!("Unknown server '{}'", self.repository.server))?;

        let request = ResolveRequest::from(&self.repository.to_config(&[]));
        let mirror_request = resolver.mirror_request(&server, &request);
        let mirrors = resolver
            .mirror_resolver()
            .available_mirrors(&mirror_request)
            .with_context(|| {
                format!(
                    "Failed to list mirrors of {}/{}",
                    self.repository.project, self.repository.repository
                )
            })?;

        if mirrors.is_empty() {
            println!("{}", "No mirror is currently serving this repository".yellow());
            return Ok(());
        }
        println!("{}", "Available mirrors:".bold());
        for mirror in mirrors {
            println!("  {}", mirror.cyan());
        }
        Ok(())
    }
}
