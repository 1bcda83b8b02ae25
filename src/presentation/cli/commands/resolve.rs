use anyhow::Result;
use colored::Colorize;

use crate::application::services::ResolveRequest;
use crate::domain::entities::ResolvedRepository;
use crate::presentation::cli::context::AppContext;
use crate::presentation::cli::{OutputFormat, RepositoryArgs};

/// Handler for the resolve command
pub struct ResolveCommand {
    pub repository: RepositoryArgs,
    pub output: OutputFormat,
}

impl ResolveCommand {
    pub fn new(repository: RepositoryArgs, output: OutputFormat) -> Self {
        Self { repository, output }
    }

    pub fn execute(&self, context: &AppContext) -> Result<()> {
        let request = ResolveRequest::from(&self.repository.to_config(&[]));
        let resolved = context.resolver().resolve(&request);

        match self.output {
            OutputFormat::Text => print_text(&resolved),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        }

        match resolved.resolution.placeholder_reason() {
            Some(reason) => Err(anyhow::anyhow!(
                "{}/{} could not be resolved: {}",
                self.repository.project,
                self.repository.repository,
                reason
            )),
            None => Ok(()),
        }
    }
}

fn print_text(resolved: &ResolvedRepository) {
    let reference = &resolved.reference;
    println!(
        "{} {}/{}",
        "Repository:".bold(),
        reference.project_key(),
        reference.repository_slug()
    );
    println!("  {:<10} {}", "name", reference.repository_name());
    println!("  {:<10} {}", "project", reference.project_name());
    if reference.is_mirrored() {
        println!("  {:<10} {}", "mirror", reference.mirror_name().cyan());
    }
    println!(
        "  {:<10} {} ({})",
        "clone",
        display_or_none(&resolved.clone_endpoint.url),
        resolved.clone_endpoint.protocol
    );
    println!("  {:<10} {}", "browse", display_or_none(&resolved.repository_url));
    match resolved.resolution.placeholder_reason() {
        Some(reason) => println!("  {:<10} {} ({})", "status", "placeholder".yellow(), reason),
        None => println!("  {:<10} {}", "status", "resolved".green()),
    }
}

fn display_or_none(value: &str) -> String {
    if value.is_empty() {
        "<none>".dimmed().to_string()
    } else {
        value.to_string()
    }
}
