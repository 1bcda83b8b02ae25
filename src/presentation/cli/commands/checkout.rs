use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::domain::entities::ScmConfig;
use crate::domain::value_objects::ScmExtension;
use crate::infrastructure::scm::{BuildContext, RevisionState};
use crate::presentation::cli::context::AppContext;
use crate::presentation::cli::RepositoryArgs;

/// Handler for the checkout command
pub struct CheckoutCommand {
    pub repository: RepositoryArgs,
    pub branches: Vec<String>,
    pub directory: Option<PathBuf>,
    pub since: Option<String>,
    pub changelog: Option<PathBuf>,
    pub shallow: bool,
    pub verbose: bool,
}

impl CheckoutCommand {
    fn scm_config(&self) -> ScmConfig {
        let mut extensions = Vec::new();
        if self.shallow {
            extensions.push(ScmExtension::CloneOption {
                shallow: true,
                depth: Some(1),
                no_tags: true,
            });
        }
        self.repository
            .to_config(&self.branches)
            .with_extensions(extensions)
    }

    /// Changelog baseline: every literal ref of the branch specs pinned to `--since`.
    fn baseline(&self, config: &ScmConfig) -> Option<RevisionState> {
        let since = self.since.as_ref()?;
        let heads = config
            .branches
            .iter()
            .filter_map(|spec| spec.literal_ref())
            .map(|ref_name| (ref_name.to_string(), since.clone()))
            .collect();
        Some(RevisionState { heads })
    }

    pub fn execute(&self, context: &AppContext) -> Result<()> {
        let config = self.scm_config();
        let scm = context.scm_factory().build(&config);
        if let Some(reason) = scm.resolution().placeholder_reason() {
            anyhow::bail!("Repository is not available: {}", reason);
        }

        let workspace = self
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(scm.reference().repository_slug()));
        let build = BuildContext {
            number: 1,
            workspace,
            ..BuildContext::default()
        };
        let baseline = self.baseline(&config);

        println!(
            "{} {} into {}",
            "Checking out".bold(),
            scm.clone_endpoint().url,
            build.workspace.display()
        );

        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        let revision = runtime
            .block_on(scm.checkout(&build, self.changelog.as_deref(), baseline.as_ref()))
            .with_context(|| format!("Checkout into {} failed", build.workspace.display()))?;

        println!(
            "{} {} at {}",
            "✓".green(),
            revision.ref_name.cyan(),
            revision.sha1
        );

        if let Some(changelog) = &self.changelog {
            let entries = scm
                .changelog_parser()
                .parse(changelog)
                .with_context(|| format!("Failed to read changelog {}", changelog.display()))?;
            println!("{} {} change(s)", "Changelog:".bold(), entries.len());
            for entry in entries {
                let short = entry.commit.get(..8).unwrap_or(&entry.commit);
                let subject = entry.message.lines().next().unwrap_or_default();
                println!("  {} {} ({})", short.yellow(), subject, entry.author);
            }
        }

        if self.verbose {
            let build = BuildContext {
                revision: Some(revision),
                ..build
            };
            let mut env = HashMap::new();
            scm.build_environment(&build, &mut env);
            let env: BTreeMap<_, _> = env.into_iter().collect();
            for (key, value) in env {
                println!("  {}={}", key.dimmed(), value);
            }
        }
        Ok(())
    }
}
