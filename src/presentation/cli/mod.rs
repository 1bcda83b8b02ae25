pub mod commands;
pub mod context;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::exit;

use crate::domain::entities::{CredentialIds, ScmConfig};
use crate::domain::value_objects::BranchSpec;
use context::AppContext;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
}

/// bbscm - Resolve and browse Bitbucket Server repositories
#[derive(Parser)]
#[command(name = "bbscm")]
#[command(about = "Resolve, browse and check out Bitbucket Server repositories")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    " for ",
    env!("BUILD_TARGET"),
    ")"
))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file
    #[arg(short, long, global = true, env = "BBSCM_CONFIG", default_value = "bbscm.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Repository names as they are persisted in a job configuration
#[derive(Debug, Clone, Args)]
pub struct RepositoryArgs {
    /// Id of the configured Bitbucket server
    #[arg(short, long)]
    pub server: String,

    /// Project name (or key, for personal projects)
    #[arg(short, long)]
    pub project: String,

    /// Repository name
    #[arg(short, long)]
    pub repository: String,

    /// Mirror to clone from instead of the upstream server
    #[arg(short, long)]
    pub mirror: Option<String>,

    /// HTTP credentials id
    #[arg(long)]
    pub credentials: Option<String>,

    /// SSH credentials id; selects the SSH clone URL
    #[arg(long)]
    pub ssh_credentials: Option<String>,
}

impl RepositoryArgs {
    pub fn to_config(&self, branches: &[String]) -> ScmConfig {
        let mut config = ScmConfig::new(&self.server, &self.project, &self.repository)
            .with_branches(branches.iter().map(|b| BranchSpec::new(b.as_str())))
            .with_credentials(CredentialIds::new(
                self.credentials.clone(),
                self.ssh_credentials.clone(),
            ));
        if let Some(mirror) = &self.mirror {
            config = config.with_mirror(mirror);
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a repository to its clone URL
    Resolve {
        #[command(flatten)]
        repository: RepositoryArgs,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List the mirrors currently serving a repository
    Mirrors {
        #[command(flatten)]
        repository: RepositoryArgs,
    },

    /// List a directory at a ref without cloning
    Ls {
        #[command(flatten)]
        repository: RepositoryArgs,

        /// Fully-qualified ref, e.g. refs/heads/master
        #[arg(long = "ref")]
        ref_name: String,

        /// Directory path (defaults to the repository root)
        #[arg(default_value = "")]
        path: String,
    },

    /// Print a file at a ref without cloning
    Cat {
        #[command(flatten)]
        repository: RepositoryArgs,

        /// Fully-qualified ref, e.g. refs/heads/master
        #[arg(long = "ref")]
        ref_name: String,

        /// File path
        path: String,
    },

    /// Full checkout with git
    Checkout {
        #[command(flatten)]
        repository: RepositoryArgs,

        /// Branch specifications (defaults to every branch)
        #[arg(short, long)]
        branch: Vec<String>,

        /// Target directory (defaults to the repository slug)
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Write the changelog since this commit
        #[arg(long)]
        since: Option<String>,

        /// Changelog output file
        #[arg(long)]
        changelog: Option<PathBuf>,

        /// Fetch only the most recent commit
        #[arg(long)]
        shallow: bool,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn verbose(&self) -> bool {
        self.cli.verbose
    }

    /// Run the command. Runs outside of any async runtime; commands that
    /// need one create it themselves.
    pub fn run(self) -> Result<()> {
        colored::control::set_override(!self.cli.no_color);

        match self.handle_command() {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    fn handle_command(&self) -> Result<()> {
        let context = AppContext::load(&self.cli.config)?;

        match &self.cli.command {
            Commands::Resolve { repository, output } => {
                commands::resolve::ResolveCommand::new(repository.clone(), *output)
                    .execute(&context)
            }
            Commands::Mirrors { repository } => {
                commands::mirrors::MirrorsCommand::new(repository.clone()).execute(&context)
            }
            Commands::Ls {
                repository,
                ref_name,
                path,
            } => commands::browse::ListCommand::new(repository.clone(), ref_name, path)
                .execute(&context),
            Commands::Cat {
                repository,
                ref_name,
                path,
            } => commands::browse::CatCommand::new(repository.clone(), ref_name, path)
                .execute(&context),
            Commands::Checkout {
                repository,
                branch,
                directory,
                since,
                changelog,
                shallow,
            } => commands::checkout::CheckoutCommand {
                repository: repository.clone(),
                branches: branch.clone(),
                directory: directory.clone(),
                since: since.clone(),
                changelog: changelog.clone(),
                shallow: *shallow,
                verbose: self.cli.verbose,
            }
            .execute(&context),
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}
