use super::scm_interface::{
    BuildContext, BuiltRevision, ChangeLogEntry, ChangeLogParser, EngineConfig, PollingResult,
    RemoteConfig, RevisionState, ScmError, VcsEngine,
};
use crate::domain::value_objects::{BranchSpec, BranchSpecKind, ScmExtension, R_HEADS};
use crate::infrastructure::credentials::{Credential, CredentialResolver};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

const FIELD_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';
const CHANGELOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%at%x1f%s%x1e";

/// How git authenticates against one remote
#[derive(Debug, Default)]
struct GitAuth {
    url: String,
    config_args: Vec<String>,
    env: Vec<(String, String)>,
}

/// Full checkout engine driving the git command line
pub struct GitScm {
    git_executable: String,
    config: EngineConfig,
    credentials: Arc<dyn CredentialResolver>,
}

impl GitScm {
    /// Create a git engine for the given configuration
    pub fn new(config: EngineConfig, credentials: Arc<dyn CredentialResolver>) -> Self {
        let git_executable = config
            .git_tool
            .clone()
            .filter(|tool| !tool.trim().is_empty())
            .unwrap_or_else(|| "git".to_string());
        Self {
            git_executable,
            config,
            credentials,
        }
    }

    /// Override the git executable
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.git_executable = executable.into();
        self
    }

    /// Check if git executable is available
    pub async fn check_availability(&self) -> Result<(), ScmError> {
        let output = Command::new(&self.git_executable)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|_| ScmError::executable_not_found(&self.git_executable))?;

        if !output.status.success() {
            return Err(ScmError::executable_not_found(&self.git_executable));
        }

        Ok(())
    }

    fn remote(&self) -> Result<&RemoteConfig, ScmError> {
        let remote = self.config.primary_remote().ok_or(ScmError::NoRemote)?;
        if remote.url.trim().is_empty() {
            return Err(ScmError::InvalidRemote {
                url: remote.url.clone(),
            });
        }
        Ok(remote)
    }

    fn auth(&self, remote: &RemoteConfig) -> Result<GitAuth, ScmError> {
        let mut auth = GitAuth {
            url: remote.url.clone(),
            ..GitAuth::default()
        };
        let Some(credentials_id) = remote.credentials_id.as_deref() else {
            return Ok(auth);
        };
        let credential =
            self.credentials
                .resolve(credentials_id)
                .ok_or_else(|| ScmError::CredentialsNotFound {
                    credentials_id: credentials_id.to_string(),
                })?;

        match credential {
            Credential::Token { secret } => {
                auth.config_args.push("-c".to_string());
                auth.config_args
                    .push(format!("http.extraHeader=Authorization: Bearer {}", secret));
            }
            Credential::UsernamePassword { username, password } => {
                let mut url = Url::parse(&remote.url).map_err(|_| ScmError::InvalidRemote {
                    url: remote.url.clone(),
                })?;
                url.set_username(&username)
                    .and_then(|_| url.set_password(Some(&password)))
                    .map_err(|_| ScmError::InvalidRemote {
                        url: remote.url.clone(),
                    })?;
                auth.url = url.to_string();
            }
            Credential::SshKey {
                private_key_path, ..
            } => {
                auth.env.push((
                    "GIT_SSH_COMMAND".to_string(),
                    format!(
                        "ssh -i \"{}\" -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
                        private_key_path.display()
                    ),
                ));
            }
        }
        Ok(auth)
    }

    /// Execute a git command in the given directory
    async fn execute_git_command(
        &self,
        args: &[String],
        working_dir: Option<&Path>,
        auth: Option<&GitAuth>,
    ) -> Result<std::process::Output, ScmError> {
        let mut cmd = Command::new(&self.git_executable);
        if let Some(auth) = auth {
            cmd.args(&auth.config_args);
            cmd.envs(auth.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScmError::executable_not_found(&self.git_executable)
            } else {
                ScmError::from(e)
            }
        })?;
        Ok(output)
    }

    /// Execute a git command and check for success
    async fn execute_git_command_checked(
        &self,
        args: &[String],
        working_dir: Option<&Path>,
        auth: Option<&GitAuth>,
    ) -> Result<String, ScmError> {
        let output = self.execute_git_command(args, working_dir, auth).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // The first argument after auth is the subcommand; the URL may carry secrets.
            let command = format!(
                "{} {}",
                self.git_executable,
                args.first().map(String::as_str).unwrap_or_default()
            );
            return Err(ScmError::command_failed(
                command,
                output.status.code().unwrap_or(-1),
                stderr,
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn target_dir(&self, workspace: &Path) -> PathBuf {
        self.config
            .extensions
            .iter()
            .find_map(|ext| match ext {
                ScmExtension::RelativeTargetDirectory { path } => Some(workspace.join(path)),
                _ => None,
            })
            .unwrap_or_else(|| workspace.to_path_buf())
    }

    fn fetch_args(&self, remote: &RemoteConfig, auth: &GitAuth) -> Vec<String> {
        let mut args = vec!["fetch".to_string(), "--prune".to_string()];
        let mut fetch_tags = true;
        for ext in &self.config.extensions {
            if let ScmExtension::CloneOption {
                shallow,
                depth,
                no_tags,
            } = ext
            {
                if *shallow {
                    args.push("--depth".to_string());
                    args.push(depth.unwrap_or(1).max(1).to_string());
                }
                if *no_tags {
                    fetch_tags = false;
                }
            }
        }
        args.push(if fetch_tags { "--tags" } else { "--no-tags" }.to_string());
        args.push(auth.url.clone());
        args.push(format!("+refs/heads/*:refs/remotes/{}/*", remote.name));
        args
    }

    /// Fetched refs, with remote-tracking refs mapped back to `refs/heads/`
    async fn local_candidates(
        &self,
        dir: &Path,
        remote: &RemoteConfig,
    ) -> Result<Vec<String>, ScmError> {
        let tracking_prefix = format!("refs/remotes/{}/", remote.name);
        let args = vec![
            "for-each-ref".to_string(),
            "--format=%(refname)".to_string(),
            tracking_prefix.clone(),
            "refs/tags/".to_string(),
        ];
        let listing = self.execute_git_command_checked(&args, Some(dir), None).await?;
        Ok(listing
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() || line.ends_with("/HEAD") {
                    return None;
                }
                Some(match line.strip_prefix(tracking_prefix.as_str()) {
                    Some(short) => format!("{}{}", R_HEADS, short),
                    None => line.to_string(),
                })
            })
            .collect())
    }

    fn local_ref(&self, ref_name: &str, remote: &RemoteConfig) -> String {
        match ref_name.strip_prefix(R_HEADS) {
            Some(short) => format!("refs/remotes/{}/{}", remote.name, short),
            None => ref_name.to_string(),
        }
    }

    async fn write_changelog(
        &self,
        dir: &Path,
        changelog_file: &Path,
        revision: &BuiltRevision,
        baseline: Option<&RevisionState>,
    ) -> Result<(), ScmError> {
        let previous = baseline
            .and_then(|state| state.heads.get(&revision.ref_name))
            .filter(|sha1| **sha1 != revision.sha1);

        let log = match previous {
            Some(previous) => {
                let args = vec![
                    "log".to_string(),
                    CHANGELOG_FORMAT.to_string(),
                    format!("{}..{}", previous, revision.sha1),
                ];
                self.execute_git_command_checked(&args, Some(dir), None)
                    .await?
            }
            None => String::new(),
        };
        tokio::fs::write(changelog_file, log).await?;
        Ok(())
    }
}

/// Pick the ref to build: specs are tried in order, candidates in sorted order.
fn select_ref<'a>(
    specs: &[BranchSpec],
    candidates: &'a [String],
    remote_name: &str,
) -> Option<&'a String> {
    let mut sorted: Vec<&String> = candidates.iter().collect();
    sorted.sort();
    specs.iter().find_map(|spec| {
        sorted
            .iter()
            .copied()
            .find(|candidate| spec.matches(candidate, remote_name))
    })
}

/// Parse `git ls-remote` output into ref -> commit, preferring peeled tags.
fn parse_ls_remote(output: &str) -> HashMap<String, String> {
    let mut heads = HashMap::new();
    let mut peeled = HashMap::new();
    for line in output.lines() {
        let Some((sha1, ref_name)) = line.trim().split_once('\t') else {
            continue;
        };
        match ref_name.strip_suffix("^{}") {
            Some(tag) => {
                peeled.insert(tag.to_string(), sha1.to_string());
            }
            None => {
                heads.insert(ref_name.to_string(), sha1.to_string());
            }
        }
    }
    heads.extend(peeled);
    heads
}

#[async_trait]
impl VcsEngine for GitScm {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn checkout(
        &self,
        build: &BuildContext,
        changelog_file: Option<&Path>,
        baseline: Option<&RevisionState>,
    ) -> Result<BuiltRevision, ScmError> {
        let remote = self.remote()?;
        let auth = self.auth(remote)?;
        self.check_availability().await?;
        let dir = self.target_dir(&build.workspace);
        tokio::fs::create_dir_all(&dir).await?;

        if !dir.join(".git").exists() {
            debug!("Initialising repository in {}", dir.display());
            self.execute_git_command_checked(&["init".to_string()], Some(&dir), None)
                .await?;
        }

        if self
            .config
            .extensions
            .contains(&ScmExtension::CleanBeforeCheckout)
        {
            self.execute_git_command_checked(
                &["clean".to_string(), "-fdx".to_string()],
                Some(&dir),
                None,
            )
            .await?;
        }

        info!("Fetching {} into {}", remote.url, dir.display());
        self.execute_git_command_checked(&self.fetch_args(remote, &auth), Some(&dir), Some(&auth))
            .await
            .map_err(|e| ScmError::checkout_failed(format!("Fetch failed: {}", e)))?;

        let commit_spec = self
            .config
            .branches
            .iter()
            .find(|spec| spec.kind() == BranchSpecKind::CommitHash);
        let (ref_name, rev) = match commit_spec {
            Some(spec) => (spec.name().to_string(), spec.name().to_string()),
            None => {
                let candidates = self.local_candidates(&dir, remote).await?;
                let ref_name = select_ref(&self.config.branches, &candidates, &remote.name)
                    .ok_or_else(|| ScmError::NoMatchingRevision {
                        specs: self
                            .config
                            .branches
                            .iter()
                            .map(BranchSpec::name)
                            .collect::<Vec<_>>()
                            .join(", "),
                    })?
                    .clone();
                let rev = self.local_ref(&ref_name, remote);
                (ref_name, rev)
            }
        };

        let sha1 = self
            .execute_git_command_checked(
                &[
                    "rev-parse".to_string(),
                    "--verify".to_string(),
                    format!("{}^{{commit}}", rev),
                ],
                Some(&dir),
                None,
            )
            .await?;

        let local_branch = self.config.extensions.iter().find_map(|ext| match ext {
            ScmExtension::LocalBranch { name } => Some(
                name.clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| {
                        ref_name
                            .strip_prefix(R_HEADS)
                            .unwrap_or(&ref_name)
                            .to_string()
                    }),
            ),
            _ => None,
        });
        let checkout_args = match local_branch {
            Some(branch) => vec![
                "checkout".to_string(),
                "-f".to_string(),
                "-B".to_string(),
                branch,
                sha1.clone(),
            ],
            None => vec![
                "checkout".to_string(),
                "-f".to_string(),
                "--detach".to_string(),
                sha1.clone(),
            ],
        };
        self.execute_git_command_checked(&checkout_args, Some(&dir), None)
            .await
            .map_err(|e| ScmError::checkout_failed(format!("Checkout of {} failed: {}", sha1, e)))?;

        let revision = BuiltRevision { sha1, ref_name };
        info!("Checked out {} ({})", revision.ref_name, revision.sha1);

        if let Some(changelog_file) = changelog_file {
            self.write_changelog(&dir, changelog_file, &revision, baseline)
                .await?;
        }

        Ok(revision)
    }

    async fn calc_revisions_from_build(
        &self,
        build: &BuildContext,
    ) -> Result<Option<RevisionState>, ScmError> {
        Ok(build
            .revision
            .as_ref()
            .map(|revision| RevisionState::single(&revision.ref_name, &revision.sha1)))
    }

    async fn compare_remote_revision_with(
        &self,
        baseline: &RevisionState,
    ) -> Result<PollingResult, ScmError> {
        if baseline.is_empty() {
            return Ok(PollingResult::BuildNow);
        }
        let remote = self.remote()?;
        let auth = self.auth(remote)?;
        let args = vec![
            "ls-remote".to_string(),
            "--heads".to_string(),
            "--tags".to_string(),
            auth.url.clone(),
        ];
        let listing = self
            .execute_git_command_checked(&args, None, Some(&auth))
            .await?;

        let changed = parse_ls_remote(&listing)
            .into_iter()
            .filter(|(ref_name, _)| {
                self.config
                    .branches
                    .iter()
                    .any(|spec| spec.matches(ref_name, &remote.name))
            })
            .any(|(ref_name, sha1)| baseline.heads.get(&ref_name) != Some(&sha1));

        Ok(if changed {
            PollingResult::Significant
        } else {
            PollingResult::NoChanges
        })
    }

    fn build_environment(&self, build: &BuildContext, env: &mut HashMap<String, String>) {
        if let Some(remote) = self.config.primary_remote() {
            env.insert("GIT_URL".to_string(), remote.url.clone());
            if let Some(revision) = &build.revision {
                let branch = match revision.ref_name.strip_prefix(R_HEADS) {
                    Some(short) => format!("{}/{}", remote.name, short),
                    None => revision.ref_name.clone(),
                };
                env.insert("GIT_BRANCH".to_string(), branch);
            }
        }
        if let Some(revision) = &build.revision {
            env.insert("GIT_COMMIT".to_string(), revision.sha1.clone());
        }
        if let Some(previous) = &build.previous_revision {
            env.insert("GIT_PREVIOUS_COMMIT".to_string(), previous.sha1.clone());
        }
    }

    fn changelog_parser(&self) -> Box<dyn ChangeLogParser> {
        Box::new(GitChangeLogParser)
    }
}

/// Reads changelogs written by [`GitScm::checkout`]
#[derive(Debug, Default, Clone, Copy)]
pub struct GitChangeLogParser;

impl GitChangeLogParser {
    fn parse_record(record: &str) -> Result<ChangeLogEntry, ScmError> {
        let malformed = || ScmError::MalformedChangeLog {
            line: record.to_string(),
        };
        let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
        let &[commit, author, email, timestamp, message] = fields.as_slice() else {
            return Err(malformed());
        };
        let seconds: i64 = timestamp.parse().map_err(|_| malformed())?;
        let timestamp = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(malformed)?;
        Ok(ChangeLogEntry {
            commit: commit.to_string(),
            author: author.to_string(),
            email: email.to_string(),
            timestamp,
            message: message.to_string(),
        })
    }
}

impl ChangeLogParser for GitChangeLogParser {
    fn parse(&self, changelog_file: &Path) -> Result<Vec<ChangeLogEntry>, ScmError> {
        let content = std::fs::read_to_string(changelog_file)?;
        content
            .split(RECORD_SEPARATOR)
            .map(str::trim)
            .filter(|record| !record.is_empty())
            .map(Self::parse_record)
            .collect()
    }
}
