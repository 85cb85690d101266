//! External version-control integration
//!
//! The repository is driven through an external program (git by default)
//! rather than a linked library. `VcsRunner` is the seam: `GitCli` spawns the
//! real binary, tests substitute a recording runner.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of one VCS invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VcsOutput {
    /// Whether the program exited successfully
    pub success: bool,
    /// Combined stdout and stderr
    pub output: String,
}

impl VcsOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Runs a version-control command in a working directory
///
/// An `Err` means the program could not be run at all; a non-zero exit is
/// reported through `VcsOutput::success`.
#[async_trait]
pub trait VcsRunner: Send + Sync {
    async fn run(&self, working_dir: &Path, args: &[String]) -> Result<VcsOutput>;
}

/// Spawns an external VCS binary
#[derive(Clone, Debug)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl VcsRunner for GitCli {
    async fn run(&self, working_dir: &Path, args: &[String]) -> Result<VcsOutput> {
        tracing::debug!(
            program = %self.program,
            ?args,
            dir = %working_dir.display(),
            "running vcs command"
        );

        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .current_dir(working_dir)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run '{}'", self.program))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        Ok(VcsOutput {
            success: output.status.success(),
            output: text,
        })
    }
}

/// High-level repository operations over a `VcsRunner`
#[derive(Clone)]
pub struct VcsRepository {
    runner: Arc<dyn VcsRunner>,
    working_dir: PathBuf,
}

impl VcsRepository {
    pub fn new(runner: Arc<dyn VcsRunner>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            working_dir: working_dir.into(),
        }
    }

    /// Repository driven by the given program (e.g. `git`)
    pub fn with_program(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(GitCli::new(program)), working_dir)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Run a raw command
    pub async fn exec(&self, args: &[&str]) -> Result<VcsOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(&self.working_dir, &args).await
    }

    /// Run a command and fail with its output if it exits unsuccessfully
    async fn exec_checked(&self, args: &[&str]) -> Result<String> {
        let result = self.exec(args).await?;
        if !result.success {
            bail!("vcs {} failed: {}", args.join(" "), result.output.trim());
        }
        Ok(result.output)
    }

    /// Whether the working directory is inside a repository
    pub async fn is_repository(&self) -> Result<bool> {
        let result = self.exec(&["rev-parse", "--is-inside-work-tree"]).await?;
        Ok(result.success && result.output.trim() == "true")
    }

    /// Short machine-readable status
    pub async fn status(&self) -> Result<String> {
        self.exec_checked(&["status", "--porcelain"]).await
    }

    /// Stage every change (additions, edits and removals) under `paths`
    pub async fn add(&self, paths: &[&Path]) -> Result<()> {
        let relative: Vec<String> = paths.iter().map(|p| self.relative_arg(p)).collect();
        let mut args = vec!["add", "-A", "--"];
        args.extend(relative.iter().map(String::as_str));
        self.exec_checked(&args).await?;
        Ok(())
    }

    /// Commit staged changes; returns `false` if there was nothing to commit
    pub async fn commit(&self, message: &str) -> Result<bool> {
        let result = self.exec(&["commit", "-m", message]).await?;
        if result.success {
            return Ok(true);
        }
        if result.output.contains("nothing to commit")
            || result.output.contains("no changes added to commit")
        {
            tracing::info!("nothing to commit");
            return Ok(false);
        }
        bail!("vcs commit failed: {}", result.output.trim());
    }

    pub async fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<String> {
        let args = with_remote(vec!["push"], remote, branch);
        self.exec_checked(&args).await
    }

    pub async fn pull(&self, remote: Option<&str>, branch: Option<&str>) -> Result<String> {
        let args = with_remote(vec!["pull"], remote, branch);
        self.exec_checked(&args).await
    }

    /// Contents of `path` at `HEAD`, or `None` if it is not tracked there
    pub async fn show_at_head(&self, path: &Path) -> Result<Option<String>> {
        let object = format!("HEAD:{}", self.relative_arg(path));
        let result = self.exec(&["cat-file", "-p", &object]).await?;
        Ok(result.success.then_some(result.output))
    }

    /// Path relative to the working directory, with `/` separators
    fn relative_arg(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.working_dir).unwrap_or(path);
        let text = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if text.is_empty() { ".".to_string() } else { text }
    }
}

fn with_remote<'a>(
    mut args: Vec<&'a str>,
    remote: Option<&'a str>,
    branch: Option<&'a str>,
) -> Vec<&'a str> {
    if let Some(remote) = remote {
        args.push(remote);
        if let Some(branch) = branch {
            args.push(branch);
        }
    }
    args
}

impl std::fmt::Debug for VcsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcsRepository")
            .field("working_dir", &self.working_dir)
            .finish()
    }
}
