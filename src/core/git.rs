use crate::config::toml_config::GitConfig;
use crate::domain::model::GitStatus;
use crate::domain::ports::EventSink;
use std::path::Path;
use std::process::{Output, Stdio};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
enum GitFailure {
    #[error("git not found")]
    NotFound,

    #[error("git init failed")]
    InitFailed,

    #[error("git command timed out")]
    Timeout,

    #[error("{path} is not a directory")]
    NotADirectory { path: String },

    #[error("{what} failed: {stderr}")]
    CommandFailed { what: String, stderr: String },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

async fn run_git(dir: &Path, config: &GitConfig, args: &[&str]) -> Result<Output, GitFailure> {
    let mut cmd = Command::new("git");
    if let Some(name) = &config.author_name {
        cmd.arg("-c").arg(format!("user.name={}", name));
    }
    if let Some(email) = &config.author_email {
        cmd.arg("-c").arg(format!("user.email={}", email));
    }
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    tracing::debug!("git {} (in {})", args.join(" "), dir.display());

    match tokio::time::timeout(config.timeout(), cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(GitFailure::NotFound),
        Ok(Err(e)) => Err(GitFailure::Io(e)),
        Err(_) => Err(GitFailure::Timeout),
    }
}

/// Creates a repository in `dir` and commits everything in it.
///
/// Never fails the caller: problems are reported through `sink` as warnings
/// and reflected in the returned status.
pub async fn initialize_git(dir: &Path, config: &GitConfig, sink: &dyn EventSink) -> GitStatus {
    match try_initialize(dir, config).await {
        Ok(()) => {
            sink.log("Git repository initialized successfully");
            GitStatus::Initialized
        }
        Err(GitFailure::NotFound) => {
            sink.log("Warning: Git not found. Skipping git initialization.");
            GitStatus::Failed("git not found".to_string())
        }
        Err(GitFailure::InitFailed) => {
            sink.log("Warning: Git initialization failed (git may not be installed)");
            GitStatus::Failed("git init failed".to_string())
        }
        Err(failure) => {
            let message = failure.to_string();
            sink.log(&format!("Warning: Git initialization error: {}", message));
            GitStatus::Failed(message)
        }
    }
}

async fn try_initialize(dir: &Path, config: &GitConfig) -> Result<(), GitFailure> {
    // A missing working directory would otherwise surface as "git not found".
    if !dir.is_dir() {
        return Err(GitFailure::NotADirectory {
            path: dir.display().to_string(),
        });
    }

    let init = run_git(dir, config, &["init"]).await?;
    if !init.status.success() {
        return Err(GitFailure::InitFailed);
    }

    let add = run_git(dir, config, &["add", "."]).await?;
    if !add.status.success() {
        return Err(command_error("git add", &add));
    }

    let commit = run_git(dir, config, &["commit", "-m", &config.commit_message]).await?;
    if !commit.status.success() {
        return Err(command_error("git commit", &commit));
    }

    Ok(())
}

fn command_error(what: &str, output: &Output) -> GitFailure {
    GitFailure::CommandFailed {
        what: what.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// True when a `git` binary answers `--version`.
pub async fn git_available(config: &GitConfig) -> bool {
    let mut cmd = Command::new("git");
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    matches!(
        tokio::time::timeout(config.timeout(), cmd.status()).await,
        Ok(Ok(status)) if status.success()
    )
}
