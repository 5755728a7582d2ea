//! `git` subprocess fallback for config and remote transport.
//!
//! gix snapshots config when the repository is opened; config reads and
//! writes both go through the CLI so they always agree.

use std::process::{Command, Output};

use crate::error::GitError;
use crate::gix_repo::GixRepo;

/// Run `git <args>` in the repository root and return the raw output.
pub(crate) fn output(repo: &GixRepo, args: &[&str]) -> Result<Output, GitError> {
    tracing::debug!(args = ?args, "running git");
    let out = Command::new("git")
        .args(args)
        .current_dir(repo.root())
        .output()?;
    Ok(out)
}

/// Run `git <args>`, failing with [`GitError::CommandFailed`] on non-zero exit.
pub(crate) fn run(repo: &GixRepo, args: &[&str]) -> Result<String, GitError> {
    let out = output(repo, args)?;
    if !out.status.success() {
        return Err(failed(args, &out));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

pub(crate) fn failed(args: &[&str], out: &Output) -> GitError {
    GitError::CommandFailed {
        command: args.join(" "),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
    }
}
