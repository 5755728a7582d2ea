//! Remote lookup and fetch via the git CLI.
//!
//! Fetch stays a subprocess so it honours the user's credential helpers,
//! SSH config, and proxies exactly as `git fetch` would.

use crate::cli;
use crate::error::GitError;
use crate::gix_repo::GixRepo;

pub fn remote_exists(repo: &GixRepo, remote: &str) -> Result<bool, GitError> {
    let out = cli::output(repo, &["remote", "get-url", remote])?;
    Ok(out.status.success())
}

pub fn fetch(repo: &GixRepo, remote: &str) -> Result<(), GitError> {
    cli::run(repo, &["fetch", "--quiet", remote])?;
    Ok(())
}
