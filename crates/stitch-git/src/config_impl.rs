//! Config read/write via the git CLI.
//!
//! Reads do not use `gix::Repository::config_snapshot`. The snapshot is taken
//! when the repository is opened and would miss values written since through
//! [`write_config`], so both directions go through the same `git config`.

use crate::cli;
use crate::error::GitError;
use crate::gix_repo::GixRepo;

pub fn read_config(repo: &GixRepo, key: &str) -> Result<Option<String>, GitError> {
    let args = ["config", "--get", key];
    let out = cli::output(repo, &args)?;
    match out.status.code() {
        Some(0) => Ok(Some(
            String::from_utf8_lossy(&out.stdout).trim_end_matches('\n').to_owned(),
        )),
        // Exit code 1 means "key not set".
        Some(1) => Ok(None),
        _ => Err(cli::failed(&args, &out)),
    }
}

pub fn write_config(repo: &GixRepo, key: &str, value: &str) -> Result<(), GitError> {
    cli::run(repo, &["config", "--local", key, value])?;
    Ok(())
}
