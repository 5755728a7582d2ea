use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::Args;
use stitch_git::{GitRepo, GixRepo};
use tracing::instrument;

use stitch::component::{self, Component};
use stitch::compose;
use stitch::format::OutputFormat;
use stitch::identity::CommitterPolicy;
use stitch::partition::{self, RipOptions};

#[derive(Args)]
pub struct InitArgs {
    /// Remotes to combine. Each becomes a top-level directory named after it.
    #[arg(required = true, num_args = 2.., value_name = "REMOTE")]
    remotes: Vec<String>,

    /// Use the remote-tracking refs already present instead of fetching.
    #[arg(long)]
    no_fetch: bool,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
pub struct StitchArgs {
    /// Refs to stitch, each in the form `remote/branch`.
    #[arg(required = true, value_name = "REF")]
    refs: Vec<String>,

    /// Use the remote-tracking refs already present instead of fetching.
    #[arg(long)]
    no_fetch: bool,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
pub struct RipArgs {
    /// Branch name prefix; branches are named `<prefix>-<component>`.
    /// Defaults to `rip-<unix seconds>`.
    prefix: Option<String>,

    /// Composite commit to start from instead of the nearest
    /// `git-stitch merge` commit.
    #[arg(long, value_name = "REV")]
    base: Option<String>,

    /// Committer of reconstructed commits: preserve or synthetic.
    /// Defaults to `stitch.committer`, then preserve.
    #[arg(long, value_name = "POLICY")]
    committer: Option<CommitterPolicy>,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

fn open_repo() -> Result<GixRepo> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    GixRepo::open(&cwd).context("Not in a git repository")
}

/// Check `remote` exists and fetch it unless `no_fetch`.
fn prepare_remote(repo: &dyn GitRepo, remote: &str, no_fetch: bool) -> Result<()> {
    if !repo.remote_exists(remote)? {
        bail!("remote '{remote}' does not exist\n  To fix: git remote add {remote} <url>");
    }
    if !no_fetch {
        eprintln!("Fetching {remote}...");
        repo.fetch(remote)
            .with_context(|| format!("Failed to fetch remote '{remote}'"))?;
    }
    Ok(())
}

/// Persist components for `remotes`, stitch them and record the result.
#[instrument(skip(args), fields(remotes = ?args.remotes, no_fetch = args.no_fetch))]
pub fn init(args: &InitArgs) -> Result<()> {
    let repo = open_repo()?;

    let mut components = Vec::with_capacity(args.remotes.len());
    for remote in &args.remotes {
        prepare_remote(&repo, remote, args.no_fetch)?;
        let branch = component::default_branch(&repo, remote)
            .with_context(|| format!("Failed to detect the default branch of '{remote}'"))?;
        components.push(Component::new(remote.as_str(), branch));
    }

    let report = compose::stitch(&repo, &components)?;
    component::save(&repo, &components)?;
    component::record_base(&repo, report.commit)?;

    print!("{}", args.format.stitch(&report)?);
    Ok(())
}

/// Stitch `remote/branch` refs into a composite commit.
#[instrument(skip(args), fields(refs = ?args.refs, no_fetch = args.no_fetch))]
pub fn stitch(args: &StitchArgs) -> Result<()> {
    let repo = open_repo()?;
    let configured = component::load(&repo)?;

    let components = args
        .refs
        .iter()
        .map(|spec| component::from_ref(spec, &configured))
        .collect::<Result<Vec<_>, _>>()?;

    let remotes: BTreeSet<&str> = components.iter().map(|c| c.remote.as_str()).collect();
    for remote in remotes {
        prepare_remote(&repo, remote, args.no_fetch)?;
    }

    let report = compose::stitch(&repo, &components)?;
    print!("{}", args.format.stitch(&report)?);
    Ok(())
}

/// Split composite history since the base into per-component branches.
#[instrument(skip(args), fields(prefix = ?args.prefix, base = ?args.base))]
pub fn rip(args: &RipArgs) -> Result<()> {
    let repo = open_repo()?;
    let committer = match args.committer {
        Some(policy) => policy,
        None => CommitterPolicy::from_config(&repo)?,
    };
    let prefix = args.prefix.clone().unwrap_or_else(default_prefix);

    let opts = RipOptions {
        prefix,
        committer,
        base: args.base.clone(),
    };
    let report = partition::rip(&repo, &opts)?;
    print!("{}", args.format.rip(&report)?);
    Ok(())
}

/// `rip-<unix seconds>`. Wall-clock time only ever reaches branch names.
fn default_prefix() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("rip-{secs}")
}
