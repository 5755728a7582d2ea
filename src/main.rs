use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

mod commands;

/// Combine independent git histories into one composite commit, and split
/// composite history back into per-repository branches.
///
/// QUICK START:
///
///   git init
///   git remote add alpha <url1>
///   git remote add beta <url2>
///   git-stitch init alpha beta
///   git checkout -b mono <printed hash>
///
///   # ...commit to alpha/ and beta/ as usual...
///
///   git-stitch rip out
///   # -> branches out-alpha and out-beta, ready to push
///
/// Set GIT_STITCH_LOG=debug (or pass -vv) to trace what happens.
#[derive(Parser)]
#[command(name = "git-stitch")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(
    after_help = "See 'git-stitch <command> --help' for more information on a specific command."
)]
struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure remotes as components and create the first composite commit
    ///
    /// Needs at least two remotes. Each remote's default branch is detected
    /// from refs/remotes/<remote>/HEAD (falling back to main, then master)
    /// and stitched whole into a directory named after the remote.
    Init(commands::InitArgs),

    /// Stitch remote/branch refs into a new composite commit
    ///
    /// Prints the commit hash; no branch is moved. Configured components keep
    /// their subdirectory mappings.
    Stitch(commands::StitchArgs),

    /// Split commits since the last composite commit into one branch per
    /// component
    ///
    /// Each commit is replayed onto the branch of every component it touches,
    /// keeping its message and author. Branches are created together or not
    /// at all.
    Rip(commands::RipArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    stitch::telemetry::init(cli.verbose);

    match cli.command {
        Commands::Init(ref args) => commands::init(args),
        Commands::Stitch(ref args) => commands::stitch(args),
        Commands::Rip(ref args) => commands::rip(args),
    }
}
