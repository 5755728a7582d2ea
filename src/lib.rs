//! git-stitch library crate.
//!
//! The primary interface is the `git-stitch` binary. The library exposes the
//! composition engine so integration tests (and other tools) can stitch and
//! rip without going through the CLI.
//!
//! - [`compose`] stitches component heads into one composite commit.
//! - [`locate`] finds the composite commit a rip starts from.
//! - [`heads`] matches the base commit's parents to components.
//! - [`partition`] replays composite history onto per-component branches.
//!
//! All repository access goes through [`stitch_git::GitRepo`].

pub mod component;
pub mod compose;
pub mod error;
pub mod format;
pub mod heads;
pub mod identity;
pub mod locate;
pub mod partition;
pub mod telemetry;

pub use component::Component;
pub use compose::{STITCH_MARKER, StitchReport, stitch};
pub use error::StitchError;
pub use heads::HeadMatch;
pub use identity::CommitterPolicy;
pub use partition::{BranchStatus, RipOptions, RipReport, rip};
