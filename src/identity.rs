//! Determinism policy: every identity and timestamp written by this tool is a
//! pure function of the commits it was derived from.
//!
//! Composite commits use a reserved synthetic identity at the newest
//! constituent's committer time. Reconstructed component commits always keep
//! the original author; their committer follows [`CommitterPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use stitch_git::{CommitInfo, GitRepo, Signature};

use crate::error::StitchError;

/// Name of the identity reserved for commits this tool synthesizes.
pub const SYNTHETIC_NAME: &str = "git-stitch";
/// Email of the identity reserved for commits this tool synthesizes.
pub const SYNTHETIC_EMAIL: &str = "git-stitch@localhost";

const COMMITTER_KEY: &str = "stitch.committer";

/// The synthetic identity at `seconds` (UTC).
#[must_use]
pub fn synthetic(seconds: i64) -> Signature {
    Signature::new(SYNTHETIC_NAME, SYNTHETIC_EMAIL, seconds, 0)
}

/// Timestamp of a composite commit: the newest committer time among its
/// constituents, or the epoch when there are none.
#[must_use]
pub fn composite_time<'a>(constituents: impl IntoIterator<Item = &'a CommitInfo>) -> i64 {
    constituents
        .into_iter()
        .map(|c| c.committer.seconds)
        .max()
        .unwrap_or(0)
}

/// Who is recorded as committer of a reconstructed component commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitterPolicy {
    /// Copy the composite commit's committer, including its time.
    #[default]
    Preserve,
    /// Use the synthetic identity at the composite commit's author time.
    Synthetic,
}

impl CommitterPolicy {
    /// Read `stitch.committer`, defaulting to [`CommitterPolicy::Preserve`].
    pub fn from_config(repo: &dyn GitRepo) -> Result<Self, StitchError> {
        match repo.read_config(COMMITTER_KEY)? {
            None => Ok(Self::default()),
            Some(raw) => raw.parse().map_err(|detail| StitchError::NotConfigured {
                detail: format!("{COMMITTER_KEY}: {detail}"),
            }),
        }
    }

    /// Author and committer for the commit that replays `composite`.
    #[must_use]
    pub fn signatures(self, composite: &CommitInfo) -> (Signature, Signature) {
        let author = composite.author.clone();
        let committer = match self {
            Self::Preserve => composite.committer.clone(),
            Self::Synthetic => synthetic(composite.author.seconds),
        };
        (author, committer)
    }
}

impl FromStr for CommitterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(format!(
                "invalid committer policy '{other}'. Use: preserve or synthetic"
            )),
        }
    }
}

impl fmt::Display for CommitterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preserve => "preserve",
            Self::Synthetic => "synthetic",
        })
    }
}
