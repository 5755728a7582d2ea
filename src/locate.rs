//! Base-commit locator and the linear commit window after it.
//!
//! Both walk first parents from a starting commit. The base is the nearest
//! commit carrying the stitch marker; the window is everything after it, up to
//! and including the start, in chronological order.

use stitch_git::{ByteSlice, CommitInfo, GitOid, GitRepo};
use tracing::{debug, instrument};

use crate::compose::STITCH_MARKER;
use crate::error::StitchError;

/// A commit together with its decoded contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedCommit {
    /// The commit id.
    pub oid: GitOid,
    /// The decoded commit.
    pub info: CommitInfo,
}

/// Iterator over the first-parent chain starting at (and including) a commit.
pub struct FirstParentLog<'a> {
    repo: &'a dyn GitRepo,
    next: Option<GitOid>,
}

impl<'a> FirstParentLog<'a> {
    /// Walk first parents from `start`, newest first.
    pub fn new(repo: &'a dyn GitRepo, start: GitOid) -> Self {
        Self {
            repo,
            next: Some(start),
        }
    }
}

impl Iterator for FirstParentLog<'_> {
    type Item = Result<LoggedCommit, StitchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.next.take()?;
        match self.repo.read_commit(oid) {
            Ok(info) => {
                self.next = info.parents.first().copied();
                Some(Ok(LoggedCommit { oid, info }))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Whether `message` marks a composite commit.
#[must_use]
pub fn is_marker(message: impl AsRef<[u8]>) -> bool {
    message
        .as_ref()
        .trim_start()
        .starts_with(STITCH_MARKER.as_bytes())
}

/// Commits on the first-parent chain from `start` matching `predicate`,
/// newest first. A read error is yielded once and ends the walk.
pub fn search_first_parent_log<'a>(
    repo: &'a dyn GitRepo,
    start: GitOid,
    mut predicate: impl FnMut(&LoggedCommit) -> bool + 'a,
) -> impl Iterator<Item = Result<LoggedCommit, StitchError>> + 'a {
    FirstParentLog::new(repo, start).filter(move |c| c.as_ref().map_or(true, &mut predicate))
}

/// The nearest composite commit on the first-parent chain from `head`.
///
/// Older composite commits further down the chain are never considered.
///
/// # Errors
/// [`StitchError::NoBaseCommit`] if no commit on the chain carries the marker.
#[instrument(skip(repo))]
pub fn find_base(repo: &dyn GitRepo, head: GitOid) -> Result<LoggedCommit, StitchError> {
    match search_first_parent_log(repo, head, |c| is_marker(&c.info.message)).next() {
        Some(found) => {
            let commit = found?;
            debug!(base = %commit.oid, "found base commit");
            Ok(commit)
        }
        None => Err(StitchError::NoBaseCommit {
            detail: format!(
                "no commit with message '{STITCH_MARKER}' is a first-parent ancestor of {head}"
            ),
        }),
    }
}

/// Commits strictly after `base` up to `head`, oldest first.
///
/// # Errors
/// [`StitchError::MergeInWindow`] if any of them has more than one parent, and
/// [`StitchError::NoBaseCommit`] if `base` is not on the first-parent chain of
/// `head`.
#[instrument(skip(repo))]
pub fn commit_window(
    repo: &dyn GitRepo,
    head: GitOid,
    base: GitOid,
) -> Result<Vec<LoggedCommit>, StitchError> {
    let mut window = Vec::new();
    for commit in FirstParentLog::new(repo, head) {
        let commit = commit?;
        if commit.oid == base {
            window.reverse();
            debug!(commits = window.len(), "collected commit window");
            return Ok(window);
        }
        if commit.info.parents.len() > 1 {
            return Err(StitchError::MergeInWindow {
                commit: commit.oid,
                parents: commit.info.parents.len(),
                base,
            });
        }
        window.push(commit);
    }
    Err(StitchError::NoBaseCommit {
        detail: format!("{base} is not a first-parent ancestor of {head}"),
    })
}
