//! Composite tree builder.
//!
//! A composite commit has one top-level directory per component, each holding
//! that component's (sub)tree, and one parent per component. Parents and
//! entries are both ordered by composite directory name, so the result does not
//! depend on the order components are given in.
//!
//! Identity and time come from [`crate::identity`], never from the invoking
//! user or the clock:
//!
//! ```text
//! tree      = { <mono_dir> -> <component tree> ... }   sorted by mono_dir
//! parents   = [ <component head> ... ]                  same order
//! author    = git-stitch <git-stitch@localhost> @ max(parent committer time)
//! committer = author
//! message   = "git-stitch merge"
//! ```

use serde::Serialize;
use stitch_git::{CommitInfo, EntryMode, GitOid, GitRepo, NewCommit, TreeEntry};
use tracing::{debug, info, instrument};

use crate::component::{self, Component};
use crate::error::StitchError;
use crate::format::oid_hex;
use crate::identity;

/// Message of every composite commit. The base-commit locator searches for it.
pub const STITCH_MARKER: &str = "git-stitch merge";

/// Outcome of [`stitch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StitchReport {
    /// The composite commit.
    #[serde(serialize_with = "oid_hex")]
    pub commit: GitOid,
    /// Its root tree.
    #[serde(serialize_with = "oid_hex")]
    pub tree: GitOid,
    /// Author and committer time (seconds since the epoch, UTC).
    pub timestamp: i64,
    /// Components in parent order.
    pub components: Vec<StitchedComponent>,
}

/// One component as it went into a composite commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StitchedComponent {
    /// Component name.
    pub name: String,
    /// The ref that was resolved.
    pub reference: String,
    /// Directory in the composite tree.
    pub mono_dir: String,
    /// Source subdirectory (`.` for the whole repository).
    pub source_subdir: String,
    /// The origin commit, recorded as a parent.
    #[serde(serialize_with = "oid_hex")]
    pub head: GitOid,
    /// The tree placed at `mono_dir`.
    #[serde(serialize_with = "oid_hex")]
    pub tree: GitOid,
}

/// Stitch `components` into one composite commit.
///
/// Each component's [`Component::reference`] is resolved to its origin
/// commit. No ref is updated; the caller decides what to point at the
/// result.
///
/// # Errors
/// [`StitchError::UnresolvedRef`] if a reference does not resolve, and
/// [`StitchError::MissingTree`] if a source subdirectory is absent from the
/// origin tree.
#[instrument(skip_all, fields(components = components.len()))]
pub fn stitch(repo: &dyn GitRepo, components: &[Component]) -> Result<StitchReport, StitchError> {
    if components.is_empty() {
        return Err(StitchError::NotConfigured {
            detail: "nothing to stitch: no components given".to_owned(),
        });
    }
    component::validate_set(components)?;

    let mut ordered: Vec<&Component> = components.iter().collect();
    ordered.sort_by(|a, b| a.mono_dir.cmp(&b.mono_dir));

    let mut stitched = Vec::with_capacity(ordered.len());
    let mut origins: Vec<CommitInfo> = Vec::with_capacity(ordered.len());
    for c in ordered {
        let (head, origin) = resolve_origin(repo, c)?;
        let tree = component_tree(repo, c, head, &origin)?;
        debug!(component = %c.name, %head, %tree, "resolved component");
        stitched.push(StitchedComponent {
            name: c.name.clone(),
            reference: c.reference(),
            mono_dir: c.mono_dir.clone(),
            source_subdir: c.source_subdir.clone(),
            head,
            tree,
        });
        origins.push(origin);
    }

    let entries: Vec<TreeEntry> = stitched
        .iter()
        .map(|s| TreeEntry {
            name: s.mono_dir.clone(),
            mode: EntryMode::Tree,
            oid: s.tree,
        })
        .collect();
    let tree = repo.write_tree(&entries)?;

    let timestamp = identity::composite_time(&origins);
    let signature = identity::synthetic(timestamp);
    let commit = repo.write_commit(&NewCommit {
        tree,
        parents: stitched.iter().map(|s| s.head).collect(),
        message: STITCH_MARKER.into(),
        encoding: None,
        author: signature.clone(),
        committer: signature,
    })?;

    info!(%commit, %tree, timestamp, "created composite commit");
    Ok(StitchReport {
        commit,
        tree,
        timestamp,
        components: stitched,
    })
}

fn resolve_origin(repo: &dyn GitRepo, c: &Component) -> Result<(GitOid, CommitInfo), StitchError> {
    let reference = c.reference();
    // Peel annotated tags; only commits can be parents.
    let head = repo
        .rev_parse_opt(&format!("{reference}^{{commit}}"))?
        .ok_or_else(|| StitchError::UnresolvedRef {
            component: c.name.clone(),
            reference,
        })?;
    let origin = repo.read_commit(head)?;
    Ok((head, origin))
}

fn component_tree(
    repo: &dyn GitRepo,
    c: &Component,
    head: GitOid,
    origin: &CommitInfo,
) -> Result<GitOid, StitchError> {
    c.source_tree(repo, origin.tree_oid)?
        .ok_or_else(|| StitchError::MissingTree {
            component: c.name.clone(),
            subdir: c.source_subdir.clone(),
            commit: head,
        })
}
