//! Commit partitioner (`rip`).
//!
//! Replays every composite commit after the base onto per-component branches:
//!
//! 1. Diff the composite commit against its parent.
//! 2. Group changed paths by top-level directory. Paths outside every
//!    component directory are dropped.
//! 3. For each touched component, apply all of its changes to the current
//!    head's tree in one batched edit and commit the result on top of that
//!    head, keeping the original message and author.
//!
//! Chains are built completely before any ref moves. Branches are then
//! published in one atomic ref transaction, so a failed run leaves no new
//! branch behind (written objects are unreferenced and harmless).

use std::collections::BTreeMap;

use serde::Serialize;
use stitch_git::{ChangeType, DiffEntry, GitOid, GitRepo, NewCommit, RefEdit, RefName, TreeEdit};
use tracing::{debug, info, instrument};

use crate::component::{self, Component};
use crate::error::StitchError;
use crate::format::oid_hex;
use crate::heads::{self, ComponentHead, HeadMatch};
use crate::identity::CommitterPolicy;
use crate::locate::{self, LoggedCommit};

/// Parameters of a rip run.
#[derive(Clone, Debug, Default)]
pub struct RipOptions {
    /// Branches are named `<prefix>-<component>`.
    pub prefix: String,
    /// Committer of reconstructed commits.
    pub committer: CommitterPolicy,
    /// Explicit base commit; the nearest marker commit when `None`.
    pub base: Option<String>,
}

impl RipOptions {
    /// Options with the given prefix and defaults otherwise.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }
}

/// Outcome of [`rip`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RipReport {
    /// The base commit.
    #[serde(serialize_with = "oid_hex")]
    pub base: GitOid,
    /// The commit the window ends at.
    #[serde(serialize_with = "oid_hex")]
    pub head: GitOid,
    /// Committer policy used.
    pub committer: CommitterPolicy,
    /// Composite commits in the window.
    pub commits: usize,
    /// Composite commits that touched no component.
    pub skipped: usize,
    /// One entry per component. Empty when the window is empty.
    pub branches: Vec<BranchReport>,
}

/// Whether a branch was written by this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    /// The branch was created.
    Created,
    /// The branch already pointed at the reconstructed tip.
    Unchanged,
}

/// One reconstructed component branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    /// Component name.
    pub component: String,
    /// Short branch name.
    pub branch: String,
    /// The origin commit the branch starts from.
    #[serde(serialize_with = "oid_hex")]
    pub start: GitOid,
    /// How `start` was chosen.
    pub matched: HeadMatch,
    /// The branch tip.
    #[serde(serialize_with = "oid_hex")]
    pub tip: GitOid,
    /// Commits added on top of `start`.
    pub replayed: usize,
    /// Whether the branch was written.
    pub status: BranchStatus,
}

/// Mutable cursor over one component's reconstructed branch.
struct Cursor {
    head: ComponentHead,
    tip: GitOid,
    /// Root tree of `tip` (the origin root, not the source subdirectory).
    tree: GitOid,
    replayed: usize,
}

/// Partition the composite commits after the base into component branches.
///
/// # Errors
/// See [`StitchError`]; the first error aborts the run before any ref moves.
#[instrument(skip_all, fields(prefix = %opts.prefix))]
pub fn rip(repo: &dyn GitRepo, opts: &RipOptions) -> Result<RipReport, StitchError> {
    let head = repo.rev_parse("HEAD")?;
    let base = match &opts.base {
        Some(rev) => {
            let oid = repo
                .rev_parse_opt(&format!("{rev}^{{commit}}"))?
                .ok_or_else(|| StitchError::NoBaseCommit {
                    detail: format!("cannot resolve base '{rev}'"),
                })?;
            LoggedCommit {
                oid,
                info: repo.read_commit(oid)?,
            }
        }
        None => locate::find_base(repo, head)?,
    };
    info!(base = %base.oid, %head, "partitioning");

    let window = locate::commit_window(repo, head, base.oid)?;
    let mut report = RipReport {
        base: base.oid,
        head,
        committer: opts.committer,
        commits: window.len(),
        skipped: 0,
        branches: Vec::new(),
    };
    if window.is_empty() {
        info!("no commits to rip since base commit");
        return Ok(report);
    }

    let configured = component::load(repo)?;
    let components = heads::discover_components(repo, base.info.tree_oid, &configured)?;
    let mut cursors = heads::resolve_heads(repo, base.oid, &base.info, &components)?
        .into_iter()
        .map(|head| {
            Ok(Cursor {
                tip: head.commit,
                tree: repo.read_commit(head.commit)?.tree_oid,
                head,
                replayed: 0,
            })
        })
        .collect::<Result<Vec<_>, StitchError>>()?;

    let mut parent_tree = base.info.tree_oid;
    for commit in &window {
        if !replay(repo, commit, parent_tree, &mut cursors, opts.committer)? {
            debug!(commit = %commit.oid, "touches no component; skipped");
            report.skipped += 1;
        }
        parent_tree = commit.info.tree_oid;
    }

    report.branches = publish(repo, &opts.prefix, &cursors)?;
    Ok(report)
}

/// Replay one composite commit. Returns whether any component was touched.
fn replay(
    repo: &dyn GitRepo,
    commit: &LoggedCommit,
    parent_tree: GitOid,
    cursors: &mut [Cursor],
    policy: CommitterPolicy,
) -> Result<bool, StitchError> {
    let changes = repo.diff_trees(Some(parent_tree), commit.info.tree_oid)?;
    let dirs: Vec<String> = cursors
        .iter()
        .map(|c| c.head.component.mono_dir.clone())
        .collect();
    let grouped = group_by_component(&changes, &dirs);
    if grouped.is_empty() {
        return Ok(false);
    }

    let (author, committer) = policy.signatures(&commit.info);
    for cursor in cursors.iter_mut() {
        let Some(changes) = grouped.get(cursor.head.component.mono_dir.as_str()) else {
            continue;
        };
        let edits = changes
            .iter()
            .map(|(rel, change)| to_edit(commit.oid, &cursor.head.component, rel, change))
            .collect::<Result<Vec<_>, _>>()?;
        let tree = repo.edit_tree(cursor.tree, &edits)?;
        let tip = repo.write_commit(&NewCommit {
            tree,
            parents: vec![cursor.tip],
            message: commit.info.message.clone(),
            encoding: commit.info.encoding.clone(),
            author: author.clone(),
            committer: committer.clone(),
        })?;
        debug!(
            component = %cursor.head.component.name,
            composite = %commit.oid,
            %tip,
            changes = edits.len(),
            "replayed"
        );
        cursor.tip = tip;
        cursor.tree = tree;
        cursor.replayed += 1;
    }
    Ok(true)
}

/// Changes keyed by component directory, with paths relative to it.
fn group_by_component<'a, 'd>(
    changes: &'a [DiffEntry],
    dirs: &'d [String],
) -> BTreeMap<&'d str, Vec<(&'a str, &'a DiffEntry)>> {
    let mut grouped: BTreeMap<&str, Vec<(&str, &DiffEntry)>> = BTreeMap::new();
    for change in changes {
        let Some((top, rel)) = change.path.split_once('/') else {
            continue;
        };
        if let Some(dir) = dirs.iter().find(|d| *d == top) {
            grouped.entry(dir.as_str()).or_default().push((rel, change));
        }
    }
    grouped
}

fn to_edit(
    commit: GitOid,
    component: &Component,
    rel: &str,
    change: &DiffEntry,
) -> Result<TreeEdit, StitchError> {
    let path = match component.source_path() {
        Some(subdir) => format!("{subdir}/{rel}"),
        None => rel.to_owned(),
    };
    match change.change_type {
        ChangeType::Deleted => Ok(TreeEdit::Remove { path }),
        ChangeType::Added | ChangeType::Modified => {
            let mode = change
                .new_mode
                .filter(|_| !change.new_oid.is_zero())
                .ok_or_else(|| StitchError::ChangeResolutionFailed {
                    commit,
                    path: change.path.clone(),
                    change: if change.change_type == ChangeType::Added {
                        "addition"
                    } else {
                        "modification"
                    },
                })?;
            Ok(TreeEdit::Upsert {
                path,
                mode,
                oid: change.new_oid,
            })
        }
    }
}

/// Create `<prefix>-<component>` for every cursor in one transaction.
fn publish(
    repo: &dyn GitRepo,
    prefix: &str,
    cursors: &[Cursor],
) -> Result<Vec<BranchReport>, StitchError> {
    let mut edits = Vec::new();
    let mut reports = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        let name = &cursor.head.component.name;
        let branch = format!("{prefix}-{name}");
        let refname = RefName::branch(&branch).map_err(|e| StitchError::InvalidComponent {
            name: name.clone(),
            reason: format!("branch name '{branch}': {e}"),
        })?;

        let status = match repo.read_ref(&refname)? {
            Some(existing) if existing == cursor.tip => BranchStatus::Unchanged,
            Some(existing) => {
                return Err(StitchError::BranchConflict {
                    branch,
                    existing,
                    wanted: cursor.tip,
                });
            }
            None => {
                edits.push(RefEdit {
                    name: refname,
                    new_oid: cursor.tip,
                    expected_old_oid: GitOid::ZERO,
                });
                BranchStatus::Created
            }
        };
        reports.push(BranchReport {
            component: name.clone(),
            branch,
            start: cursor.head.commit,
            matched: cursor.head.matched,
            tip: cursor.tip,
            replayed: cursor.replayed,
            status,
        });
    }

    repo.atomic_ref_update(&edits, &format!("git-stitch: rip {prefix}"))?;
    info!(created = edits.len(), total = reports.len(), "published branches");
    Ok(reports)
}
