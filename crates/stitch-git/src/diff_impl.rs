//! gix-backed tree-to-tree diff.
//!
//! Renames are not detected. A path that switches between file and
//! directory is reported as deletions of the old side plus additions of the
//! new side. Tree entries themselves are dropped; only blob, link and
//! submodule paths are reported.

use gix::diff::tree_with_rewrites::Change;

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::objects_impl::from_gix_entry_mode;
use crate::types::*;

fn find_tree(repo: &GixRepo, oid: GitOid) -> Result<gix::Tree<'_>, GitError> {
    repo.repo
        .find_tree(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("tree {oid}: {e}"),
        })
}

fn path_of(location: gix::bstr::BString) -> Result<String, GitError> {
    String::from_utf8(location.into()).map_err(|e| GitError::BackendError {
        message: format!("non-UTF-8 path in tree: {:?}", e.as_bytes()),
    })
}

pub fn diff_trees(
    repo: &GixRepo,
    old: Option<GitOid>,
    new: GitOid,
) -> Result<Vec<DiffEntry>, GitError> {
    let old_tree = old.map(|oid| find_tree(repo, oid)).transpose()?;
    let new_tree = find_tree(repo, new)?;

    let options = gix::diff::Options::default().with_rewrites(None);
    let changes = repo
        .repo
        .diff_tree_to_tree(old_tree.as_ref(), &new_tree, options)
        .map_err(|e| GitError::BackendError {
            message: format!("failed to diff {} against {new}: {e}", old.unwrap_or(GitOid::ZERO)),
        })?;

    let mut out = Vec::with_capacity(changes.len());
    for change in changes {
        let entry = match change {
            Change::Addition {
                location,
                entry_mode,
                id,
                ..
            } if !entry_mode.is_tree() => DiffEntry {
                path: path_of(location)?,
                change_type: ChangeType::Added,
                old_oid: GitOid::ZERO,
                new_oid: from_gix_oid(&id),
                old_mode: None,
                new_mode: Some(from_gix_entry_mode(entry_mode)),
            },
            Change::Deletion {
                location,
                entry_mode,
                id,
                ..
            } if !entry_mode.is_tree() => DiffEntry {
                path: path_of(location)?,
                change_type: ChangeType::Deleted,
                old_oid: from_gix_oid(&id),
                new_oid: GitOid::ZERO,
                old_mode: Some(from_gix_entry_mode(entry_mode)),
                new_mode: None,
            },
            Change::Modification {
                location,
                previous_entry_mode,
                previous_id,
                entry_mode,
                id,
            } if !entry_mode.is_tree() => DiffEntry {
                path: path_of(location)?,
                change_type: ChangeType::Modified,
                old_oid: from_gix_oid(&previous_id),
                new_oid: from_gix_oid(&id),
                old_mode: Some(from_gix_entry_mode(previous_entry_mode)),
                new_mode: Some(from_gix_entry_mode(entry_mode)),
            },
            Change::Rewrite { location, .. } => {
                return Err(GitError::BackendError {
                    message: format!("unexpected rewrite of '{location}' with rename tracking off"),
                });
            }
            _ => continue,
        };
        out.push(entry);
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}
