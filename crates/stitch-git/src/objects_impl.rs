//! gix-backed object read/write and tree editing operations.

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::*;

/// Convert a gix `EntryMode` to our `EntryMode`.
pub(crate) fn from_gix_entry_mode(mode: gix::objs::tree::EntryMode) -> EntryMode {
    match mode.kind() {
        gix::objs::tree::EntryKind::Tree => EntryMode::Tree,
        gix::objs::tree::EntryKind::Blob => EntryMode::Blob,
        gix::objs::tree::EntryKind::BlobExecutable => EntryMode::BlobExecutable,
        gix::objs::tree::EntryKind::Link => EntryMode::Link,
        gix::objs::tree::EntryKind::Commit => EntryMode::Commit,
    }
}

/// Convert our `EntryMode` to a gix `EntryKind`.
const fn to_gix_entry_kind(mode: EntryMode) -> gix::objs::tree::EntryKind {
    match mode {
        EntryMode::Blob => gix::objs::tree::EntryKind::Blob,
        EntryMode::BlobExecutable => gix::objs::tree::EntryKind::BlobExecutable,
        EntryMode::Tree => gix::objs::tree::EntryKind::Tree,
        EntryMode::Link => gix::objs::tree::EntryKind::Link,
        EntryMode::Commit => gix::objs::tree::EntryKind::Commit,
    }
}

fn to_gix_signature(sig: &Signature) -> gix::actor::Signature {
    gix::actor::Signature {
        name: sig.name.clone(),
        email: sig.email.clone(),
        time: gix::date::Time::new(sig.seconds, sig.offset),
    }
}

fn from_gix_signature(
    oid: GitOid,
    sig: gix::actor::SignatureRef<'_>,
) -> Result<Signature, GitError> {
    let time = sig.time().map_err(|e| GitError::BackendError {
        message: format!("commit {oid} has an unparseable signature time {:?}: {e}", sig.time),
    })?;
    Ok(Signature::new(sig.name, sig.email, time.seconds, time.offset))
}

pub fn read_blob(repo: &GixRepo, oid: GitOid) -> Result<Vec<u8>, GitError> {
    let mut blob = repo
        .repo
        .find_blob(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("blob {oid}: {e}"),
        })?;
    Ok(blob.take_data())
}

pub fn read_tree(repo: &GixRepo, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
    let tree = repo
        .repo
        .find_tree(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("tree {oid}: {e}"),
        })?;

    let mut entries = Vec::new();
    for result in tree.iter() {
        let entry = result.map_err(|e| GitError::BackendError {
            message: format!("failed to decode entry of tree {oid}: {e}"),
        })?;
        entries.push(TreeEntry {
            name: entry.inner.filename.to_string(),
            mode: from_gix_entry_mode(entry.inner.mode),
            oid: from_gix_oid(entry.inner.oid),
        });
    }
    Ok(entries)
}

pub fn read_commit(repo: &GixRepo, oid: GitOid) -> Result<CommitInfo, GitError> {
    let commit = repo
        .repo
        .find_commit(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("commit {oid}: {e}"),
        })?;

    let decoded = commit.decode().map_err(|e| GitError::BackendError {
        message: format!("failed to decode commit {oid}: {e}"),
    })?;

    Ok(CommitInfo {
        tree_oid: from_gix_oid(&decoded.tree()),
        parents: decoded.parents().map(|p| from_gix_oid(&p)).collect(),
        message: decoded.message.to_owned(),
        encoding: decoded.encoding.map(ToOwned::to_owned),
        author: from_gix_signature(oid, decoded.author())?,
        committer: from_gix_signature(oid, decoded.committer())?,
    })
}

pub fn tree_at_path(
    repo: &GixRepo,
    tree: GitOid,
    path: &str,
) -> Result<Option<TreeEntry>, GitError> {
    let components: Vec<&str> = path
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();

    let mut current = TreeEntry {
        name: String::new(),
        mode: EntryMode::Tree,
        oid: tree,
    };
    for component in components {
        if !current.mode.is_tree() {
            return Ok(None);
        }
        let entries = read_tree(repo, current.oid)?;
        match entries.into_iter().find(|e| e.name == component) {
            Some(entry) => current = entry,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

pub fn write_blob(repo: &GixRepo, data: &[u8]) -> Result<GitOid, GitError> {
    let id = repo.repo.write_blob(data).map_err(|e| GitError::BackendError {
        message: format!("failed to write blob: {e}"),
    })?;
    Ok(from_gix_oid(&id.detach()))
}

/// Git orders tree entries by name, with tree names compared as if they
/// carried a trailing `/`.
fn canonical_key(entry: &TreeEntry) -> Vec<u8> {
    let mut key = entry.name.as_bytes().to_vec();
    if entry.mode.is_tree() {
        key.push(b'/');
    }
    key
}

pub fn write_tree(repo: &GixRepo, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
    let mut sorted: Vec<&TreeEntry> = entries.iter().collect();
    sorted.sort_by_cached_key(|e| canonical_key(e));

    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = sorted.iter().find(|e| !seen.insert(e.name.as_str())) {
        return Err(GitError::BackendError {
            message: format!("duplicate tree entry '{}'", dup.name),
        });
    }
    if let Some(bad) = sorted
        .iter()
        .find(|e| e.name.is_empty() || e.name.contains('/') || e.name == "." || e.name == "..")
    {
        return Err(GitError::BackendError {
            message: format!("invalid tree entry name {:?}", bad.name),
        });
    }

    let tree = gix::objs::Tree {
        entries: sorted
            .into_iter()
            .map(|e| gix::objs::tree::Entry {
                mode: to_gix_entry_kind(e.mode).into(),
                filename: e.name.as_str().into(),
                oid: to_gix_oid(e.oid),
            })
            .collect(),
    };
    let id = repo.repo.write_object(&tree).map_err(|e| GitError::BackendError {
        message: format!("failed to write tree: {e}"),
    })?;
    Ok(from_gix_oid(&id.detach()))
}

pub fn write_commit(repo: &GixRepo, commit: &NewCommit) -> Result<GitOid, GitError> {
    let mut message = commit.message.clone();
    if !message.ends_with(b"\n") {
        message.push(b'\n');
    }

    let object = gix::objs::Commit {
        message,
        tree: to_gix_oid(commit.tree),
        author: to_gix_signature(&commit.author),
        committer: to_gix_signature(&commit.committer),
        encoding: commit.encoding.clone(),
        parents: commit.parents.iter().map(|p| to_gix_oid(*p)).collect(),
        extra_headers: Vec::new(),
    };
    let id = repo.repo.write_object(&object).map_err(|e| GitError::BackendError {
        message: format!("failed to write commit object: {e}"),
    })?;
    Ok(from_gix_oid(&id.detach()))
}

pub fn edit_tree(repo: &GixRepo, base: GitOid, edits: &[TreeEdit]) -> Result<GitOid, GitError> {
    let tree = repo
        .repo
        .find_tree(to_gix_oid(base))
        .map_err(|e| GitError::NotFound {
            message: format!("base tree {base}: {e}"),
        })?;

    let mut editor = tree.edit().map_err(|e| GitError::BackendError {
        message: format!("failed to create tree editor: {e}"),
    })?;

    for edit in edits {
        match edit {
            TreeEdit::Upsert { path, mode, oid } => {
                editor
                    .upsert(path.as_str(), to_gix_entry_kind(*mode), to_gix_oid(*oid))
                    .map_err(|e| GitError::BackendError {
                        message: format!("tree edit upsert '{path}': {e}"),
                    })?;
            }
            TreeEdit::Remove { path } => {
                editor
                    .remove(path.as_str())
                    .map_err(|e| GitError::BackendError {
                        message: format!("tree edit remove '{path}': {e}"),
                    })?;
            }
        }
    }

    let new_id = editor.write().map_err(|e| GitError::BackendError {
        message: format!("failed to write edited tree: {e}"),
    })?;
    Ok(from_gix_oid(&new_id.detach()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_treats_trees_as_slash_suffixed() {
        let oid = GitOid::ZERO;
        let file = TreeEntry {
            name: "a.txt".into(),
            mode: EntryMode::Blob,
            oid,
        };
        let dir = TreeEntry {
            name: "a".into(),
            mode: EntryMode::Tree,
            oid,
        };
        // "a/" sorts after "a.txt" because '/' (0x2f) > '.' (0x2e).
        assert!(canonical_key(&file) < canonical_key(&dir));
    }
}
