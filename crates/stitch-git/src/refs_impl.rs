//! gix-backed ref and rev-parse operations.

use gix::refs::transaction::{Change, LogChange, PreviousValue, RefLog};
use gix::refs::{FullName, Target};

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::*;

pub fn read_ref(repo: &GixRepo, name: &RefName) -> Result<Option<GitOid>, GitError> {
    match repo.repo.try_find_reference(name.as_str()) {
        Ok(Some(mut r)) => {
            let id = r.peel_to_id_in_place().map_err(GitError::backend)?;
            Ok(Some(from_gix_oid(&id.detach())))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(GitError::backend(e)),
    }
}

pub fn write_ref(
    repo: &GixRepo,
    name: &RefName,
    oid: GitOid,
    log_message: &str,
) -> Result<(), GitError> {
    repo.repo
        .reference(name.as_str(), to_gix_oid(oid), PreviousValue::Any, log_message)
        .map_err(GitError::backend)?;
    Ok(())
}

pub fn atomic_ref_update(
    repo: &GixRepo,
    edits: &[RefEdit],
    log_message: &str,
) -> Result<(), GitError> {
    if edits.is_empty() {
        return Ok(());
    }

    let gix_edits: Vec<gix::refs::transaction::RefEdit> = edits
        .iter()
        .map(|edit| {
            let name: FullName = edit
                .name
                .as_str()
                .try_into()
                .map_err(|e: gix::validate::reference::name::Error| GitError::backend(e))?;

            let expected = if edit.expected_old_oid.is_zero() {
                PreviousValue::MustNotExist
            } else {
                PreviousValue::MustExistAndMatch(Target::Object(to_gix_oid(edit.expected_old_oid)))
            };

            Ok(gix::refs::transaction::RefEdit {
                change: Change::Update {
                    log: LogChange {
                        mode: RefLog::AndReference,
                        force_create_reflog: false,
                        message: log_message.into(),
                    },
                    expected,
                    new: Target::Object(to_gix_oid(edit.new_oid)),
                },
                name,
                deref: false,
            })
        })
        .collect::<Result<Vec<_>, GitError>>()?;

    repo.repo.edit_references(gix_edits).map_err(|e| {
        let msg = e.to_string();
        // gix reports CAS failures only through the message text.
        if msg.contains("existing object id")
            || msg.contains("MustExistAndMatch")
            || msg.contains("did not match")
            || msg.contains("MustNotExist")
            || msg.contains("must not exist")
        {
            let ref_name = edits
                .iter()
                .map(|e| e.name.as_str())
                .find(|n| msg.contains(n))
                .or_else(|| edits.first().map(|e| e.name.as_str()))
                .unwrap_or_default()
                .to_owned();
            GitError::RefConflict {
                ref_name,
                message: msg,
            }
        } else {
            GitError::BackendError { message: msg }
        }
    })?;
    Ok(())
}

pub fn list_refs(repo: &GixRepo, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError> {
    let platform = repo.repo.references().map_err(GitError::backend)?;
    let refs_iter = platform.prefixed(prefix).map_err(GitError::backend)?;

    let mut result = Vec::new();
    for r in refs_iter {
        let mut r = r.map_err(GitError::backend)?;
        let name_str = r.name().as_bstr().to_string();
        let id = r.peel_to_id_in_place().map_err(GitError::backend)?;
        if let Ok(ref_name) = RefName::new(&name_str) {
            result.push((ref_name, from_gix_oid(&id.detach())));
        }
    }
    result.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(result)
}

pub fn rev_parse(repo: &GixRepo, spec: &str) -> Result<GitOid, GitError> {
    let id = repo
        .repo
        .rev_parse_single(spec)
        .map_err(|e| GitError::NotFound {
            message: format!("rev-parse '{spec}': {e}"),
        })?;
    Ok(from_gix_oid(&id.detach()))
}

pub fn rev_parse_opt(repo: &GixRepo, spec: &str) -> Result<Option<GitOid>, GitError> {
    // Every rev-parse failure (malformed spec, missing ref, unborn HEAD) is
    // "could not be resolved".
    Ok(repo
        .repo
        .rev_parse_single(spec)
        .ok()
        .map(|id| from_gix_oid(&id.detach())))
}

pub fn symbolic_ref_target(repo: &GixRepo, name: &RefName) -> Result<Option<RefName>, GitError> {
    let Some(r) = repo
        .repo
        .try_find_reference(name.as_str())
        .map_err(GitError::backend)?
    else {
        return Ok(None);
    };
    match &r.inner.target {
        Target::Symbolic(target) => Ok(RefName::new(&target.as_bstr().to_string()).ok()),
        Target::Object(_) => Ok(None),
    }
}
