//! Error taxonomy for stitch and rip operations.
//!
//! Every variant carries enough context to act on without re-running with
//! logging enabled. Errors from the object store are wrapped unmodified in
//! [`StitchError::ObjectStoreIO`].

use stitch_git::{GitError, GitOid};
use thiserror::Error;

/// Errors from the composition engine.
#[derive(Debug, Error)]
pub enum StitchError {
    /// A component's branch ref could not be resolved to a commit.
    #[error(
        "cannot resolve `{reference}` for component '{component}'.\n  To fix: fetch the remote, or check the ref exists:\n    git rev-parse {reference}"
    )]
    UnresolvedRef {
        /// The component whose ref failed to resolve.
        component: String,
        /// The ref spec that was tried.
        reference: String,
    },

    /// A configured source subdirectory does not exist (or is not a
    /// directory) in the origin commit.
    #[error(
        "component '{component}': subdirectory '{subdir}' is not a directory in commit {commit}.\n  To fix: check the mapping:\n    git config remote.{component}.stitch-subdir"
    )]
    MissingTree {
        /// The component being resolved.
        component: String,
        /// The configured source subdirectory.
        subdir: String,
        /// The origin commit that lacks it.
        commit: GitOid,
    },

    /// No composite commit anchors the partitioning window.
    #[error(
        "no base commit found: {detail}\n  To fix: create one with `git-stitch stitch` or pass `--base <rev>`."
    )]
    NoBaseCommit {
        /// Why the search came up empty.
        detail: String,
    },

    /// A changed path could not be resolved to a blob and mode in the
    /// composite commit that changed it.
    #[error("cannot resolve {change} of '{path}' in commit {commit}")]
    ChangeResolutionFailed {
        /// The composite commit being replayed.
        commit: GitOid,
        /// Path relative to the composite root.
        path: String,
        /// The change kind (`addition`, `modification`).
        change: &'static str,
    },

    /// The object store failed.
    #[error(transparent)]
    ObjectStoreIO(#[from] GitError),

    /// A component definition failed validation.
    #[error("invalid component '{name}': {reason}")]
    InvalidComponent {
        /// The offending component name.
        name: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Two components share a name or a composite directory.
    #[error("component {field} '{value}' is used more than once")]
    DuplicateComponent {
        /// Which field collided (`name` or `directory`).
        field: &'static str,
        /// The duplicated value.
        value: String,
    },

    /// The positional fallback found no parent for a component.
    #[error(
        "component '{component}' matches no parent of base commit {base} (it has {parents} parent(s)).\n  To fix: pass the correct composite commit with `--base <rev>`."
    )]
    UnmatchedComponent {
        /// The component with no parent.
        component: String,
        /// The base commit.
        base: GitOid,
        /// Number of parents the base commit has.
        parents: usize,
    },

    /// A merge commit sits between the base and HEAD.
    #[error(
        "commit {commit} between the base and HEAD has {parents} parents; merges cannot be ripped.\n  To fix: linearize the history (e.g. `git rebase {base}`) and retry."
    )]
    MergeInWindow {
        /// The merge commit.
        commit: GitOid,
        /// Its parent count.
        parents: usize,
        /// The base commit the window starts from.
        base: GitOid,
    },

    /// An output branch already exists at a different commit.
    #[error(
        "branch '{branch}' already exists at {existing}, not {wanted}.\n  To fix: choose another prefix, or delete the branch:\n    git branch -D {branch}"
    )]
    BranchConflict {
        /// The short branch name.
        branch: String,
        /// Where it currently points.
        existing: GitOid,
        /// Where this run would point it.
        wanted: GitOid,
    },

    /// A required configuration value is missing or malformed.
    #[error("{detail}\n  To fix: run `git-stitch init <remote> <remote>...` first.")]
    NotConfigured {
        /// What is missing.
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_store_errors_pass_through_unmodified() {
        let inner = GitError::NotFound {
            message: "tree deadbeef".into(),
        };
        let text = inner.to_string();
        let wrapped: StitchError = inner.into();
        assert_eq!(wrapped.to_string(), text);
        assert!(matches!(
            wrapped,
            StitchError::ObjectStoreIO(GitError::NotFound { .. })
        ));
    }

    #[test]
    fn branch_conflict_names_the_fix() {
        let err = StitchError::BranchConflict {
            branch: "out-alpha".into(),
            existing: GitOid::ZERO,
            wanted: GitOid::ZERO,
        };
        let msg = err.to_string();
        assert!(msg.contains("out-alpha"));
        assert!(msg.contains("git branch -D out-alpha"));
    }
}
