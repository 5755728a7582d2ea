//! The [`GitRepo`] trait is the single abstraction boundary between the
//! stitching engine and git.
//!
//! The engine touches the object store exclusively through this trait. The
//! trait is object-safe so callers can use `dyn GitRepo` or `Box<dyn GitRepo>`.
//!
//! | Group        | Methods                                                   |
//! |--------------|-----------------------------------------------------------|
//! | Refs         | `read_ref`, `write_ref`, `atomic_ref_update`, `list_refs` |
//! | Rev-parse    | `rev_parse`, `rev_parse_opt`, `symbolic_ref_target`       |
//! | Object read  | `read_blob`, `read_tree`, `read_commit`, `tree_at_path`   |
//! | Object write | `write_blob`, `write_tree`, `write_commit`                |
//! | Tree editing | `edit_tree`                                               |
//! | Diff         | `diff_trees`                                              |
//! | Config       | `read_config`, `write_config`                             |
//! | Remotes      | `remote_exists`, `fetch`                                  |

use crate::error::GitError;
use crate::types::{CommitInfo, DiffEntry, GitOid, NewCommit, RefEdit, RefName, TreeEdit, TreeEntry};

/// The object store interface consumed by git-stitch.
///
/// Implementations may be backed by gix (the shipped backend) or a test
/// double.
///
/// # Object safety
///
/// This trait is object-safe: no generic methods, no `Self` in return position
/// outside of `Result`. Callers may use `&dyn GitRepo` or `Box<dyn GitRepo>`.
pub trait GitRepo {
    // -----------------------------------------------------------------------
    // Refs
    //
    // Replaces: git rev-parse <ref>, git update-ref, git update-ref --stdin,
    //           git for-each-ref
    // -----------------------------------------------------------------------

    /// Resolve a ref to its OID, returning `None` if the ref does not exist.
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError>;

    /// Create or overwrite a ref unconditionally.
    ///
    /// `log_message` is written to the reflog entry.
    fn write_ref(&self, name: &RefName, oid: GitOid, log_message: &str) -> Result<(), GitError>;

    /// Atomically apply a batch of ref updates with compare-and-swap semantics.
    ///
    /// All updates succeed or all fail. Each [`RefEdit`] carries an expected
    /// old OID; if any ref's current value differs, the entire transaction is
    /// aborted and [`GitError::RefConflict`] is returned.
    fn atomic_ref_update(&self, edits: &[RefEdit], log_message: &str) -> Result<(), GitError>;

    /// List refs matching a prefix (e.g., `"refs/heads/"`).
    ///
    /// Returns `(ref_name, oid)` pairs sorted by ref name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, GitOid)>, GitError>;

    // -----------------------------------------------------------------------
    // Rev-parse
    // -----------------------------------------------------------------------

    /// Resolve a revision specification (`HEAD`, `alpha/main`, `HEAD~2`, a
    /// hex OID, ...) to an OID.
    ///
    /// Returns [`GitError::NotFound`] if the spec cannot be resolved.
    fn rev_parse(&self, spec: &str) -> Result<GitOid, GitError>;

    /// Like [`rev_parse`](Self::rev_parse) but returns `None` instead of an
    /// error when the spec cannot be resolved.
    fn rev_parse_opt(&self, spec: &str) -> Result<Option<GitOid>, GitError>;

    /// The full name a symbolic ref points at (e.g. `refs/remotes/alpha/HEAD`
    /// → `refs/remotes/alpha/main`), or `None` if the ref is missing or not
    /// symbolic.
    fn symbolic_ref_target(&self, name: &RefName) -> Result<Option<RefName>, GitError>;

    // -----------------------------------------------------------------------
    // Object read
    //
    // Replaces: git cat-file blob, git ls-tree, git cat-file commit
    // -----------------------------------------------------------------------

    /// Read the contents of a blob object.
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError>;

    /// Read the entries of a tree object (one level deep, not recursive).
    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError>;

    /// Read a commit object's tree, parents, message, and signatures.
    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError>;

    /// Look up the entry at a slash-separated `path` below `tree`.
    ///
    /// Returns `None` if any component of the path is missing or a
    /// non-final component is not a tree.
    ///
    /// Replaces: `git rev-parse <tree>:<path>` / `git ls-tree <tree> <path>`.
    fn tree_at_path(&self, tree: GitOid, path: &str) -> Result<Option<TreeEntry>, GitError>;

    // -----------------------------------------------------------------------
    // Object write
    //
    // Replaces: git hash-object -w, git mktree, git commit-tree
    // -----------------------------------------------------------------------

    /// Write a blob to the object store and return its OID.
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError>;

    /// Write a tree object from a list of entries and return its OID.
    ///
    /// Entries are put into git's canonical order before writing, so callers
    /// may pass them in any order.
    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError>;

    /// Write a commit object exactly as described and return its OID.
    ///
    /// No ref is updated. Identity and timestamps come only from `commit`.
    fn write_commit(&self, commit: &NewCommit) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // Tree editing
    // -----------------------------------------------------------------------

    /// Apply a set of edits to an existing tree and return the OID of the new tree.
    ///
    /// Edits may insert, update, or remove entries at nested paths.
    /// Intermediate trees are created as needed; trees left empty by a
    /// removal are dropped.
    fn edit_tree(&self, base: GitOid, edits: &[TreeEdit]) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // Diff
    //
    // Replaces: git diff-tree --no-commit-id --name-status -r
    // -----------------------------------------------------------------------

    /// Diff two trees and return the list of changed files, sorted by path.
    ///
    /// If `old` is `None`, the diff is against an empty tree (i.e., all files
    /// in `new` appear as additions). Only non-tree entries are reported;
    /// directories are descended into.
    fn diff_trees(&self, old: Option<GitOid>, new: GitOid) -> Result<Vec<DiffEntry>, GitError>;

    // -----------------------------------------------------------------------
    // Config
    //
    // Replaces: git config --get <key>, git config <key> <value>
    // -----------------------------------------------------------------------

    /// Read a git config value. Returns `None` if the key is not set.
    fn read_config(&self, key: &str) -> Result<Option<String>, GitError>;

    /// Set a git config value in the repository-local config.
    fn write_config(&self, key: &str, value: &str) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Remotes
    //
    // Replaces: git remote get-url, git fetch
    // -----------------------------------------------------------------------

    /// Returns `true` if a remote with this name is configured.
    fn remote_exists(&self, remote: &str) -> Result<bool, GitError>;

    /// Fetch a remote's refs into `refs/remotes/<remote>/*`.
    fn fetch(&self, remote: &str) -> Result<(), GitError>;
}
