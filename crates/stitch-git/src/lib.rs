//! Object store adapter for git-stitch.
//!
//! This crate defines the [`GitRepo`] trait, the single interface through
//! which the stitching engine reads and writes git objects, refs, and config.
//! The engine never imports gix directly; it depends on `stitch-git` and
//! programs against the trait.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait definition.
//! - [`types`]: value types used in trait signatures ([`GitOid`], [`RefName`],
//!   [`TreeEntry`], [`DiffEntry`], [`Signature`], etc.).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.

pub mod error;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod cli;
mod config_impl;
mod diff_impl;
mod gix_repo;
mod objects_impl;
mod refs_impl;
mod remote_impl;

pub use gix_repo::GixRepo;

// Byte strings appear in commit metadata; callers need the same bstr version.
pub use gix::bstr::{BStr, BString, ByteSlice};

// Re-export the main trait and commonly used types at the crate root for
// ergonomic imports: `use stitch_git::{GitRepo, GitOid, GitError};`
pub use error::GitError;
pub use repo::GitRepo;
pub use types::{
    ChangeType, CommitInfo, DiffEntry, EntryMode, GitOid, NewCommit, OidParseError, RefEdit,
    RefName, RefNameError, Signature, TreeEdit, TreeEntry,
};
