//! Components: one origin history and where it lives in the composite tree.
//!
//! Definitions persist in the repository's git config:
//!
//! | Key                           | Meaning                                   |
//! |-------------------------------|-------------------------------------------|
//! | `stitch.remotes`              | space-separated component names, in order |
//! | `remote.<name>.stitch-branch` | branch on the remote to stitch            |
//! | `remote.<name>.stitch-subdir` | source subdirectory (`.` = whole repo)    |
//! | `remote.<name>.stitch-dir`    | directory in the composite tree           |

use serde::Serialize;
use stitch_git::{GitOid, GitRepo};

use crate::error::StitchError;

/// Source subdirectory value meaning "the whole origin repository".
pub const WHOLE_REPO: &str = ".";

const REMOTES_KEY: &str = "stitch.remotes";
const BASE_COMMIT_KEY: &str = "stitch.base-commit";

/// One origin history combined into (or extracted from) the composite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Component name. Also the default remote and composite directory.
    pub name: String,
    /// The remote the origin history is fetched from.
    pub remote: String,
    /// Branch on `remote`.
    pub branch: String,
    /// Subdirectory of the origin tree that is stitched, or [`WHOLE_REPO`].
    pub source_subdir: String,
    /// Top-level directory in the composite tree.
    pub mono_dir: String,
}

impl Component {
    /// A whole-repository component named after its remote.
    pub fn new(name: impl Into<String>, branch: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            remote: name.clone(),
            mono_dir: name.clone(),
            name,
            branch: branch.into(),
            source_subdir: WHOLE_REPO.to_owned(),
        }
    }

    /// Restrict the component to `subdir` of its origin tree.
    #[must_use]
    pub fn with_source_subdir(mut self, subdir: &str) -> Self {
        self.source_subdir = normalize_subdir(subdir);
        self
    }

    /// Place the component at `dir` in the composite tree.
    #[must_use]
    pub fn with_mono_dir(mut self, dir: impl Into<String>) -> Self {
        self.mono_dir = dir.into();
        self
    }

    /// The rev spec of the origin head, e.g. `alpha/main`.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }

    /// The source subdirectory, or `None` for the whole repository.
    #[must_use]
    pub fn source_path(&self) -> Option<&str> {
        (self.source_subdir != WHOLE_REPO).then_some(self.source_subdir.as_str())
    }

    /// The tree at this component's source subdirectory within `root`, or
    /// `None` when it is absent or not a directory.
    pub fn source_tree(
        &self,
        repo: &dyn GitRepo,
        root: GitOid,
    ) -> Result<Option<GitOid>, StitchError> {
        let Some(subdir) = self.source_path() else {
            return Ok(Some(root));
        };
        Ok(repo
            .tree_at_path(root, subdir)?
            .filter(|e| e.mode.is_tree())
            .map(|e| e.oid))
    }

    /// Check names and paths are usable as config keys and tree entries.
    pub fn validate(&self) -> Result<(), StitchError> {
        let invalid = |reason: String| StitchError::InvalidComponent {
            name: self.name.clone(),
            reason,
        };

        if self.name.is_empty() || self.name.contains(char::is_whitespace) || self.name.contains('/')
        {
            return Err(invalid(
                "name must be non-empty, without whitespace or '/'".to_owned(),
            ));
        }
        if self.branch.is_empty() {
            return Err(invalid("branch must not be empty".to_owned()));
        }
        if self.mono_dir.is_empty()
            || self.mono_dir.contains('/')
            || matches!(self.mono_dir.as_str(), "." | ".." | ".git")
        {
            return Err(invalid(format!(
                "'{}' is not a valid top-level directory name",
                self.mono_dir
            )));
        }
        if let Some(subdir) = self.source_path()
            && (subdir.starts_with('/') || subdir.split('/').any(|c| c.is_empty() || c == "." || c == ".."))
        {
            return Err(invalid(format!(
                "source subdirectory '{subdir}' must be a relative path without '.' or '..'"
            )));
        }
        Ok(())
    }
}

/// `""`, `"."` and `"./"` mean the whole repository; trailing slashes are dropped.
fn normalize_subdir(subdir: &str) -> String {
    let trimmed = subdir.trim().trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        WHOLE_REPO.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Validate every component and reject duplicate names or directories.
pub fn validate_set(components: &[Component]) -> Result<(), StitchError> {
    let mut names = std::collections::HashSet::new();
    let mut dirs = std::collections::HashSet::new();
    for c in components {
        c.validate()?;
        if !names.insert(c.name.as_str()) {
            return Err(StitchError::DuplicateComponent {
                field: "name",
                value: c.name.clone(),
            });
        }
        if !dirs.insert(c.mono_dir.as_str()) {
            return Err(StitchError::DuplicateComponent {
                field: "directory",
                value: c.mono_dir.clone(),
            });
        }
    }
    Ok(())
}

/// Parse a `remote/branch` ref into a component named after the remote.
///
/// A configured component with the same name contributes its source
/// subdirectory and composite directory.
pub fn from_ref(spec: &str, configured: &[Component]) -> Result<Component, StitchError> {
    let Some((remote, branch)) = spec.split_once('/').filter(|(r, b)| !r.is_empty() && !b.is_empty())
    else {
        return Err(StitchError::InvalidComponent {
            name: spec.to_owned(),
            reason: "ref must be in the form 'remote/branch'".to_owned(),
        });
    };
    let mut component = Component::new(remote, branch);
    if let Some(known) = configured.iter().find(|c| c.name == remote) {
        component.source_subdir.clone_from(&known.source_subdir);
        component.mono_dir.clone_from(&known.mono_dir);
    }
    component.validate()?;
    Ok(component)
}

/// Detect the default branch of `remote` from `refs/remotes/<remote>/HEAD`,
/// falling back to `main` and then `master`.
pub fn default_branch(repo: &dyn GitRepo, remote: &str) -> Result<String, StitchError> {
    let prefix = format!("refs/remotes/{remote}/");
    let head = stitch_git::RefName::new(&format!("{prefix}HEAD")).map_err(|e| {
        StitchError::InvalidComponent {
            name: remote.to_owned(),
            reason: e.to_string(),
        }
    })?;
    if let Some(target) = repo.symbolic_ref_target(&head)?
        && let Some(branch) = target.as_str().strip_prefix(&prefix)
    {
        return Ok(branch.to_owned());
    }
    for candidate in ["main", "master"] {
        if repo.rev_parse_opt(&format!("{prefix}{candidate}"))?.is_some() {
            tracing::debug!(remote, branch = candidate, "no remote HEAD; using fallback branch");
            return Ok(candidate.to_owned());
        }
    }
    Err(StitchError::UnresolvedRef {
        component: remote.to_owned(),
        reference: format!("{prefix}HEAD"),
    })
}

// ---------------------------------------------------------------------------
// Config persistence
// ---------------------------------------------------------------------------

/// Load the configured components, in configured order.
///
/// Returns an empty list when `stitch.remotes` is unset.
pub fn load(repo: &dyn GitRepo) -> Result<Vec<Component>, StitchError> {
    let Some(remotes) = repo.read_config(REMOTES_KEY)? else {
        return Ok(Vec::new());
    };

    let mut components = Vec::new();
    for name in remotes.split_whitespace() {
        let Some(branch) = repo.read_config(&format!("remote.{name}.stitch-branch"))? else {
            return Err(StitchError::NotConfigured {
                detail: format!("remote.{name}.stitch-branch is not set"),
            });
        };
        let subdir = repo
            .read_config(&format!("remote.{name}.stitch-subdir"))?
            .unwrap_or_else(|| WHOLE_REPO.to_owned());
        let dir = repo
            .read_config(&format!("remote.{name}.stitch-dir"))?
            .unwrap_or_else(|| name.to_owned());
        components.push(
            Component::new(name, branch)
                .with_source_subdir(&subdir)
                .with_mono_dir(dir),
        );
    }
    validate_set(&components)?;
    Ok(components)
}

/// Persist `components` as the configured set.
pub fn save(repo: &dyn GitRepo, components: &[Component]) -> Result<(), StitchError> {
    validate_set(components)?;
    for c in components {
        let section = format!("remote.{}", c.name);
        repo.write_config(&format!("{section}.stitch-branch"), &c.branch)?;
        repo.write_config(&format!("{section}.stitch-subdir"), &c.source_subdir)?;
        repo.write_config(&format!("{section}.stitch-dir"), &c.mono_dir)?;
    }
    let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
    repo.write_config(REMOTES_KEY, &names.join(" "))?;
    tracing::debug!(components = %names.join(","), "saved component config");
    Ok(())
}

/// Record `commit` as the most recent composite commit created by `init`.
pub fn record_base(repo: &dyn GitRepo, commit: GitOid) -> Result<(), StitchError> {
    repo.write_config(BASE_COMMIT_KEY, &commit.to_string())?;
    Ok(())
}
