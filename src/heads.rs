//! Component discovery and head resolution for a base commit.
//!
//! The object store does not record which parent of a composite commit came
//! from which component, so each component is matched to a parent by tree
//! equality. When no parent matches, the parent at the component's index is
//! used instead and the match is reported as [`HeadMatch::Positional`].

use serde::Serialize;
use stitch_git::{CommitInfo, GitOid, GitRepo};
use tracing::{debug, warn};

use crate::component::{self, Component};
use crate::error::StitchError;

/// How a component's starting commit was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadMatch {
    /// A parent's (sub)tree equals the component's directory in the base.
    Exact,
    /// No parent matched; the parent at the component's index was used.
    Positional,
}

/// Where a component's reconstructed branch starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentHead {
    /// The component.
    pub component: Component,
    /// The origin commit the branch starts from.
    pub commit: GitOid,
    /// How `commit` was chosen.
    pub matched: HeadMatch,
}

/// Components of a composite tree: its top-level directories, sorted by name.
///
/// A configured component placed at the same directory supplies name, remote
/// and source subdirectory. Other directories become whole-repository
/// components named after the directory.
pub fn discover_components(
    repo: &dyn GitRepo,
    base_tree: GitOid,
    configured: &[Component],
) -> Result<Vec<Component>, StitchError> {
    let mut dirs: Vec<String> = repo
        .read_tree(base_tree)?
        .into_iter()
        .filter(|e| e.mode.is_tree())
        .map(|e| e.name)
        .collect();
    dirs.sort();

    let components: Vec<Component> = dirs
        .into_iter()
        .map(|dir| {
            configured
                .iter()
                .find(|c| c.mono_dir == dir)
                .cloned()
                .unwrap_or_else(|| Component::new(dir, "HEAD"))
        })
        .collect();
    component::validate_set(&components)?;
    Ok(components)
}

/// Match every component to a parent of `base`.
///
/// Exact matches prefer a parent no earlier component has claimed, so two
/// components with identical content still get distinct parents when the
/// base has them.
///
/// # Errors
/// [`StitchError::UnmatchedComponent`] if a component has no exact match and
/// `base` has no parent at its index.
pub fn resolve_heads(
    repo: &dyn GitRepo,
    base_oid: GitOid,
    base: &CommitInfo,
    components: &[Component],
) -> Result<Vec<ComponentHead>, StitchError> {
    let parent_trees = base
        .parents
        .iter()
        .map(|p| Ok(repo.read_commit(*p)?.tree_oid))
        .collect::<Result<Vec<GitOid>, StitchError>>()?;

    let mut claimed = vec![false; base.parents.len()];
    let mut heads = Vec::with_capacity(components.len());
    for (index, component) in components.iter().enumerate() {
        let target = repo
            .tree_at_path(base.tree_oid, &component.mono_dir)?
            .filter(|e| e.mode.is_tree())
            .map(|e| e.oid);

        let mut exact = Vec::new();
        if let Some(target) = target {
            for (i, tree) in parent_trees.iter().enumerate() {
                if component.source_tree(repo, *tree)? == Some(target) {
                    exact.push(i);
                }
            }
        }

        let head = match exact.iter().find(|i| !claimed[**i]).or_else(|| exact.first()) {
            Some(&i) => {
                debug!(component = %component.name, parent = %base.parents[i], "exact tree match");
                claimed[i] = true;
                ComponentHead {
                    component: component.clone(),
                    commit: base.parents[i],
                    matched: HeadMatch::Exact,
                }
            }
            None => {
                let Some(&parent) = base.parents.get(index) else {
                    return Err(StitchError::UnmatchedComponent {
                        component: component.name.clone(),
                        base: base_oid,
                        parents: base.parents.len(),
                    });
                };
                warn!(
                    component = %component.name,
                    %parent,
                    index,
                    "no parent tree matches; falling back to positional parent, history may be misattributed"
                );
                claimed[index] = true;
                ComponentHead {
                    component: component.clone(),
                    commit: parent,
                    matched: HeadMatch::Positional,
                }
            }
        };
        heads.push(head);
    }
    Ok(heads)
}
