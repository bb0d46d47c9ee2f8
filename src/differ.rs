use indexmap::IndexMap;
use serde::Serialize;

use crate::facade::{Commit, FacadeError, LineItem, RawPatch, RepositoryFacade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Other,
}

impl From<git2::Delta> for ChangeType {
    fn from(delta: git2::Delta) -> Self {
        match delta {
            git2::Delta::Added => ChangeType::Added,
            git2::Delta::Modified => ChangeType::Modified,
            git2::Delta::Deleted => ChangeType::Deleted,
            git2::Delta::Renamed => ChangeType::Renamed,
            git2::Delta::Copied => ChangeType::Copied,
            _ => ChangeType::Other,
        }
    }
}

/// A deletion or addition line, as exposed to the rest of the core: just
/// the zero-based index and the text, with no further git2 lineage.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub index: i64,
    #[serde(skip)]
    pub text: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Hunk {
    pub added: Vec<Line>,
    pub deleted: Vec<Line>,
}

/// Per-file hunks and change types for one commit against its first parent
///.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitDiff {
    pub hunks: IndexMap<String, Hunk>,
    pub change_types: IndexMap<String, ChangeType>,
}

/// Produces `CommitDiff`s from the facade's raw, diff-context-sensitive
/// patch lists. `context_lines` only affects how the underlying
/// git2 diff groups hunks together, never the set of changed lines.
pub struct CommitDiffer {
    context_lines: u32,
}

impl CommitDiffer {
    pub fn new(context_lines: u32) -> Self {
        CommitDiffer { context_lines }
    }

    pub fn diff(
        &self,
        facade: &RepositoryFacade,
        commit: &Commit,
    ) -> Result<CommitDiff, FacadeError> {
        let patches = facade.diff_to_parent(commit, self.context_lines)?;
        Ok(fold_patches(patches))
    }
}

fn fold_patches(patches: Vec<RawPatch>) -> CommitDiff {
    let mut diff = CommitDiff::default();
    for patch in patches {
        let change_type = ChangeType::from(patch.status);
        let key = if change_type == ChangeType::Deleted {
            patch.old_path.clone().or_else(|| patch.new_path.clone())
        } else {
            patch.new_path.clone().or_else(|| patch.old_path.clone())
        };
        let Some(path) = key else { continue };

        let hunk = diff.hunks.entry(path.clone()).or_default();
        for raw_hunk in &patch.hunks {
            hunk.added.extend(raw_hunk.added.lines.iter().map(to_line));
            hunk.deleted
                .extend(raw_hunk.removed.lines.iter().map(to_line));
        }
        diff.change_types.insert(path, change_type);
    }
    diff
}

fn to_line(item: &LineItem) -> Line {
    Line {
        index: item.index,
        text: item.text.clone(),
    }
}
