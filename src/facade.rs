use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

/// Errors raised by the repository facade.
///
/// Every variant here corresponds to one of the error kinds the core is
/// allowed to surface; everything finer than this is swallowed by the
/// caller (the Tracer) and logged instead of propagated.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("could not open repository at {path}")]
    RepositoryAccess {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },
    #[error("commit {0} not found")]
    NotFound(String),
    #[error("commit {0} has no parent")]
    NoParent(String),
    #[error("blame of {path} at {commit} failed")]
    BlameFailed {
        path: String,
        commit: String,
        #[source]
        source: git2::Error,
    },
    #[error("line {index} is out of bounds for the blamed revision")]
    OutOfBounds { index: usize },
    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// An opaque commit handle. The core only ever carries the hash string
/// around; it never holds on to a borrowed `git2::Commit`, so graphs and
/// tracer frames have no lifetime tied to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Commit {
    pub hash: String,
}

impl Commit {
    pub fn new(hash: impl Into<String>) -> Self {
        Commit { hash: hash.into() }
    }
}

/// A single line of a hunk, as read off a `git2::Patch`.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub index: i64,
    pub text: Vec<u8>,
}

/// One side (added or removed) of a raw hunk.
#[derive(Debug, Clone, Default)]
pub struct LineBlock {
    pub start: u32,
    pub lines: Vec<LineItem>,
    pub trailing_newline: bool,
}

#[derive(Debug, Clone)]
pub struct RawHunk {
    pub added: LineBlock,
    pub removed: LineBlock,
}

/// An owned, lifetime-free view of one file's diff against its parent.
/// This is the facade's translation of `git2::Patch` -- the git2 objects
/// themselves never outlive `diff_to_parent`.
#[derive(Debug, Clone)]
pub struct RawPatch {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub status: git2::Delta,
    pub hunks: Vec<RawHunk>,
}

/// Blame results, eagerly materialized into an owned, zero-based vector so
/// that the underlying `git2::Blame` (and the repository borrow it holds)
/// is released before this value is handed back to the caller.
#[derive(Debug, Clone)]
pub struct BlameResult {
    lines: Vec<(String, i64)>,
}

impl BlameResult {
    pub fn source_commit(&self, i: usize) -> Result<Commit, FacadeError> {
        self.lines
            .get(i)
            .map(|(hash, _)| Commit::new(hash.clone()))
            .ok_or(FacadeError::OutOfBounds { index: i })
    }

    pub fn source_line(&self, i: usize) -> Result<i64, FacadeError> {
        self.lines
            .get(i)
            .map(|(_, line)| *line)
            .ok_or(FacadeError::OutOfBounds { index: i })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Read-only access to commits, trees, file blobs, diffs and blame.
///
/// This is the only place `git2::Repository` is touched; everything above
/// it in the core deals exclusively in `Commit` handles and owned bytes.
pub struct RepositoryFacade {
    repo: git2::Repository,
    blame_cache: RefCell<HashMap<(String, String), Rc<BlameResult>>>,
}

impl RepositoryFacade {
    pub fn open(path: &Path) -> Result<Self, FacadeError> {
        let repo =
            git2::Repository::discover(path).map_err(|source| FacadeError::RepositoryAccess {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(RepositoryFacade {
            repo,
            blame_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn resolve(&self, hash: &str) -> Result<Commit, FacadeError> {
        let oid = git2::Oid::from_str(hash).map_err(|_| FacadeError::NotFound(hash.to_string()))?;
        self.repo
            .find_commit(oid)
            .map_err(|_| FacadeError::NotFound(hash.to_string()))?;
        Ok(Commit::new(hash.to_string()))
    }

    pub fn first_parent(&self, commit: &Commit) -> Result<Commit, FacadeError> {
        let oid = git2::Oid::from_str(&commit.hash)
            .map_err(|_| FacadeError::NotFound(commit.hash.clone()))?;
        let git_commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| FacadeError::NotFound(commit.hash.clone()))?;
        let parent = git_commit
            .parent(0)
            .map_err(|_| FacadeError::NoParent(commit.hash.clone()))?;
        Ok(Commit::new(parent.id().to_string()))
    }

    pub fn read_file(&self, commit: &Commit, path: &str) -> Result<Option<Vec<u8>>, FacadeError> {
        let oid = git2::Oid::from_str(&commit.hash)
            .map_err(|_| FacadeError::NotFound(commit.hash.clone()))?;
        let git_commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| FacadeError::NotFound(commit.hash.clone()))?;
        let tree = git_commit.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(_) => return Ok(None),
        };
        match self.repo.find_blob(entry.id()) {
            Ok(blob) => Ok(Some(blob.content().to_vec())),
            Err(_) => Ok(None),
        }
    }

    /// Blame `path` as of `start`, pinning `newest_commit` to `start` so
    /// that no line is ever attributed to a revision newer than it. Memoized
    /// by `(commit, path)` -- see the design note on blame caching.
    pub fn blame(&self, start: &Commit, path: &str) -> Result<Rc<BlameResult>, FacadeError> {
        let key = (start.hash.clone(), path.to_string());
        if let Some(cached) = self.blame_cache.borrow().get(&key) {
            return Ok(Rc::clone(cached));
        }

        let newest = git2::Oid::from_str(&start.hash)
            .map_err(|_| FacadeError::NotFound(start.hash.clone()))?;

        let mut opts = git2::BlameOptions::new();
        opts.newest_commit(newest);

        let blame = self
            .repo
            .blame_file(Path::new(path), Some(&mut opts))
            .map_err(|source| FacadeError::BlameFailed {
                path: path.to_string(),
                commit: start.hash.clone(),
                source,
            })?;

        // Each hunk covers a contiguous range of lines in `start`'s version
        // of the file (the "final" side, since newest_commit == start).
        // Place entries by that index rather than assuming hunks arrive in
        // increasing order, since libgit2 does not document that they must.
        let mut lines: Vec<Option<(String, i64)>> = vec![None; blame.len()];
        for hunk in blame.iter() {
            let commit_hash = hunk.final_commit_id().to_string();
            let final_start = hunk.final_start_line();
            let orig_start = hunk.orig_start_line();
            for offset in 0..hunk.lines_in_hunk() {
                let current_index = (final_start + offset - 1) as usize;
                let ancestor_line = (orig_start + offset) as i64 - 1;
                if current_index < lines.len() {
                    lines[current_index] = Some((commit_hash.clone(), ancestor_line));
                }
            }
        }
        // libgit2 guarantees every line of the blamed revision is covered by
        // exactly one hunk; fall back to the start commit itself with a
        // sentinel line so a lookup never panics if that guarantee is ever
        // violated by a future libgit2 version.
        let lines: Vec<(String, i64)> = lines
            .into_iter()
            .map(|entry| entry.unwrap_or_else(|| (start.hash.clone(), -1)))
            .collect();

        let result = Rc::new(BlameResult { lines });
        self.blame_cache
            .borrow_mut()
            .insert(key, Rc::clone(&result));
        Ok(result)
    }

    /// Diff `commit` against its first parent (or an empty tree for a root
    /// commit) and return owned patches. Mirrors `owned::parse_diff` /
    /// `owned::OwnedPatch`, adapted to carry line text instead of git2
    /// borrows so the result can cross an arbitrary number of recursive
    /// tracer frames.
    pub fn diff_to_parent(
        &self,
        commit: &Commit,
        context_lines: u32,
    ) -> Result<Vec<RawPatch>, FacadeError> {
        let oid = git2::Oid::from_str(&commit.hash)
            .map_err(|_| FacadeError::NotFound(commit.hash.clone()))?;
        let git_commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| FacadeError::NotFound(commit.hash.clone()))?;
        let tree = git_commit.tree()?;
        let parent_tree = git_commit.parent(0).ok().map(|p| p.tree()).transpose()?;

        let mut diff_options = git2::DiffOptions::new();
        diff_options
            .context_lines(context_lines)
            .ignore_filemode(true)
            .ignore_submodules(true);

        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_options))?;

        let mut patches = Vec::with_capacity(diff.deltas().count());
        for delta_idx in 0..diff.deltas().count() {
            let patch = match git2::Patch::from_diff(&diff, delta_idx)? {
                Some(patch) => patch,
                None => continue,
            };
            patches.push(owned_patch(patch)?);
        }
        Ok(patches)
    }
}

fn owned_patch(mut patch: git2::Patch) -> Result<RawPatch, FacadeError> {
    let delta = patch.delta();
    let raw = RawPatch {
        old_path: delta.old_file().path().map(|p| p.to_string_lossy().into_owned()),
        new_path: delta.new_file().path().map(|p| p.to_string_lossy().into_owned()),
        status: delta.status(),
        hunks: owned_hunks(&mut patch)?,
    };
    Ok(raw)
}

fn owned_hunks(patch: &mut git2::Patch) -> Result<Vec<RawHunk>, FacadeError> {
    let mut hunks = Vec::with_capacity(patch.num_hunks());
    for idx in 0..patch.num_hunks() {
        let (hunk, _size) = patch.hunk(idx)?;
        let mut ret = RawHunk {
            added: LineBlock {
                start: hunk.new_start(),
                lines: Vec::with_capacity(hunk.new_lines() as usize),
                trailing_newline: true,
            },
            removed: LineBlock {
                start: hunk.old_start(),
                lines: Vec::with_capacity(hunk.old_lines() as usize),
                trailing_newline: true,
            },
        };

        for line_idx in 0..patch.num_lines_in_hunk(idx)? {
            let line = patch.line_in_hunk(idx, line_idx)?;
            match line.origin() {
                '+' => {
                    if let Some(lineno) = line.new_lineno() {
                        ret.added.lines.push(LineItem {
                            index: lineno as i64 - 1,
                            text: line.content().to_vec(),
                        });
                    }
                }
                '-' => {
                    if let Some(lineno) = line.old_lineno() {
                        ret.removed.lines.push(LineItem {
                            index: lineno as i64 - 1,
                            text: line.content().to_vec(),
                        });
                    }
                }
                '>' => ret.removed.trailing_newline = false,
                '<' => ret.added.trailing_newline = false,
                _ => {}
            }
        }

        hunks.push(ret);
    }
    Ok(hunks)
}
