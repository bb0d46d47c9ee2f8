use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::Config;
use crate::differ::{CommitDiff, CommitDiffer};
use crate::facade::{Commit, FacadeError, RepositoryFacade};
use crate::graph::FileAnnotationGraph;
use crate::refiner::StructuralDiffRefiner;

/// Orchestrates the recursive, blame-driven descent.
/// Holds its own per-commit `CommitDiff` cache so that an ancestor visited
/// from two different branches of the recursion is not re-diffed -- blame
/// memoization itself lives on the facade.
pub struct Tracer<'a> {
    facade: &'a RepositoryFacade,
    differ: &'a CommitDiffer,
    refiner: &'a StructuralDiffRefiner,
    logger: &'a slog::Logger,
    config: &'a Config,
    diff_cache: RefCell<HashMap<String, Rc<CommitDiff>>>,
}

impl<'a> Tracer<'a> {
    pub fn new(
        facade: &'a RepositoryFacade,
        differ: &'a CommitDiffer,
        refiner: &'a StructuralDiffRefiner,
        logger: &'a slog::Logger,
        config: &'a Config,
    ) -> Self {
        Tracer {
            facade,
            differ,
            refiner,
            logger,
            config,
            diff_cache: RefCell::new(HashMap::new()),
        }
    }

    fn diff_of(&self, commit: &Commit) -> Option<Rc<CommitDiff>> {
        if let Some(cached) = self.diff_cache.borrow().get(&commit.hash) {
            return Some(Rc::clone(cached));
        }
        let diff = self.differ.diff(self.facade, commit).ok()?;
        let diff = Rc::new(diff);
        self.diff_cache
            .borrow_mut()
            .insert(commit.hash.clone(), Rc::clone(&diff));
        Some(diff)
    }

    /// Returns `None` once `step` reaches zero; otherwise a graph,
    /// possibly containing only the root marker.
    pub fn trace(&self, path: &str, source_commit: &Commit, step: u32) -> Option<FileAnnotationGraph> {
        if step == 0 {
            return None;
        }
        let source_diff = self.diff_of(source_commit)?;
        let hunk = source_diff.hunks.get(path)?;

        // Initialize the graph with the root commit marker before resolving
        // the parent, so a commit with no parent still returns a graph
        // containing just that marker rather than None.
        let mut graph = FileAnnotationGraph::new(path.to_string());
        graph.mark_root(source_commit.hash.clone());

        let parent = match self.facade.first_parent(source_commit) {
            Ok(parent) => parent,
            Err(_) => return Some(graph),
        };

        // Select deletion indices, intersected with the structural
        // refinement if this is a structured-language file.
        let deletion_indices: Vec<i64> = hunk.deleted.iter().map(|line| line.index).collect();
        let deletion_indices: Vec<i64> = if is_structured(path, self.config.structured_extension) {
            match self.refiner.refine(self.facade, path, source_commit, &parent) {
                Ok(refined) => deletion_indices
                    .into_iter()
                    .filter(|i| refined.contains(i))
                    .collect(),
                Err(_) => {
                    warn!(self.logger, "structural diff failed, refining to empty set";
                          "path" => path,
                          "commit" => &source_commit.hash,
                          "parent" => &parent.hash,
                    );
                    Vec::new()
                }
            }
        } else {
            deletion_indices
        };

        // Blame the parent revision.
        let blame = match self.facade.blame(&parent, path) {
            Ok(blame) => blame,
            Err(_) => return Some(graph),
        };

        // Group deletions by the ancestor blame attributes them to. A
        // deletion index blame cannot place anywhere (OutOfBounds) is still
        // recorded, under the parent commit itself -- blame reported the
        // line as unavailable in the ancestor, not that the ancestor
        // doesn't exist.
        let mut grouped: IndexMap<Commit, Vec<(i64, i64)>> = IndexMap::new();
        for index in deletion_indices {
            if index < 0 {
                continue;
            }
            let i = index as usize;
            match blame.source_commit(i) {
                Ok(ancestor) => {
                    let anc_line = blame.source_line(i).unwrap_or(-1);
                    grouped.entry(ancestor).or_default().push((index, anc_line));
                }
                Err(FacadeError::OutOfBounds { .. }) => {
                    grouped.entry(parent.clone()).or_default().push((index, -1));
                }
                Err(_) => continue,
            }
        }

        for (ancestor, pairs) in &grouped {
            graph.add_mapping(&ancestor.hash, pairs.iter().copied());
        }

        // Recurse, depth-first, breaking (or continuing, under the
        // compatibility switch) on the first ancestor whose sub-trace
        // returns None.
        for (ancestor, _) in &grouped {
            match self.trace(path, ancestor, step - 1) {
                Some(subgraph) => graph.attach_subgraph(&ancestor.hash, subgraph),
                None => {
                    if self.config.continue_past_none {
                        continue;
                    } else {
                        break;
                    }
                }
            }
        }

        Some(graph)
    }
}

fn is_structured(path: &str, structured_extension: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case(structured_extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::repo_utils;

    #[test]
    fn terminates_at_step_zero() {
        let (ctx, path) = repo_utils::prepare_repo();
        let facade = RepositoryFacade::open(ctx.dir.path()).unwrap();
        let differ = CommitDiffer::new(3);
        let refiner = StructuralDiffRefiner::new();
        let logger = slog::Logger::root(slog::Discard, o!());
        let config = Config::default();
        let tracer = Tracer::new(&facade, &differ, &refiner, &logger, &config);
        let head = facade
            .resolve(&ctx.repo.head().unwrap().peel_to_commit().unwrap().id().to_string())
            .unwrap();
        assert!(tracer
            .trace(path.to_str().unwrap(), &head, 0)
            .is_none());
    }

    #[test]
    fn single_modification_depth_one() {
        let (ctx, path) = repo_utils::prepare_repo();
        let commit_x = repo_utils::delete_a_line(&ctx, &path);

        let facade = RepositoryFacade::open(ctx.dir.path()).unwrap();
        let differ = CommitDiffer::new(3);
        let refiner = StructuralDiffRefiner::new();
        let logger = slog::Logger::root(slog::Discard, o!());
        let config = Config::default();
        let tracer = Tracer::new(&facade, &differ, &refiner, &logger, &config);

        let x = facade.resolve(&commit_x.to_string()).unwrap();
        let graph = tracer.trace(path.to_str().unwrap(), &x, 1).unwrap();

        assert_eq!(graph.revisions[0], commit_x.to_string());
        assert!(graph.revisions.len() >= 1);
        assert!(graph.sub_graphs.is_empty());
    }
}
