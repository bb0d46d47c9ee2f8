use indexmap::IndexMap;

use crate::config::Config;
use crate::differ::{CommitDiff, CommitDiffer};
use crate::eligibility::is_eligible;
use crate::facade::RepositoryFacade;
use crate::graph::FileAnnotationGraph;
use crate::issues::FixCommitSet;
use crate::tracer::Tracer;

/// Per-commit diffs and the per-commit, per-eligible-file annotation graphs
/// produced by one run.
pub struct DriverOutput {
    pub parsed_commits: IndexMap<String, CommitDiff>,
    pub annotation_graphs: IndexMap<String, Vec<Option<FileAnnotationGraph>>>,
}

/// Resolve, diff, filter and trace every fix commit in `fix_commits`, in the
/// order they were supplied.
pub fn run(
    logger: &slog::Logger,
    config: &Config,
    facade: &RepositoryFacade,
    differ: &CommitDiffer,
    tracer: &Tracer,
    fix_commits: &FixCommitSet,
) -> DriverOutput {
    let mut parsed_commits = IndexMap::new();
    let mut annotation_graphs = IndexMap::new();

    for record in fix_commits.values() {
        let commit = match facade.resolve(&record.hash) {
            Ok(commit) => commit,
            Err(err) => {
                warn!(logger, "fix commit not found, skipping";
                      "hash" => &record.hash,
                      "err" => err.to_string(),
                );
                continue;
            }
        };

        let diff = match differ.diff(facade, &commit) {
            Ok(diff) => diff,
            Err(err) => {
                warn!(logger, "could not diff fix commit, skipping";
                      "hash" => &record.hash,
                      "err" => err.to_string(),
                );
                continue;
            }
        };

        let mut graphs = Vec::new();
        for path in diff.hunks.keys() {
            if !is_eligible(path, &diff, &config.ignored_extensions) {
                continue;
            }
            graphs.push(tracer.trace(path, &commit, config.depth));
        }

        annotation_graphs.insert(commit.hash.clone(), graphs);
        parsed_commits.insert(commit.hash.clone(), diff);
    }

    DriverOutput {
        parsed_commits,
        annotation_graphs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::FixCommitRecord;
    use crate::refiner::StructuralDiffRefiner;
    use crate::tests::log_utils;

    #[test]
    fn unresolvable_fix_commit_is_skipped_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init_opts(
            dir.path(),
            git2::RepositoryInitOptions::new().initial_head("master"),
        )
        .unwrap();
        let signature = git2::Signature::now("nobody", "nobody@example.com").unwrap();
        {
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
                .unwrap();
        }

        let facade = RepositoryFacade::open(dir.path()).unwrap();
        let differ = CommitDiffer::new(3);
        let refiner = StructuralDiffRefiner::new();
        let config = Config::default();

        let mut capturing_logger = log_utils::CapturingLogger::new();
        let tracer = Tracer::new(&facade, &differ, &refiner, &capturing_logger.logger, &config);

        let mut fix_commits = FixCommitSet::new();
        fix_commits.insert(
            "BUG-1".to_string(),
            FixCommitRecord {
                hash: "0".repeat(40),
                resolutiondate: "d".to_string(),
                commitdate: "d".to_string(),
                creationdate: "d".to_string(),
            },
        );

        let output = run(
            &capturing_logger.logger,
            &config,
            &facade,
            &differ,
            &tracer,
            &fix_commits,
        );

        assert!(output.parsed_commits.is_empty());
        assert!(output.annotation_graphs.is_empty());

        let logs = capturing_logger.visible_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["msg"], "fix commit not found, skipping");
    }
}
