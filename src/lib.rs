#[macro_use]
extern crate slog;

use std::path::Path;

use anyhow::Result;

mod differ;
mod driver;
mod eligibility;
mod facade;
mod graph;
mod issues;
mod output;
mod refiner;
mod tracer;

pub mod config;

pub use config::Config;
pub use differ::{ChangeType, CommitDiff, CommitDiffer, Hunk, Line};
pub use facade::{Commit, FacadeError, RepositoryFacade};
pub use graph::FileAnnotationGraph;
pub use issues::{FixCommitRecord, FixCommitSet};
pub use tracer::Tracer;

pub fn run(logger: &slog::Logger, config: &Config, repo_path: &Path, issues_path: &Path) -> Result<()> {
    let facade = RepositoryFacade::open(repo_path)?;
    debug!(logger, "repository found"; "path" => repo_path.display().to_string());

    let fix_commits = issues::load_fix_commits(logger, issues_path);
    debug!(logger, "loaded fix commit export"; "count" => fix_commits.len());

    let differ = CommitDiffer::new(config.custom_context);
    let refiner = refiner::StructuralDiffRefiner::new();
    let tracer = Tracer::new(&facade, &differ, &refiner, logger, config);

    let result = driver::run(logger, config, &facade, &differ, &tracer, &fix_commits);

    let default_path = Path::new(config::RESULT_PATH_DEFAULT);
    output::write_parsed_commits(
        logger,
        &config.result_path,
        default_path,
        &result.parsed_commits,
    )?;
    output::write_annotation_graph(
        logger,
        &config.result_path,
        default_path,
        &result.annotation_graphs,
    )?;

    Ok(())
}
