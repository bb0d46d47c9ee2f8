use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::differ::CommitDiff;
use crate::graph::FileAnnotationGraph;

const PARSED_COMMITS_FILE: &str = "parsed_commits.json";
const ANNOTATION_GRAPH_FILE: &str = "annotation_graph.json";

fn ensure_result_path(logger: &slog::Logger, result_path: &Path, default_path: &Path) -> Result<()> {
    if result_path == default_path {
        warn!(logger, "no result path given, writing under default location";
              "path" => result_path.display().to_string(),
        );
    }
    std::fs::create_dir_all(result_path)
        .with_context(|| format!("could not create result directory {}", result_path.display()))
}

pub fn write_parsed_commits(
    logger: &slog::Logger,
    result_path: &Path,
    default_path: &Path,
    commits: &IndexMap<String, CommitDiff>,
) -> Result<()> {
    ensure_result_path(logger, result_path, default_path)?;
    let path = result_path.join(PARSED_COMMITS_FILE);
    let file = File::create(&path)
        .with_context(|| format!("could not create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), commits)
        .with_context(|| format!("could not serialize {}", path.display()))
}

pub fn write_annotation_graph(
    logger: &slog::Logger,
    result_path: &Path,
    default_path: &Path,
    graphs: &IndexMap<String, Vec<Option<FileAnnotationGraph>>>,
) -> Result<()> {
    ensure_result_path(logger, result_path, default_path)?;
    let path = result_path.join(ANNOTATION_GRAPH_FILE);
    let file = File::create(&path)
        .with_context(|| format!("could not create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), graphs)
        .with_context(|| format!("could not serialize {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discard_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, o!())
    }

    #[test]
    fn writes_both_files_under_result_path() {
        let dir = tempfile::tempdir().unwrap();
        let result_path = dir.path().join("out");
        let default_path = Path::new("./results");

        let commits: IndexMap<String, CommitDiff> = IndexMap::new();
        write_parsed_commits(&discard_logger(), &result_path, default_path, &commits).unwrap();

        let graphs: IndexMap<String, Vec<Option<FileAnnotationGraph>>> = IndexMap::new();
        write_annotation_graph(&discard_logger(), &result_path, default_path, &graphs).unwrap();

        assert!(result_path.join(PARSED_COMMITS_FILE).exists());
        assert!(result_path.join(ANNOTATION_GRAPH_FILE).exists());
    }

    #[test]
    fn creates_missing_result_path() {
        let dir = tempfile::tempdir().unwrap();
        let result_path = dir.path().join("nested").join("out");
        let default_path = Path::new("./results");

        let commits: IndexMap<String, CommitDiff> = IndexMap::new();
        write_parsed_commits(&discard_logger(), &result_path, default_path, &commits).unwrap();
        assert!(result_path.is_dir());
    }
}
