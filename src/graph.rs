use indexmap::IndexMap;
use serde::Serialize;

/// The recursive annotation graph. Each subgraph is exclusively
/// owned by the mapping entry that introduces it, since the recursion the
/// Tracer performs is a depth-bounded DAG unfolding, not a cyclic structure
/// -- there is never a reason to share a subgraph between two parents.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnnotationGraph {
    pub file_path: String,
    pub revisions: Vec<String>,
    pub mappings: IndexMap<String, IndexMap<i64, i64>>,
    pub sub_graphs: IndexMap<String, FileAnnotationGraph>,
}

impl FileAnnotationGraph {
    pub fn new(file_path: impl Into<String>) -> Self {
        FileAnnotationGraph {
            file_path: file_path.into(),
            revisions: Vec::new(),
            mappings: IndexMap::new(),
            sub_graphs: IndexMap::new(),
        }
    }

    /// Append `commit_hash` to `revisions` without creating a mapping entry
    /// for it. Used once, for the root commit whose deletions are being
    /// traced -- it appears first in `revisions` but never owns a
    /// `mappings` entry of its own.
    pub fn mark_root(&mut self, commit_hash: impl Into<String>) {
        self.revisions.push(commit_hash.into());
    }

    /// Merge `pairs` into the inner mapping for `commit_hash`, first-writer-
    /// wins on duplicate child-line keys. If `commit_hash` has
    /// not been seen before it is appended to `revisions`.
    pub fn add_mapping(
        &mut self,
        commit_hash: &str,
        pairs: impl IntoIterator<Item = (i64, i64)>,
    ) {
        if !self.mappings.contains_key(commit_hash) {
            self.revisions.push(commit_hash.to_string());
            self.mappings
                .insert(commit_hash.to_string(), IndexMap::new());
        }
        let inner = self.mappings.get_mut(commit_hash).expect("just inserted");
        for (child_line, parent_line) in pairs {
            inner.entry(child_line).or_insert(parent_line);
        }
    }

    /// Attach (or replace) the subgraph for `commit_hash`. At most one
    /// subgraph per ancestor commit; a later call overwrites an earlier one.
    pub fn attach_subgraph(&mut self, commit_hash: &str, subgraph: FileAnnotationGraph) {
        self.sub_graphs.insert(commit_hash.to_string(), subgraph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_is_empty() {
        let graph = FileAnnotationGraph::new("foo.c");
        assert_eq!(graph.file_path, "foo.c");
        assert!(graph.revisions.is_empty());
        assert!(graph.mappings.is_empty());
        assert!(graph.sub_graphs.is_empty());
    }

    #[test]
    fn mark_root_then_add_mapping_preserves_order() {
        let mut graph = FileAnnotationGraph::new("foo.c");
        graph.mark_root("X");
        graph.add_mapping("P", [(10, 4)]);
        assert_eq!(graph.revisions, vec!["X".to_string(), "P".to_string()]);
        assert_eq!(graph.mappings["P"][&10], 4);
    }

    #[test]
    fn add_mapping_merges_and_appends_revision_once() {
        let mut graph = FileAnnotationGraph::new("foo.c");
        graph.add_mapping("P", [(1, 10)]);
        graph.add_mapping("P", [(2, 20)]);
        assert_eq!(graph.revisions, vec!["P".to_string()]);
        assert_eq!(graph.mappings["P"].len(), 2);
    }

    #[test]
    fn add_mapping_is_first_writer_wins() {
        let mut graph = FileAnnotationGraph::new("foo.c");
        graph.add_mapping("P", [(1, 10)]);
        graph.add_mapping("P", [(1, 999)]);
        assert_eq!(graph.mappings["P"][&1], 10);
    }

    #[test]
    fn attach_subgraph_overwrites() {
        let mut graph = FileAnnotationGraph::new("foo.c");
        graph.add_mapping("P", [(1, 10)]);
        graph.attach_subgraph("P", FileAnnotationGraph::new("foo.c"));
        let mut replacement = FileAnnotationGraph::new("foo.c");
        replacement.mark_root("marker");
        graph.attach_subgraph("P", replacement);
        assert_eq!(graph.sub_graphs["P"].revisions, vec!["marker".to_string()]);
    }

    #[test]
    fn sub_graph_keys_are_always_present_in_mappings() {
        let mut graph = FileAnnotationGraph::new("foo.c");
        graph.add_mapping("P", [(1, 10)]);
        graph.attach_subgraph("P", FileAnnotationGraph::new("foo.c"));
        assert!(graph.sub_graphs.keys().all(|k| graph.mappings.contains_key(k)));
    }
}
