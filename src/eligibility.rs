use std::collections::HashSet;

use crate::config::TEST_PATH_SEGMENT;
use crate::differ::CommitDiff;

/// A file is eligible for tracing iff (i) no path component is exactly
/// `test`, (ii) its extension is not in the ignore list, and (iii) it has
/// deletions recorded in the commit's diff.
pub fn is_eligible(path: &str, diff: &CommitDiff, ignored_extensions: &HashSet<String>) -> bool {
    if path.split('/').any(|segment| segment == TEST_PATH_SEGMENT) {
        return false;
    }

    if let Some(ext) = extension_of(path) {
        if ignored_extensions.contains(&ext) {
            return false;
        }
    }

    match diff.hunks.get(path) {
        Some(hunk) => !hunk.deleted.is_empty(),
        None => false,
    }
}

fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::{ChangeType, Hunk};
    use indexmap::IndexMap;

    fn diff_with(path: &str, deleted_count: usize) -> CommitDiff {
        let mut hunks = IndexMap::new();
        let mut hunk = Hunk::default();
        for i in 0..deleted_count {
            hunk.deleted.push(crate::differ::Line {
                index: i as i64,
                text: Vec::new(),
            });
        }
        hunks.insert(path.to_string(), hunk);
        let mut change_types = IndexMap::new();
        change_types.insert(path.to_string(), ChangeType::Modified);
        CommitDiff { hunks, change_types }
    }

    fn ignored() -> HashSet<String> {
        crate::config::ignored_extensions_default()
    }

    #[test]
    fn rejects_test_path_segment() {
        let diff = diff_with("src/test/FooTest.c", 1);
        assert!(!is_eligible("src/test/FooTest.c", &diff, &ignored()));
    }

    #[test]
    fn accepts_path_containing_test_as_substring_only() {
        let diff = diff_with("src/testing/Foo.java", 1);
        assert!(is_eligible("src/testing/Foo.java", &diff, &ignored()));
    }

    #[test]
    fn rejects_ignored_extension() {
        let diff = diff_with("README.md", 1);
        assert!(!is_eligible("README.md", &diff, &ignored()));
    }

    #[test]
    fn rejects_file_with_no_deletions() {
        let diff = diff_with("src/Foo.c", 0);
        assert!(!is_eligible("src/Foo.c", &diff, &ignored()));
    }

    #[test]
    fn rejects_file_absent_from_diff() {
        let diff = diff_with("src/Foo.c", 1);
        assert!(!is_eligible("src/Bar.c", &diff, &ignored()));
    }

    #[test]
    fn accepts_eligible_file() {
        let diff = diff_with("src/Foo.c", 1);
        assert!(is_eligible("src/Foo.c", &diff, &ignored()));
    }
}
