use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

/// One entry of the externally-mined bug-fix commit export. Extra
/// fields in the source JSON are ignored rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct FixCommitRecord {
    pub hash: String,
    pub resolutiondate: String,
    pub commitdate: String,
    pub creationdate: String,
}

pub type FixCommitSet = IndexMap<String, FixCommitRecord>;

/// Parse the bug-fix commit export at `path`. Mining bug-fix commits from
/// an issue tracker is out of scope for this core -- this function
/// only consumes that miner's output, and treats a missing or malformed
/// file as "nothing to trace" rather than a fatal error, since a caller
/// asking to trace specific commits should not be blocked by an unrelated
/// mining step having failed upstream.
pub fn load_fix_commits(logger: &slog::Logger, path: &Path) -> FixCommitSet {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(logger, "bug-fix commit export missing, proceeding with an empty set";
                  "path" => path.display().to_string(),
                  "err" => err.to_string(),
            );
            return FixCommitSet::new();
        }
    };

    match serde_json::from_str::<FixCommitSet>(&contents) {
        Ok(set) => set,
        Err(err) => {
            warn!(logger, "bug-fix commit export malformed, proceeding with an empty set";
                  "path" => path.display().to_string(),
                  "err" => err.to_string(),
            );
            FixCommitSet::new()
        }
    }
}
