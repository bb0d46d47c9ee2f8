use std::collections::HashSet;
use std::path::PathBuf;

pub const DEPTH_DEFAULT: u32 = 3;
pub const CUSTOM_CONTEXT_DEFAULT: u32 = 3;
pub const RESULT_PATH_DEFAULT: &str = "./results";
pub const STRUCTURED_EXTENSION: &str = "java";
pub const TEST_PATH_SEGMENT: &str = "test";

pub fn ignored_extensions_default() -> HashSet<String> {
    ["md", "txt", "markdown"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Run-level configuration, resolved from CLI flags. Unlike a
/// per-repository `git config` lookup, these describe properties of one
/// analysis run, not of the repository being analyzed.
pub struct Config {
    pub depth: u32,
    pub custom_context: u32,
    pub result_path: PathBuf,
    pub ignored_extensions: HashSet<String>,
    pub structured_extension: &'static str,
    pub continue_past_none: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            depth: DEPTH_DEFAULT,
            custom_context: CUSTOM_CONTEXT_DEFAULT,
            result_path: PathBuf::from(RESULT_PATH_DEFAULT),
            ignored_extensions: ignored_extensions_default(),
            structured_extension: STRUCTURED_EXTENSION,
            continue_past_none: false,
        }
    }
}
