//! Runtime configuration: sandbox roots and size limits.

use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filesystem sandbox configuration. Read-only: `slurp` is the only
/// filesystem builtin, so there is no write/list/stat surface to configure.
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: vec![PathBuf::from("./boot"), PathBuf::from("./data")],
            max_file_size: 10 * 1024 * 1024,
        }
    }
}
