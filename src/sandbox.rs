//! Capability-based, read-only filesystem access for the `slurp` builtin.
//!
//! The only filesystem operation the language exposes is "read a whole file
//! into a string", so the sandbox only needs a read path, unlike a
//! general-purpose embedding that also offers writes/listing/stat.

use crate::config::FsConfig;
use cap_std::fs::Dir;

#[derive(Debug, Clone)]
pub enum SandboxError {
    PathNotAllowed(String),
    FileNotFound(String),
    FileTooLarge(String),
    IoError(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::PathNotAllowed(path) => {
                write!(f, "access denied: {} is not in allowed paths", path)
            }
            SandboxError::FileNotFound(path) => write!(f, "file not found: {}", path),
            SandboxError::FileTooLarge(msg) => write!(f, "file too large: {}", msg),
            SandboxError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SandboxError {}

pub struct Sandbox {
    fs_roots: Vec<Dir>,
    fs_config: FsConfig,
}

impl Sandbox {
    pub fn new(fs_config: FsConfig) -> Result<Self, SandboxError> {
        let mut fs_roots = Vec::new();
        for path in &fs_config.allowed_paths {
            std::fs::create_dir_all(path).map_err(|e| {
                SandboxError::IoError(format!("cannot create {}: {}", path.display(), e))
            })?;
            let dir = Dir::open_ambient_dir(path, cap_std::ambient_authority()).map_err(|e| {
                SandboxError::IoError(format!("cannot open {}: {}", path.display(), e))
            })?;
            fs_roots.push(dir);
        }
        Ok(Self { fs_roots, fs_config })
    }

    /// Read a file's contents, trying each sandbox root in order.
    pub fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        if path.starts_with('/') || path.starts_with('\\') || path.contains("..") {
            return Err(SandboxError::PathNotAllowed(path.to_string()));
        }

        for root in &self.fs_roots {
            match root.metadata(path) {
                Ok(meta) => {
                    if meta.len() as usize > self.fs_config.max_file_size {
                        return Err(SandboxError::FileTooLarge(format!(
                            "{} bytes exceeds limit of {} bytes",
                            meta.len(),
                            self.fs_config.max_file_size
                        )));
                    }
                    return root.read_to_string(path).map_err(|e| {
                        SandboxError::IoError(format!("cannot read {}: {}", path, e))
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(SandboxError::IoError(format!("cannot stat {}: {}", path, e))),
            }
        }

        Err(SandboxError::FileNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_file_from_an_allowed_root() {
        let dir = std::env::temp_dir().join(format!("gel-sandbox-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut f = std::fs::File::create(dir.join("hello.gel")).unwrap();
        f.write_all(b"(+ 1 2)").unwrap();

        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            max_file_size: 1024,
        })
        .unwrap();
        assert_eq!(sandbox.read_file("hello.gel").unwrap(), "(+ 1 2)");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_path_traversal_and_absolute_paths() {
        let dir = std::env::temp_dir().join(format!("gel-sandbox-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![dir.clone()],
            max_file_size: 1024,
        })
        .unwrap();
        assert!(sandbox.read_file("../etc/passwd").is_err());
        assert!(sandbox.read_file("/etc/passwd").is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
