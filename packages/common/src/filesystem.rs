use crate::error::CommonError;
use crate::result::CommonResult;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

/// File access used by the commit flow and the template node manager.
///
/// Paths are project-relative. Failures are reported through the return
/// value; callers decide whether a missing file is an error.
pub trait FileOperations: Send + Sync {
    fn read_file(&self, path: &str) -> Option<String>;

    fn write_file(&self, path: &str, content: &str) -> bool;

    fn write_binary(&self, path: &str, bytes: &[u8]) -> bool;

    fn file_exists(&self, path: &str) -> bool;
}

/// Real file system rooted at a project directory
#[derive(Debug, Clone)]
pub struct RealFileSystem {
    root: PathBuf,
}

impl RealFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a project-relative path, rejecting anything that climbs out of the root
    pub fn resolve(&self, path: &str) -> CommonResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(CommonError::OutsideRoot(path.to_string()));
                }
            }
        }

        Ok(resolved)
    }

    fn write_bytes(&self, path: &str, bytes: &[u8]) -> CommonResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, bytes)?;
        Ok(())
    }
}

impl FileOperations for RealFileSystem {
    fn read_file(&self, path: &str) -> Option<String> {
        let full = self.resolve(path).ok()?;
        match std::fs::read_to_string(&full) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", full.display(), e);
                None
            }
        }
    }

    fn write_file(&self, path: &str, content: &str) -> bool {
        self.write_binary(path, content.as_bytes())
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> bool {
        match self.write_bytes(path, bytes) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", path, e);
                false
            }
        }
    }

    fn file_exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// In-memory file system for testing
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, content: &str) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(normalize(path), content.as_bytes().to_vec());
        }
    }

    /// Raw bytes of a file, text or binary
    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(&normalize(path)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

impl FileOperations for MockFileSystem {
    fn read_file(&self, path: &str) -> Option<String> {
        self.bytes(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    fn write_file(&self, path: &str, content: &str) -> bool {
        self.write_binary(path, content.as_bytes())
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> bool {
        match self.files.lock() {
            Ok(mut files) => {
                files.insert(normalize(path), bytes.to_vec());
                true
            }
            Err(_) => false,
        }
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(&normalize(path)))
            .unwrap_or(false)
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_round_trip() {
        let fs = MockFileSystem::new();
        fs.add_file("/app/page.tsx", "export default 1;");

        assert!(fs.file_exists("app/page.tsx"));
        assert_eq!(fs.read_file("./app/page.tsx").as_deref(), Some("export default 1;"));

        assert!(fs.write_binary("public/images/a.png", &[0x89, 0x50]));
        assert_eq!(fs.bytes("public/images/a.png"), Some(vec![0x89, 0x50]));
        assert_eq!(fs.paths(), vec!["app/page.tsx", "public/images/a.png"]);
    }

    #[test]
    fn test_real_fs_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem::new(dir.path());

        assert!(!fs.file_exists("app/page.tsx"));
        assert!(fs.write_file("app/page.tsx", "<div />"));
        assert!(fs.file_exists("/app/page.tsx"));
        assert_eq!(fs.read_file("app/page.tsx").as_deref(), Some("<div />"));
        assert!(dir.path().join("app/page.tsx").is_file());
    }

    #[test]
    fn test_real_fs_rejects_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem::new(dir.path());

        assert!(matches!(
            fs.resolve("../outside.txt"),
            Err(CommonError::OutsideRoot(_))
        ));
        assert!(!fs.write_file("app/../../outside.txt", "x"));
        assert!(fs.read_file("../etc/passwd").is_none());
    }
}
