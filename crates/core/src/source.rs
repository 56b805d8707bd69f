//! Where source text comes from.
//!
//! The [`SourceProvider`] trait keeps file I/O out of the front end so the
//! same code can parse from disk or from memory.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

pub trait SourceProvider {
    /// Read the whole source text at `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// The file name diagnostics and the tokenizer use for `path`. Two
    /// paths with the same name are the same file.
    fn file_name(&self, path: &Path) -> String {
        normalize_path(path).display().to_string()
    }
}

/// Reads through `std::fs`.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }
}

/// Serves sources from a map, mostly for tests and tools that already hold
/// the text.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(path, text)| (normalize_path(&path), text))
            .collect();
        Self { files }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.files.insert(normalize_path(path.as_ref()), text.into());
        self
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }
}

/// Resolve `.` and `..` components lexically.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }
    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize_path(Path::new("../x.cour")), PathBuf::from("../x.cour"));
    }

    #[test]
    fn leading_parent_dirs_are_all_kept() {
        assert_eq!(
            normalize_path(Path::new("../../x.cour")),
            PathBuf::from("../../x.cour")
        );
        assert_eq!(
            normalize_path(Path::new("a/../../b/x.cour")),
            PathBuf::from("../b/x.cour")
        );
        assert_eq!(normalize_path(Path::new("/../x.cour")), PathBuf::from("/x.cour"));
        assert_ne!(
            normalize_path(Path::new("../x.cour")),
            normalize_path(Path::new("../../x.cour"))
        );
    }

    #[test]
    fn in_memory_read_source_found() {
        let provider = InMemoryProvider::default().with_file("/src/a.cour", "{ }");
        let content = provider.read_source(Path::new("/src/./a.cour")).unwrap();
        assert_eq!(content, "{ }");
    }

    #[test]
    fn in_memory_read_source_not_found() {
        let provider = InMemoryProvider::new(HashMap::new());
        let err = provider.read_source(Path::new("/missing.cour")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn equivalent_paths_share_a_file_name() {
        let provider = FileSystemProvider;
        assert_eq!(
            provider.file_name(Path::new("src/../src/main.cour")),
            provider.file_name(Path::new("src/main.cour"))
        );
    }
}
