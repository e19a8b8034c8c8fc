use crate::config::Config;
use crate::errors::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Finds the source files a batch should process.
///
/// Selection is by file extension only; the comment scanner itself knows
/// nothing about file types. Results are sorted by path, so repeated runs
/// visit files in the same order.
#[derive(Debug, Clone)]
pub struct FileCollector {
    extensions: Vec<String>,
    case_sensitive: bool,
    exclude: Vec<String>,
}

impl Default for FileCollector {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl FileCollector {
    /// Creates a collector for the given extensions (without leading dots).
    pub fn new(extensions: Vec<String>, case_sensitive: bool) -> Self {
        Self {
            extensions,
            case_sensitive,
            exclude: Vec::new(),
        }
    }

    /// Creates a collector using the selection settings of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extensions.clone(), config.case_sensitive).with_exclude(config.exclude.clone())
    }

    /// Skips any directory whose name is in `exclude`.
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Returns `true` if `path` has one of the selected extensions.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(OsStr::to_str) else {
            return false;
        };
        if self.case_sensitive {
            self.extensions.iter().any(|e| e == ext)
        } else {
            self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude.iter().any(|ex| ex == name))
    }

    /// Recursively lists every selected file under `root`, sorted by path.
    ///
    /// An empty result is not an error. Subdirectories that cannot be read
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRoot`] if `root` does not exist or is not a directory.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::InvalidRoot {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        tracing::debug!(root = %root.display(), count = files.len(), "collected files");
        Ok(files)
    }
}

/// The main entry point for the `list` command.
pub fn run_list(dir: PathBuf, config: &Config) -> Result<()> {
    let files = FileCollector::from_config(config).collect(&dir)?;
    for path in &files {
        println!("{}", path.display());
    }
    tracing::info!(count = files.len(), "listed files");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "int x;\n").unwrap();
        path
    }

    #[test]
    fn test_collects_only_c_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let c = touch(root, "c.c");
        let a = touch(root, "a.c");
        let b = touch(root, "b.c");
        touch(root, "notes.txt");

        let files = FileCollector::default().collect(root).unwrap();
        assert_eq!(files, vec![a, b, c]);
    }

    #[test]
    fn test_recurses_and_includes_headers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let header = touch(root, "include/api.h");
        let nested = touch(root, "src/net/socket.c");
        let top = touch(root, "main.c");
        touch(root, "src/net/socket.o");

        let files = FileCollector::default().collect(root).unwrap();
        assert_eq!(files, vec![header, top, nested]);
    }

    #[test]
    fn test_extension_case_sensitivity() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let upper = touch(root, "LEGACY.C");
        let lower = touch(root, "modern.c");

        let strict = FileCollector::default().collect(root).unwrap();
        assert_eq!(strict, vec![lower.clone()]);

        let relaxed = FileCollector::new(vec!["c".into(), "h".into()], false)
            .collect(root)
            .unwrap();
        assert_eq!(relaxed, vec![upper, lower]);
    }

    #[test]
    fn test_excluded_directories_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let kept = touch(root, "src/lib.c");
        touch(root, "build/gen.c");
        touch(root, "src/build/deep.h");

        let files = FileCollector::default()
            .with_exclude(vec!["build".into()])
            .collect(root)
            .unwrap();
        assert_eq!(files, vec![kept]);
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "readme.md");
        assert!(FileCollector::default().collect(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            FileCollector::default().collect(&missing),
            Err(Error::InvalidRoot { .. })
        ));

        let file = touch(temp_dir.path(), "file.c");
        assert!(matches!(
            FileCollector::default().collect(&file),
            Err(Error::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_extensionless_and_dotfiles_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "Makefile");
        touch(root, ".c");
        let real = touch(root, "x.h");

        assert_eq!(FileCollector::default().collect(root).unwrap(), vec![real]);
    }
}
