use crate::config::Config;
use crate::errors::{Error, Result};
use crate::stripper::{strip_comment_bytes, strip_comments};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

const BACKUP_EXTENSION: &str = "bak";

/// How file contents that are not valid UTF-8 are turned into scannable text.
///
/// None of the policies ever fails a file; they only differ in what happens
/// to the offending bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Scan the raw bytes, keeping invalid sequences exactly as they are.
    #[default]
    Preserve,
    /// Replace invalid sequences with U+FFFD.
    Replace,
    /// Drop invalid bytes.
    Skip,
}

impl DecodePolicy {
    /// Removes comments from `bytes`, decoding them according to this policy.
    pub fn strip(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            DecodePolicy::Preserve => strip_comment_bytes(bytes),
            DecodePolicy::Replace => strip_comments(&String::from_utf8_lossy(bytes)).into_bytes(),
            DecodePolicy::Skip => {
                let mut text = String::with_capacity(bytes.len());
                for chunk in bytes.utf8_chunks() {
                    text.push_str(chunk.valid());
                }
                strip_comments(&text).into_bytes()
            }
        }
    }
}

/// Options for processing a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// If `true`, a `.bak` file will be created before modifying a file.
    pub create_backup: bool,
    /// If `true`, changes will be calculated but not written to disk.
    pub dry_run: bool,
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The file had nothing to strip and was not touched.
    Unchanged,
    /// The file was rewritten (or would have been, in a dry run).
    Rewritten {
        /// Size difference between the original and the stripped content.
        bytes_removed: usize,
    },
}

impl RewriteOutcome {
    /// `true` if the file content changed.
    pub fn is_rewritten(&self) -> bool {
        matches!(self, RewriteOutcome::Rewritten { .. })
    }
}

/// Statistics from a `restore` operation.
#[derive(Debug, Default)]
pub struct RestoreStats {
    /// The number of backup files found.
    pub found: usize,
    /// The number of files successfully restored from backups.
    pub restored: usize,
}

/// Strips comments from one file at a time, in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRewriter {
    decode: DecodePolicy,
    options: ProcessOptions,
}

impl FileRewriter {
    /// Creates a new `FileRewriter`.
    pub fn new(decode: DecodePolicy, options: ProcessOptions) -> Self {
        Self { decode, options }
    }

    /// Creates a rewriter using the decode and backup settings of `config`.
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self::new(
            config.decode,
            ProcessOptions {
                create_backup: config.backup,
                dry_run,
            },
        )
    }

    /// The options this rewriter applies to every file.
    pub fn options(&self) -> ProcessOptions {
        self.options
    }

    /// Processes a single file.
    ///
    /// The file is read as bytes and stripped according to the decode policy.
    /// Only if the result differs from the original bytes is anything written:
    /// first the optional backup, then the new content through a temporary
    /// file that is renamed over the original. Any I/O failure is returned as
    /// [`Error::FileAccess`].
    pub fn process(&self, path: &Path) -> Result<RewriteOutcome> {
        let original = fs::read(path).map_err(|e| Error::file_access(path, e))?;
        let stripped = self.decode.strip(&original);

        if stripped == original {
            tracing::debug!(path = %path.display(), "no comments");
            return Ok(RewriteOutcome::Unchanged);
        }

        let outcome = RewriteOutcome::Rewritten {
            bytes_removed: original.len().saturating_sub(stripped.len()),
        };
        if self.options.dry_run {
            tracing::debug!(path = %path.display(), "dry run, not writing");
            return Ok(outcome);
        }

        if self.options.create_backup {
            fs::copy(path, backup_path(path)).map_err(|e| Error::file_access(path, e))?;
        }
        write_atomically(path, &stripped).map_err(|e| Error::file_access(path, e))?;
        tracing::debug!(path = %path.display(), ?outcome, "rewrote file");

        Ok(outcome)
    }

    /// Scans a directory for `.bak` files and restores them.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory to scan for backup files.
    /// * `keep_backups` - If `false`, the `.bak` files will be deleted after being restored.
    pub fn restore(dir: &Path, keep_backups: bool) -> Result<RestoreStats> {
        if !dir.is_dir() {
            return Err(Error::InvalidRoot {
                path: dir.to_path_buf(),
            });
        }

        let mut stats = RestoreStats::default();
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|s| s.to_str()) != Some(BACKUP_EXTENSION)
            {
                continue;
            }

            stats.found += 1;
            let original_path = path.with_extension("");
            fs::copy(path, &original_path).map_err(|e| Error::file_access(&original_path, e))?;
            if !keep_backups {
                fs::remove_file(path).map_err(|e| Error::file_access(path, e))?;
            }
            stats.restored += 1;
            tracing::info!(path = %original_path.display(), "restored from backup");
        }

        Ok(stats)
    }
}

/// `main.c` becomes `main.c.bak`.
fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(BACKUP_EXTENSION);
    PathBuf::from(name)
}

/// Replaces the content of `path` without ever exposing a partially written file.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(contents)?;

    // Preserve file permissions
    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// The main entry point for the `restore` command.
pub fn run_restore(dir: PathBuf, keep_backups: bool) -> Result<()> {
    let stats = FileRewriter::restore(&dir, keep_backups)?;
    println!(
        "\nBackups found: {}, restored: {}",
        stats.found, stats.restored
    );
    Ok(())
}
