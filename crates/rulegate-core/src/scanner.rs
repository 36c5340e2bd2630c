//! File scanner: resolves inputs to files and reads each file once.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexSet;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::target::ScanTarget;

/// What to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// Glob patterns relative to the scan root.
    Patterns(Vec<String>),
    /// Explicit files or directories, e.g. from a staged-file lister.
    Paths(Vec<PathBuf>),
}

impl ScanInput {
    /// Creates a pattern input.
    pub fn patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Patterns(patterns.into_iter().map(Into::into).collect())
    }

    /// Creates an explicit path input.
    pub fn paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::Paths(paths.into_iter().map(Into::into).collect())
    }
}

/// Why a path was not scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SkipReason {
    /// The path does not exist (moved or deleted since enumeration).
    Missing,
    /// The path exists but is neither a regular file nor a directory.
    NotAFile,
    /// The file is not UTF-8 text (images, fonts, archives).
    NotText,
    /// The file could not be read.
    Unreadable {
        /// I/O error message.
        message: String,
    },
}

/// A path dropped by the scanner. Not a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSkip {
    /// The skipped path.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

impl ScanSkip {
    /// Whether the skip deserves a scan-level warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self.reason, SkipReason::Unreadable { .. })
    }
}

/// Result of a scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files read, in resolution order.
    pub targets: Vec<ScanTarget>,
    /// Paths that were dropped.
    pub skipped: Vec<ScanSkip>,
}

/// Errors that abort a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A glob pattern is malformed.
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying error.
        #[source]
        source: glob::PatternError,
    },
}

/// Resolves scan inputs to an order-stable, deduplicated file list and
/// reads each file exactly once.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    exclude: Vec<glob::Pattern>,
    respect_gitignore: bool,
}

impl Scanner {
    /// Creates a scanner rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }

    /// Adds an exclude glob, matched against root-relative paths.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pattern`] for a malformed pattern.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, ScanError> {
        let compiled = glob::Pattern::new(pattern).map_err(|source| ScanError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.exclude.push(compiled);
        Ok(self)
    }

    /// Sets whether directory walks honor `.gitignore` (default: true).
    #[must_use]
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves and reads all files for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pattern`] for malformed glob patterns. Missing or
    /// unreadable files are reported in [`ScanOutcome::skipped`], not as errors.
    pub fn scan(&self, input: &ScanInput) -> Result<ScanOutcome, ScanError> {
        let (paths, mut skipped) = self.resolve(input)?;
        let (targets, unreadable) = self.read_all(paths);
        skipped.extend(unreadable);

        info!(
            files = targets.len(),
            skipped = skipped.len(),
            "scan resolved"
        );
        Ok(ScanOutcome { targets, skipped })
    }

    /// Resolves `input` to existing regular files.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pattern`] for malformed glob patterns.
    pub fn resolve(&self, input: &ScanInput) -> Result<(Vec<PathBuf>, Vec<ScanSkip>), ScanError> {
        let mut files = IndexSet::new();
        let mut skipped = Vec::new();

        match input {
            ScanInput::Patterns(patterns) => {
                for pattern in patterns {
                    self.expand_pattern(pattern, &mut files, &mut skipped)?;
                }
            }
            ScanInput::Paths(paths) => {
                for path in paths {
                    self.expand_path(path, &mut files, &mut skipped);
                }
            }
        }

        Ok((files.into_iter().collect(), skipped))
    }

    /// Path as reported in skips: relative to the root when under it.
    fn reported(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        normalize(&if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        })
    }

    fn expand_pattern(
        &self,
        pattern: &str,
        files: &mut IndexSet<PathBuf>,
        skipped: &mut Vec<ScanSkip>,
    ) -> Result<(), ScanError> {
        let full = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            format!(
                "{}/{}",
                glob::Pattern::escape(&self.root.to_string_lossy()),
                pattern
            )
        };

        let entries = glob::glob(&full).map_err(|source| ScanError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut matched = 0usize;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    matched += 1;
                    self.push_file(normalize(&path), files);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %e.path().display(), "cannot access path: {}", e.error());
                    skipped.push(ScanSkip {
                        path: self.reported(e.path()),
                        reason: SkipReason::Unreadable {
                            message: e.error().to_string(),
                        },
                    });
                }
            }
        }

        debug!(pattern, matched, "expanded pattern");
        Ok(())
    }

    fn expand_path(&self, path: &Path, files: &mut IndexSet<PathBuf>, skipped: &mut Vec<ScanSkip>) {
        let full = self.absolute(path);

        if full.is_file() {
            self.push_file(full, files);
        } else if full.is_dir() {
            for file in self.walk(&full) {
                self.push_file(file, files);
            }
        } else if full.exists() {
            info!(path = %path.display(), "skipping non-regular file");
            skipped.push(ScanSkip {
                path: self.reported(&full),
                reason: SkipReason::NotAFile,
            });
        } else {
            info!(path = %path.display(), "skipping missing file");
            skipped.push(ScanSkip {
                path: self.reported(&full),
                reason: SkipReason::Missing,
            });
        }
    }

    fn walk(&self, dir: &Path) -> Vec<PathBuf> {
        if self.respect_gitignore {
            ignore::WalkBuilder::new(dir)
                .hidden(false)
                .require_git(false)
                .filter_entry(|entry| entry.file_name() != ".git")
                .sort_by_file_name(std::cmp::Ord::cmp)
                .build()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("walk error: {e}");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
                .map(|entry| normalize(entry.path()))
                .collect()
        } else {
            walkdir::WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.file_name() != ".git")
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("walk error: {e}");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| normalize(entry.path()))
                .collect()
        }
    }

    fn push_file(&self, path: PathBuf, files: &mut IndexSet<PathBuf>) {
        if self.is_excluded(&path) {
            debug!(path = %path.display(), "excluded");
            return;
        }
        files.insert(path);
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|p| p.matches(&relative))
    }

    /// Reads every path once, in parallel on the current rayon pool.
    ///
    /// Output order follows input order regardless of read timing.
    #[must_use]
    pub fn read_all(&self, paths: Vec<PathBuf>) -> (Vec<ScanTarget>, Vec<ScanSkip>) {
        let results: Vec<Result<ScanTarget, ScanSkip>> = paths
            .into_par_iter()
            .map(|path| {
                let reason = match std::fs::read(&path).map(String::from_utf8) {
                    Ok(Ok(content)) => return Ok(ScanTarget::new(path, content, &self.root)),
                    Ok(Err(_)) => {
                        debug!(path = %path.display(), "skipping non-text file");
                        SkipReason::NotText
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "cannot read file: {e}");
                        SkipReason::Unreadable {
                            message: e.to_string(),
                        }
                    }
                };
                Err(ScanSkip {
                    path: self.reported(&path),
                    reason,
                })
            })
            .collect();

        let mut targets = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(target) => targets.push(target),
                Err(skip) => skipped.push(skip),
            }
        }
        (targets, skipped)
    }
}

/// Lexically normalizes a path, dropping `.` components and folding `..`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
