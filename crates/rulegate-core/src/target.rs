//! Scan targets: resolved files with cached content and metadata.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Metadata derived from a file's path, computed once per target.
///
/// Rules use it to scope applicability (e.g. skip test files) without
/// re-parsing the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
    /// Lowercase file extension without the dot.
    pub extension: Option<String>,
    /// Whether the file is detected as a test file.
    pub is_test: bool,
    /// Whether the file is a behavior file (`*.behavior.*`).
    pub is_behavior: bool,
    /// Whether the file is a story file (`*.stories.*`).
    pub is_story: bool,
    /// Component the file belongs to (the directory under `components/`).
    pub component: Option<String>,
}

impl FileMetadata {
    /// Derives metadata from a path relative to the scan root.
    #[must_use]
    pub fn from_relative_path(relative_path: &Path) -> Self {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            relative_path: relative_path.to_path_buf(),
            extension: relative_path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase()),
            is_test: detect_test_file(relative_path, &file_name),
            is_behavior: file_name.contains(".behavior.") || file_name.contains("-behavior."),
            is_story: file_name.contains(".stories."),
            component: detect_component(relative_path),
        }
    }

    /// Returns the relative path with `/` separators, for glob matching.
    #[must_use]
    pub fn relative_str(&self) -> String {
        self.relative_path.to_string_lossy().replace('\\', "/")
    }
}

/// Detects if a file is a test file based on path conventions.
fn detect_test_file(path: &Path, file_name: &str) -> bool {
    for component in path.components() {
        if let Component::Normal(s) = component {
            let s = s.to_string_lossy();
            if s == "tests" || s == "test" || s == "__tests__" || s == "benches" {
                return true;
            }
        }
    }

    file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.ends_with("_test.rs")
        || file_name.ends_with("_tests.rs")
        || file_name.starts_with("test_")
        || file_name == "tests.rs"
}

/// Finds the component directory, e.g. `src/components/usa-button/x.ts` -> `usa-button`.
fn detect_component(path: &Path) -> Option<String> {
    let parts: Vec<String> = path
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    parts
        .iter()
        .position(|p| p == "components")
        .and_then(|i| parts.get(i + 1).cloned())
}

/// A resolved file plus its cached content and metadata.
///
/// Content is read once by the scanner and shared by every rule. Cloning a
/// target is cheap; the content buffer is reference counted.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    path: PathBuf,
    content: Arc<str>,
    line_starts: Arc<[usize]>,
    metadata: FileMetadata,
}

impl ScanTarget {
    /// Creates a target from a path and its already-read content.
    ///
    /// `root` is stripped from `path` to compute the relative path used in
    /// findings; pass an empty path to keep `path` as-is.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Arc<str>>, root: &Path) -> Self {
        let path = path.into();
        let content = content.into();
        let relative = path
            .strip_prefix(root)
            .map_or_else(|_| path.clone(), Path::to_path_buf);
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            metadata: FileMetadata::from_relative_path(&relative),
            path,
            content,
            line_starts,
        }
    }

    /// Path the file was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the scan root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.metadata.relative_path
    }

    /// Cached file content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Derived metadata.
    #[must_use]
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Number of lines in the file.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    /// Returns the text of a 1-indexed line, without its line terminator.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        if start > self.content.len() || (start == self.content.len() && line > 1) {
            return None;
        }
        let end = self
            .line_starts
            .get(line)
            .map_or(self.content.len(), |next| next - 1);
        let text = &self.content[start..end];
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    /// Returns the 1-indexed `(line, column)` for a byte offset.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> (usize, usize) {
        let index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.line_starts[index];
        let column = self
            .content
            .get(start..offset)
            .map_or(1, |prefix| prefix.chars().count() + 1);
        (index + 1, column)
    }
}
