//! Configuration file resolution with global fallback.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `{project}/rulegate.toml` or `.rulegate.toml`
//! 3. `$RULEGATE_CONFIG_DIR/config.toml` or `~/.rulegate/config.toml` (global fallback)
//! 4. No config found → defaults

use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.rulegate/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => {
                write!(f, "{}", p.display())
            }
            Self::Default => f.write_str("default configuration"),
        }
    }
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["rulegate.toml", ".rulegate.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file path.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

/// Resolution with the global directory passed in.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    for name in PROJECT_CONFIG_NAMES {
        let candidate = project_dir.join(name);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "found project config");
            return ConfigSource::Project(candidate);
        }
    }

    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "found global config");
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

/// Returns the global config directory path.
///
/// Resolution: `$RULEGATE_CONFIG_DIR` > `~/.rulegate/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RULEGATE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".rulegate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Project and global directories, each optionally holding a config.
    struct Layout {
        project: TempDir,
        global: TempDir,
    }

    impl Layout {
        fn new(project_files: &[&str], global_config: bool) -> Self {
            let project = TempDir::new().unwrap();
            for name in project_files {
                fs::write(project.path().join(name), "").unwrap();
            }
            let global = TempDir::new().unwrap();
            if global_config {
                fs::write(global.path().join(GLOBAL_CONFIG_NAME), "").unwrap();
            }
            Self { project, global }
        }

        fn resolve(&self, explicit: Option<&Path>) -> ConfigSource {
            resolve_inner(
                self.project.path(),
                explicit,
                Some(self.global.path().to_path_buf()),
            )
        }
    }

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let layout = Layout::new(&["rulegate.toml"], true);
        let explicit = Path::new("/nonexistent/custom.toml");
        assert_eq!(
            layout.resolve(Some(explicit)),
            ConfigSource::Explicit(explicit.to_path_buf())
        );
    }

    #[test]
    fn project_names_in_priority_order() {
        let layout = Layout::new(&[".rulegate.toml"], true);
        assert_eq!(
            layout.resolve(None),
            ConfigSource::Project(layout.project.path().join(".rulegate.toml"))
        );

        let layout = Layout::new(&[".rulegate.toml", "rulegate.toml"], false);
        assert_eq!(
            layout.resolve(None),
            ConfigSource::Project(layout.project.path().join("rulegate.toml"))
        );
    }

    #[test]
    fn global_fallback() {
        let layout = Layout::new(&[], true);
        let source = layout.resolve(None);
        assert!(source.is_global());
        assert_eq!(source.path(), Some(layout.global.path().join("config.toml").as_path()));
    }

    #[test]
    fn defaults_when_nothing_found() {
        let layout = Layout::new(&[], false);
        assert_eq!(layout.resolve(None), ConfigSource::Default);

        let project = TempDir::new().unwrap();
        assert_eq!(resolve_inner(project.path(), None, None), ConfigSource::Default);
        assert!(ConfigSource::Default.path().is_none());
        assert!(!ConfigSource::Default.is_global());
    }

    #[test]
    fn display_names_the_source() {
        let source = ConfigSource::Project(PathBuf::from("app/rulegate.toml"));
        assert_eq!(source.to_string(), "app/rulegate.toml");
        assert_eq!(ConfigSource::Default.to_string(), "default configuration");
    }
}
