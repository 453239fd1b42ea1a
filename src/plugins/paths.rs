//! Filesystem roots the adapters search.
//!
//! Adapters never call `dirs` themselves. They receive a [`HostPaths`], which
//! is either detected from the environment or rooted inside a scratch
//! directory so tests can build a complete fake home.

use std::path::{Path, PathBuf};

/// Directories adapters resolve their candidate paths against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    /// The user's home directory.
    pub home: PathBuf,
    /// `$XDG_CONFIG_HOME`, usually `~/.config`.
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME`, usually `~/.local/share`.
    pub data_dir: PathBuf,
    /// Prefix for system-wide locations such as `/usr/share`.
    pub root: PathBuf,
}

impl HostPaths {
    /// Resolve the real user directories.
    pub fn detect() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
        let data_dir = dirs::data_dir().unwrap_or_else(|| home.join(".local/share"));

        Self {
            home,
            config_dir,
            data_dir,
            root: PathBuf::from("/"),
        }
    }

    /// Lay out a complete host inside `root`, with the home at `root/home/user`.
    pub fn under(root: &Path) -> Self {
        let home = root.join("home/user");
        Self {
            config_dir: home.join(".config"),
            data_dir: home.join(".local/share"),
            home,
            root: root.to_path_buf(),
        }
    }

    /// A system path such as `/usr/share/themes`, placed under [`Self::root`].
    pub fn system(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_nests_everything_in_root() {
        let paths = HostPaths::under(Path::new("/tmp/fake"));
        assert_eq!(paths.home, PathBuf::from("/tmp/fake/home/user"));
        assert_eq!(paths.config_dir, PathBuf::from("/tmp/fake/home/user/.config"));
        assert_eq!(
            paths.data_dir,
            PathBuf::from("/tmp/fake/home/user/.local/share")
        );
        assert_eq!(
            paths.system("/usr/share/themes"),
            PathBuf::from("/tmp/fake/usr/share/themes")
        );
    }

    #[test]
    fn test_detected_system_paths_are_absolute() {
        let paths = HostPaths::detect();
        assert_eq!(
            paths.system("/usr/share/konsole"),
            PathBuf::from("/usr/share/konsole")
        );
    }
}
