use crate::persistence::CONFIG_DIR_NAME;
use crate::style::STYLE_FILE_NAME;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "hotclick.log";

/// Files and directories kept next to the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub style_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn from_exe_path(exe_path: &Path) -> Result<Self> {
        let parent = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
        Ok(Self::in_dir(parent))
    }

    pub fn in_dir(base: &Path) -> Self {
        Self {
            config_dir: base.join(CONFIG_DIR_NAME),
            style_file: base.join(STYLE_FILE_NAME),
            log_file: base.join(LOG_FILE_NAME),
        }
    }

    pub fn resolve() -> Result<Self> {
        let exe_path = std::env::current_exe().context("resolve current executable")?;
        Self::from_exe_path(&exe_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_sit_next_to_the_executable() {
        let paths = AppPaths::from_exe_path(Path::new("/opt/hotclick/hotclick.exe")).unwrap();
        assert_eq!(paths.config_dir, Path::new("/opt/hotclick/configs"));
        assert_eq!(paths.style_file, Path::new("/opt/hotclick/theme.json"));
        assert_eq!(paths.log_file, Path::new("/opt/hotclick/hotclick.log"));
    }

    #[test]
    fn bare_root_has_no_parent() {
        assert!(AppPaths::from_exe_path(Path::new("/")).is_err());
    }
}
