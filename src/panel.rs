//! Paths and common operations for the `panel/` directory.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::parser::config;

/// Walk upward from `start` to find the directory containing `panel/config.panel`.
pub fn find_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;
    loop {
        if config_path(dir).exists() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => bail!("no panel found; run `treepanel init` to initialise this directory"),
        }
    }
}

/// Walk upward from the current working directory to find the panel root.
pub fn find_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    find_root_from(&cwd)
}

pub fn panel_dir(root: &Path) -> PathBuf {
    root.join("panel")
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join("panel").join("config.panel")
}

pub fn data_path(root: &Path) -> PathBuf {
    root.join("panel").join("data.tsv")
}

pub fn variables_path(root: &Path) -> PathBuf {
    root.join("panel").join("variables.panel")
}

pub fn log_path(root: &Path) -> PathBuf {
    root.join("panel").join("debug.log")
}

pub fn load_config(root: &Path) -> Result<config::Config> {
    let content = std::fs::read_to_string(config_path(root))?;
    config::parse(&content)
}

/// Whether the panel's config asks for debug logging. Unreadable configs
/// report `false`; the command that loads them surfaces the error.
pub fn debug_enabled(root: &Path) -> bool {
    load_config(root).map(|c| c.debug).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_panel(root: &Path, config: &str) {
        fs::create_dir_all(panel_dir(root)).unwrap();
        fs::write(config_path(root), config).unwrap();
    }

    #[test]
    fn find_root_from_direct() {
        let dir = TempDir::new().unwrap();
        init_panel(dir.path(), "");
        let root = find_root_from(dir.path()).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_root_from_subdir() {
        let dir = TempDir::new().unwrap();
        init_panel(dir.path(), "");
        fs::create_dir_all(dir.path().join("reports/q3")).unwrap();
        let root = find_root_from(&dir.path().join("reports/q3")).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_root_fails_without_init() {
        let dir = TempDir::new().unwrap();
        assert!(find_root_from(dir.path()).is_err());
    }

    #[test]
    fn debug_flag_read_from_config() {
        let dir = TempDir::new().unwrap();
        init_panel(dir.path(), "debug: true\n");
        assert!(debug_enabled(dir.path()));
        init_panel(dir.path(), "debug: nope\n");
        assert!(!debug_enabled(dir.path()));
    }
}
