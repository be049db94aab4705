use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Stores references to all the paths relevant to hyprstatus.
#[derive(Debug, Clone)]
pub struct StatusPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl StatusPaths {
    /// Use an explicitly given config file. Unlike the default location, it has to exist.
    pub fn from_config_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();
        if config_file.is_dir() {
            bail!("Please provide the path to the config file, not the directory containing it")
        }
        if !config_file.exists() {
            bail!("Configuration file {} does not exist", config_file.display());
        }
        let config_dir = config_file.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(StatusPaths { config_dir, config_file: config_file.to_path_buf() })
    }

    pub fn from_config_dir<P: AsRef<Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        StatusPaths { config_file: config_dir.join("config.toml"), config_dir }
    }

    /// `$XDG_CONFIG_HOME/hyprstatus`, falling back to `~/.config/hyprstatus`.
    pub fn default() -> Result<Self> {
        let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(".config"),
                None => bail!("Neither XDG_CONFIG_HOME nor HOME is set"),
            },
        };
        Ok(Self::from_config_dir(config_home.join("hyprstatus")))
    }

    pub fn get_config_file(&self) -> &Path {
        self.config_file.as_path()
    }
}

impl std::fmt::Display for StatusPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config-dir: {}, config-file: {}", self.config_dir.display(), self.config_file.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_file_in_dir() {
        let paths = StatusPaths::from_config_dir("/home/user/.config/hyprstatus");
        assert_eq!(paths.get_config_file(), Path::new("/home/user/.config/hyprstatus/config.toml"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        assert!(StatusPaths::from_config_file("/definitely/not/here.toml").is_err());
        assert!(StatusPaths::from_config_file(std::env::temp_dir()).is_err());
    }
}
