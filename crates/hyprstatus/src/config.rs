//! The `config.toml` file. Every section and every key is optional.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ui::Section;

pub const DEFAULT_MINIMIZED_WORKSPACE: &str = "special:minimized";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    pub modules: ModulesConfig,
    pub intervals: IntervalsConfig,
    pub app_tracker: AppTrackerConfig,
}

/// Which indicators are active.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModulesConfig {
    pub workspaces: bool,
    pub window_title: bool,
    pub app_tracker: bool,
    pub systray: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self { workspaces: true, window_title: true, app_tracker: true, systray: true }
    }
}

impl ModulesConfig {
    pub fn enabled(&self, section: Section) -> bool {
        match section {
            Section::Workspaces => self.workspaces,
            Section::WindowTitle => self.window_title,
            Section::Apps => self.app_tracker,
            Section::Tray => self.systray,
        }
    }

    /// Whether anything needs the compositor at all.
    pub fn needs_compositor(&self) -> bool {
        self.workspaces || self.window_title || self.app_tracker
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntervalsConfig {
    /// Seconds between two polls of the open windows.
    pub app_tracker: u64,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self { app_tracker: 2 }
    }
}

impl IntervalsConfig {
    pub fn app_tracker(&self) -> Duration {
        Duration::from_secs(self.app_tracker.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppTrackerConfig {
    /// Windows on a workspace whose name starts with this are shown as minimized.
    pub minimized_workspace: String,
}

impl Default for AppTrackerConfig {
    fn default() -> Self {
        Self { minimized_workspace: DEFAULT_MINIMIZED_WORKSPACE.to_string() }
    }
}

impl StatusConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read the config file. A missing file yields the defaults.
    pub fn read_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Like [`StatusConfig::read_from_file`], but logs errors and falls back to the defaults.
    pub fn read_or_default(path: &Path) -> Self {
        match Self::read_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{:?}", err);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        let config = StatusConfig::parse("").unwrap();
        assert_eq!(config, StatusConfig::default());
        assert!(config.modules.enabled(Section::Tray));
        assert_eq!(config.intervals.app_tracker(), Duration::from_secs(2));
        assert_eq!(config.app_tracker.minimized_workspace, "special:minimized");
    }

    #[test]
    fn test_partial_sections() {
        let config = StatusConfig::parse(
            r#"
            [modules]
            systray = false

            [app_tracker]
            minimized_workspace = "special:hidden"
            "#,
        )
        .unwrap();
        assert!(!config.modules.enabled(Section::Tray));
        assert!(config.modules.enabled(Section::Apps));
        assert!(config.modules.needs_compositor());
        assert_eq!(config.intervals, IntervalsConfig::default());
        assert_eq!(config.app_tracker.minimized_workspace, "special:hidden");
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = StatusConfig::parse("[intervals]\napp_tracker = 0").unwrap();
        assert_eq!(config.intervals.app_tracker(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_config() {
        assert!(StatusConfig::parse("[modules]\nsystray = \"yes\"").is_err());
        assert!(StatusConfig::parse("[modules]\nclock = true").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = StatusConfig::read_from_file(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config, StatusConfig::default());
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let path = std::env::temp_dir().join(format!("hyprstatus-test-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[intervals]\napp_tracker = -3").unwrap();
        assert_eq!(StatusConfig::read_or_default(&path), StatusConfig::default());
        std::fs::remove_file(&path).unwrap();
    }
}
