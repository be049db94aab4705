//! The presentation side. The bar itself is somebody else's job, this crate only tells it
//! what changed.

use std::io::Write;

use anyhow::Result;
use notifier_host::TrayItem;
use serde::Serialize;

use crate::{app_groups::AppGroup, indicators::WorkspaceButton};

/// Receives display updates. Only ever called from the UI thread.
pub trait Surface {
    fn workspaces(&mut self, buttons: &[WorkspaceButton]) -> Result<()>;
    fn window_title(&mut self, title: &str) -> Result<()>;
    /// Replace all app buttons.
    fn rebuild_apps(&mut self, groups: &[&AppGroup]) -> Result<()>;
    /// Update focus, minimized state and tooltip of the existing app buttons.
    fn patch_apps(&mut self, groups: &[&AppGroup]) -> Result<()>;
    fn tray(&mut self, items: &[TrayItem], available: bool) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct AppButton<'a> {
    #[serde(flatten)]
    group: &'a AppGroup,
    tooltip: String,
}

#[derive(Debug, Serialize)]
struct AppPatch<'a> {
    key: &'a str,
    focused: bool,
    all_minimized: bool,
    tooltip: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
enum Update<'a> {
    Workspaces { workspaces: &'a [WorkspaceButton] },
    WindowTitle { title: &'a str },
    Apps { apps: Vec<AppButton<'a>> },
    AppsPatch { apps: Vec<AppPatch<'a>> },
    Tray { available: bool, items: &'a [TrayItem] },
}

/// Writes one JSON object per update and line, e.g. for eww's `deflisten`.
pub struct JsonSurface<W: Write> {
    out: W,
}

impl<W: Write> JsonSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, update: &Update) -> Result<()> {
        serde_json::to_writer(&mut self.out, update)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Surface for JsonSurface<W> {
    fn workspaces(&mut self, buttons: &[WorkspaceButton]) -> Result<()> {
        self.emit(&Update::Workspaces { workspaces: buttons })
    }

    fn window_title(&mut self, title: &str) -> Result<()> {
        self.emit(&Update::WindowTitle { title })
    }

    fn rebuild_apps(&mut self, groups: &[&AppGroup]) -> Result<()> {
        let apps = groups.iter().map(|group| AppButton { group, tooltip: group.tooltip() }).collect();
        self.emit(&Update::Apps { apps })
    }

    fn patch_apps(&mut self, groups: &[&AppGroup]) -> Result<()> {
        let apps = groups
            .iter()
            .map(|g| AppPatch { key: &g.key, focused: g.focused, all_minimized: g.all_minimized, tooltip: g.tooltip() })
            .collect();
        self.emit(&Update::AppsPatch { apps })
    }

    fn tray(&mut self, items: &[TrayItem], available: bool) -> Result<()> {
        self.emit(&Update::Tray { available, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app_groups::GroupWindow, indicators::WorkspaceState};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lines(surface: JsonSurface<Vec<u8>>) -> Vec<serde_json::Value> {
        let out = String::from_utf8(surface.into_inner()).unwrap();
        out.lines().map(|line| serde_json::from_str(line).unwrap()).collect()
    }

    #[test]
    fn test_indicator_lines() {
        let mut surface = JsonSurface::new(Vec::new());
        surface.window_title("nvim").unwrap();
        surface
            .workspaces(&[WorkspaceButton { id: 1, name: "1".to_string(), state: WorkspaceState::Active }])
            .unwrap();

        assert_eq!(
            lines(surface),
            vec![
                json!({"kind": "window-title", "title": "nvim"}),
                json!({"kind": "workspaces", "workspaces": [{"id": 1, "name": "1", "state": "active"}]}),
            ]
        );
    }

    #[test]
    fn test_app_lines() {
        let group = AppGroup {
            key: "kitty".to_string(),
            display_title: "kitty".to_string(),
            windows: vec![GroupWindow { address: "0x1".to_string(), minimized: false }],
            focused: true,
            all_minimized: false,
        };
        let mut surface = JsonSurface::new(Vec::new());
        surface.rebuild_apps(&[&group]).unwrap();
        surface.patch_apps(&[&group]).unwrap();
        let tooltip = "kitty\n1 window(s)\nClick: Focus | Right-click: Options";

        assert_eq!(
            lines(surface),
            vec![
                json!({"kind": "apps", "apps": [{
                    "key": "kitty",
                    "display_title": "kitty",
                    "windows": [{"address": "0x1", "minimized": false}],
                    "focused": true,
                    "all_minimized": false,
                    "tooltip": tooltip,
                }]}),
                json!({"kind": "apps-patch", "apps": [{"key": "kitty", "focused": true, "all_minimized": false, "tooltip": tooltip}]}),
            ]
        );
    }

    #[test]
    fn test_tray_line() {
        let mut surface = JsonSurface::new(Vec::new());
        surface.tray(&[], false).unwrap();
        assert_eq!(lines(surface), vec![json!({"kind": "tray", "available": false, "items": []})]);
    }
}
