//! Clicks coming back from the bar, and the compositor commands they turn into.

use anyhow::{Context, Result};
use hypr_ipc::Dispatch;
use serde::Deserialize;

use crate::app_groups::{Activation, AppGroups};

/// One line on stdin, e.g. `{"action": "activate", "class": "firefox"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum UiAction {
    /// Left click on an app: restore, focus or cycle.
    Activate { class: String },
    MinimizeAll { class: String },
    RestoreAll { class: String },
    /// Close the first window of the app.
    Close { class: String },
    CloseAll { class: String },
    NewInstance { class: String },
    SwitchWorkspace { id: i32 },
}

impl UiAction {
    pub fn parse_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).with_context(|| format!("Invalid action: {}", line.trim()))
    }

    /// Whether the app groups should be polled again right after this action, instead of
    /// waiting for the next tick.
    pub fn touches_apps(&self) -> bool {
        !matches!(self, UiAction::SwitchWorkspace { .. })
    }

    /// The compositor commands for this action, given the current groups.
    ///
    /// Actions on an app that is not (or no longer) known do nothing, except starting a new
    /// instance.
    pub fn plan(&self, groups: &AppGroups, active_address: Option<&str>, minimized_marker: &str) -> Vec<Dispatch> {
        let group_of = |class: &str| groups.get(&class.to_lowercase());
        match self {
            UiAction::Activate { class } => match group_of(class).and_then(|g| g.activation_target(active_address)) {
                Some(Activation::Restore(address)) => Dispatch::restore(&address).to_vec(),
                Some(Activation::Focus(address)) => vec![Dispatch::FocusWindow(address)],
                None => Vec::new(),
            },
            UiAction::MinimizeAll { class } => group_of(class)
                .map(|g| {
                    g.visible_windows()
                        .map(|w| Dispatch::MoveToWorkspaceSilent {
                            workspace: minimized_marker.to_string(),
                            address: w.address.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            UiAction::RestoreAll { class } => group_of(class)
                .map(|g| g.windows.iter().filter(|w| w.minimized).flat_map(|w| Dispatch::restore(&w.address)).collect())
                .unwrap_or_default(),
            UiAction::Close { class } => group_of(class)
                .and_then(|g| g.windows.first())
                .map(|w| vec![Dispatch::CloseWindow(w.address.clone())])
                .unwrap_or_default(),
            UiAction::CloseAll { class } => group_of(class)
                .map(|g| g.windows.iter().map(|w| Dispatch::CloseWindow(w.address.clone())).collect())
                .unwrap_or_default(),
            UiAction::NewInstance { class } => vec![Dispatch::Exec(class.to_lowercase())],
            UiAction::SwitchWorkspace { id } => vec![Dispatch::Workspace(*id)],
        }
    }
}
