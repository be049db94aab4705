use hypr_ipc::{Window, Workspace};
use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceState {
    Active,
    Occupied,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceButton {
    pub id: i32,
    pub name: String,
    pub state: WorkspaceState,
}

/// Regular workspaces sorted by id. Special workspaces (negative ids) are hidden.
pub fn workspace_buttons(workspaces: &[Workspace], active_id: i32) -> Vec<WorkspaceButton> {
    workspaces
        .iter()
        .filter(|ws| ws.id >= 0)
        .sorted_by_key(|ws| ws.id)
        .map(|ws| WorkspaceButton {
            id: ws.id,
            name: ws.name.clone(),
            state: if ws.id == active_id {
                WorkspaceState::Active
            } else if ws.windows > 0 {
                WorkspaceState::Occupied
            } else {
                WorkspaceState::Empty
            },
        })
        .collect()
}

/// Title of the focused window, or its class if it has none.
pub fn window_title(active: Option<&Window>) -> String {
    match active {
        Some(window) if window.title.is_empty() => window.class.clone(),
        Some(window) => window.title.clone(),
        None => String::new(),
    }
}
