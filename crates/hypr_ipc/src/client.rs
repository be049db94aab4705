//! Requests against the Hyprland request socket (`.socket.sock`).
//!
//! Every request opens a fresh connection, writes the command and reads the reply until the
//! compositor closes the connection. Queries use the `j/` prefix to get JSON back.

use std::{
    io::{Read, Write},
    os::unix::net::UnixStream,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize};

use crate::{Error, Result, SocketPaths};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workspace {
    pub id: i32,
    pub name: String,
    pub windows: i32,
    #[serde(default)]
    pub monitor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Window {
    pub address: String,
    #[serde(default)]
    pub title: String,
    pub class: String,
    #[serde(default)]
    pub workspace: WorkspaceRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceRef {
    pub id: i32,
    pub name: String,
}

/// Commands sent through `dispatch`. The [`std::fmt::Display`] form is the wire text that
/// follows the `dispatch ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Dispatch {
    #[display("focuswindow address:{_0}")]
    FocusWindow(String),
    #[display("closewindow address:{_0}")]
    CloseWindow(String),
    #[display("movetoworkspacesilent {workspace},address:{address}")]
    MoveToWorkspaceSilent { workspace: String, address: String },
    #[display("movetoworkspace {workspace},address:{address}")]
    MoveToWorkspace { workspace: String, address: String },
    #[display("workspace {_0}")]
    Workspace(i32),
    #[display("exec {_0}")]
    Exec(String),
}

/// Workspace selector for "the workspace that is currently active".
pub const CURRENT_WORKSPACE: &str = "e+0";

impl Dispatch {
    /// Move a parked window to the current workspace, then focus it.
    pub fn restore(address: &str) -> [Dispatch; 2] {
        [
            Dispatch::MoveToWorkspace { workspace: CURRENT_WORKSPACE.to_string(), address: address.to_string() },
            Dispatch::FocusWindow(address.to_string()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct HyprlandClient {
    socket_path: PathBuf,
}

impl HyprlandClient {
    pub fn from_env() -> Result<Self> {
        Self::new(SocketPaths::from_env()?.request_socket())
    }

    /// Create a client for the given request socket. Fails if the socket does not exist.
    pub fn new(socket_path: impl AsRef<Path>) -> Result<Self> {
        let socket_path = socket_path.as_ref().to_owned();
        if !socket_path.exists() {
            return Err(Error::Connect {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "socket does not exist"),
                path: socket_path,
            });
        }
        Ok(Self { socket_path })
    }

    fn send_command(&self, command: &str) -> Result<String> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|source| Error::Connect { path: self.socket_path.clone(), source })?;
        stream.write_all(command.as_bytes())?;

        let mut response = String::new();
        stream.read_to_string(&mut response)?;
        Ok(response)
    }

    fn json_command<T: DeserializeOwned>(&self, command: &str) -> Result<T> {
        let response = self.send_command(&format!("j/{}", command))?;
        serde_json::from_str(&response).map_err(|source| Error::Json { command: command.to_string(), source })
    }

    pub fn clients(&self) -> Result<Vec<Window>> {
        self.json_command("clients")
    }

    /// The focused window, or `None` if nothing is focused.
    pub fn active_window(&self) -> Result<Option<Window>> {
        let response = self.send_command("j/activewindow")?;
        parse_active_window(&response)
    }

    pub fn workspaces(&self) -> Result<Vec<Workspace>> {
        self.json_command("workspaces")
    }

    pub fn active_workspace(&self) -> Result<Workspace> {
        self.json_command("activeworkspace")
    }

    pub fn dispatch(&self, dispatch: &Dispatch) -> Result<()> {
        log::debug!("dispatch {}", dispatch);
        self.send_command(&format!("dispatch {}", dispatch))?;
        Ok(())
    }
}

/// Hyprland answers `j/activewindow` with `{}` when no window is focused.
fn parse_active_window(response: &str) -> Result<Option<Window>> {
    let value: serde_json::Value =
        serde_json::from_str(response).map_err(|source| Error::Json { command: "activewindow".to_string(), source })?;
    if value.as_object().map_or(false, |obj| obj.is_empty()) {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(|source| Error::Json { command: "activewindow".to_string(), source })
}
