use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Locations of the two sockets belonging to one Hyprland instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPaths {
    instance_dir: PathBuf,
}

impl SocketPaths {
    /// Derive the socket directory from `XDG_RUNTIME_DIR` and `HYPRLAND_INSTANCE_SIGNATURE`.
    pub fn from_env() -> Result<Self> {
        let signature = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").map_err(|_| Error::MissingSignature)?;
        let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/run/user/1000".to_string());
        Self::from_parts(runtime_dir, &signature)
    }

    pub fn from_parts(runtime_dir: impl AsRef<Path>, signature: &str) -> Result<Self> {
        if signature.is_empty() {
            return Err(Error::MissingSignature);
        }
        Ok(Self { instance_dir: runtime_dir.as_ref().join("hypr").join(signature) })
    }

    /// Socket that streams events.
    pub fn event_socket(&self) -> PathBuf {
        self.instance_dir.join(".socket2.sock")
    }

    /// Socket that answers requests and dispatches.
    pub fn request_socket(&self) -> PathBuf {
        self.instance_dir.join(".socket.sock")
    }
}

impl std::fmt::Display for SocketPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.instance_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_socket_paths() {
        let paths = SocketPaths::from_parts("/run/user/1000", "abc_123").unwrap();
        assert_eq!(paths.event_socket(), PathBuf::from("/run/user/1000/hypr/abc_123/.socket2.sock"));
        assert_eq!(paths.request_socket(), PathBuf::from("/run/user/1000/hypr/abc_123/.socket.sock"));
    }

    #[test]
    fn test_empty_signature_is_rejected() {
        assert!(matches!(SocketPaths::from_parts("/tmp", ""), Err(Error::MissingSignature)));
    }
}
