use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HYPRLAND_INSTANCE_SIGNATURE is not set, is Hyprland running?")]
    MissingSignature,
    #[error("Failed to connect to Hyprland socket at {path}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error while talking to Hyprland")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse response to {command:?}")]
    Json {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
