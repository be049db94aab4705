//! Client side of the Hyprland IPC sockets.
//!
//! Hyprland exposes two unix sockets per instance: `.socket2.sock`, which streams
//! newline-delimited `KIND>>DATA` events to every connected client, and `.socket.sock`, which
//! answers one request per connection. [`EventListener`] consumes the former and
//! [`HyprlandClient`] speaks the latter.

mod error;
pub use error::*;

pub mod client;
pub use client::{Dispatch, HyprlandClient, Window, Workspace, WorkspaceRef};

pub mod events;
pub use events::{Event, EventListener, HyprEvent};

mod socket;
pub use socket::*;
