//! A StatusNotifierHost that keeps track of the tray items registered with the session's
//! StatusNotifierWatcher.
//!
//! See <https://freedesktop.org/wiki/Specifications/StatusNotifierItem/> for the protocol.

mod error;
pub use error::*;

pub mod names;

pub mod proxy;

mod host;
pub use host::*;

mod item;
pub use item::*;

mod registry;
pub use registry::*;
