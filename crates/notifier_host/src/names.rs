//! Well-known names, paths and interfaces of the StatusNotifier protocol.

pub const WATCHER_BUS: &str = "org.kde.StatusNotifierWatcher";
pub const WATCHER_OBJECT: &str = "/StatusNotifierWatcher";
pub const WATCHER_INTERFACE: &str = "org.kde.StatusNotifierWatcher";

pub const ITEM_INTERFACE: &str = "org.kde.StatusNotifierItem";
/// Object path used by items that register with just their bus name.
pub const ITEM_OBJECT: &str = "/StatusNotifierItem";

/// Prefix of the name a host claims on the bus, completed with `-{pid}-{nr}`.
pub const HOST_BUS_PREFIX: &str = "org.kde.StatusNotifierHost";
