//! Proxies for DBus services, so we can call them.
//!
//! Only the members this host uses are declared. For the full interfaces see the
//! [StatusNotifierItem](https://freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierItem/)
//! and [StatusNotifierWatcher](https://freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierWatcher/)
//! specifications, and ["Writing a client proxy" in the zbus tutorial](https://dbus2.github.io/zbus/).

mod dbus_status_notifier_item;
pub use dbus_status_notifier_item::*;

mod dbus_status_notifier_watcher;
pub use dbus_status_notifier_watcher::*;
