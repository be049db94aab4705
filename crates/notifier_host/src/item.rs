use crate::*;

use std::{future::Future, time::Duration};

use serde::Serialize;

/// Where a StatusNotifierItem lives on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemAddress {
    pub service: String,
    /// Object path, always starting with `/`.
    pub path: String,
}

impl ItemAddress {
    /// Parse the service string that the watcher hands out.
    ///
    /// The format is `{bus}` or `{bus}{object_path}` (e.g.
    /// `:1.50/org/ayatana/NotificationItem/nm_applet`). Without a path, the item is assumed to
    /// live at [`names::ITEM_OBJECT`].
    pub fn parse(service: &str) -> Self {
        match service.split_once('/') {
            Some((bus, path)) => Self { service: bus.to_owned(), path: format!("/{}", path) },
            None => Self { service: service.to_owned(), path: names::ITEM_OBJECT.to_owned() },
        }
    }

    /// The item key, `service + path`, used to deduplicate items.
    pub fn key(&self) -> String {
        format!("{}{}", self.service, self.path)
    }
}

impl std::fmt::Display for ItemAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.service, self.path)
    }
}

/// A tray item as seen by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrayItem {
    pub service: String,
    pub path: String,
    pub icon_name: String,
    pub title: String,
    pub category: String,
    pub available: bool,
}

impl TrayItem {
    /// An item whose descriptive fields have not been fetched yet.
    pub fn new(address: &ItemAddress) -> Self {
        Self { service: address.service.clone(), path: address.path.clone(), available: true, ..Default::default() }
    }

    pub fn key(&self) -> String {
        format!("{}{}", self.service, self.path)
    }

    pub fn with_properties(self, props: ItemProperties) -> Self {
        Self { icon_name: props.icon_name, title: props.title, category: props.category, ..self }
    }
}

/// The descriptive properties of an item, each left empty if it could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemProperties {
    pub icon_name: String,
    pub title: String,
    pub category: String,
}

/// Properties of `org.kde.StatusNotifierItem` that the host reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemProperty {
    IconName,
    Title,
    Category,
    Id,
}

impl ItemProperty {
    pub fn dbus_name(self) -> &'static str {
        match self {
            ItemProperty::IconName => "IconName",
            ItemProperty::Title => "Title",
            ItemProperty::Category => "Category",
            ItemProperty::Id => "Id",
        }
    }
}

/// Something that can read single properties of a remote item.
pub trait PropertySource: Send + Sync {
    fn get(&self, address: &ItemAddress, property: ItemProperty) -> impl Future<Output = Result<String>> + Send;
}

/// Reads item properties over the bus.
#[derive(Debug, Clone)]
pub struct BusProperties {
    con: zbus::Connection,
}

impl BusProperties {
    pub fn new(con: zbus::Connection) -> Self {
        Self { con }
    }
}

impl PropertySource for BusProperties {
    async fn get(&self, address: &ItemAddress, property: ItemProperty) -> Result<String> {
        let sni = proxy::StatusNotifierItemProxy::builder(&self.con)
            .destination(address.service.as_str())?
            .path(address.path.as_str())?
            .cache_properties(zbus::proxy::CacheProperties::No)
            .build()
            .await?;
        let value = match property {
            ItemProperty::IconName => sni.icon_name().await?,
            ItemProperty::Title => sni.title().await?,
            ItemProperty::Category => sni.category().await?,
            ItemProperty::Id => sni.id().await?,
        };
        Ok(value)
    }
}

/// How long a single property read may take. Items that do not answer would otherwise hold
/// up every registration after them.
pub const PROPERTY_TIMEOUT: Duration = Duration::from_secs(2);

/// Read the descriptive properties of an item. `Id` is only queried, and used as the title,
/// when the item has no `Title`.
pub async fn fetch_properties<P: PropertySource>(source: &P, address: &ItemAddress) -> ItemProperties {
    fetch_properties_within(source, address, PROPERTY_TIMEOUT).await
}

/// [`fetch_properties`] with a custom per-property timeout.
pub async fn fetch_properties_within<P: PropertySource>(source: &P, address: &ItemAddress, timeout: Duration) -> ItemProperties {
    let icon_name = read_or_empty(source, address, ItemProperty::IconName, timeout).await;
    let mut title = read_or_empty(source, address, ItemProperty::Title, timeout).await;
    let category = read_or_empty(source, address, ItemProperty::Category, timeout).await;
    if title.is_empty() {
        title = read_or_empty(source, address, ItemProperty::Id, timeout).await;
    }
    ItemProperties { icon_name, title, category }
}

async fn read_or_empty<P: PropertySource>(source: &P, address: &ItemAddress, property: ItemProperty, timeout: Duration) -> String {
    let result = match tokio::time::timeout(timeout, source.get(address, property)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!("{} of {}", property.dbus_name(), address))),
    };
    match result {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Could not read {} of {}: {}", property.dbus_name(), address, e);
            String::new()
        }
    }
}
