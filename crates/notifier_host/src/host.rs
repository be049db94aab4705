use crate::*;

use std::sync::atomic::{AtomicU32, Ordering};

use futures::{stream::BoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use zbus::export::ordered_stream::{self, OrderedStreamExt};

/// Distinguishes several hosts created by the same process.
static NEXT_HOST_ID: AtomicU32 = AtomicU32::new(0);

/// A StatusNotifierHost: registers with the watcher and mirrors the registered items into a
/// [`TrayRegistry`].
///
/// The host never reconnects. If the bus connection goes away, the registry keeps the last
/// known items and no further changes are reported.
pub struct Host {
    con: zbus::Connection,
    registry: TrayRegistry,
    bus_name: Option<String>,
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").field("bus_name", &self.bus_name).field("registry", &self.registry).finish()
    }
}

impl Host {
    /// Connect to the session bus. `on_change` is invoked after every add or remove, from the
    /// host's own task.
    pub async fn connect(on_change: impl Fn() + Send + Sync + 'static) -> Result<Self> {
        let con = zbus::Connection::session().await?;
        Ok(Self::with_connection(con, on_change))
    }

    pub fn with_connection(con: zbus::Connection, on_change: impl Fn() + Send + Sync + 'static) -> Self {
        Self { con, registry: TrayRegistry::new(on_change), bus_name: None, cancel: CancellationToken::new(), task: None }
    }

    /// Register as a host and start following item registrations.
    ///
    /// Fails if our host name can not be claimed. If there is no watcher on the bus, this
    /// still succeeds, but the host stays unavailable with an empty registry.
    pub async fn start(&mut self) -> Result<()> {
        if self.bus_name.is_some() || self.cancel.is_cancelled() {
            return Ok(());
        }

        let bus_name = claim_host_name(&self.con).await?;
        log::debug!("Claimed bus name {}", bus_name);
        self.bus_name = Some(bus_name.clone());
        self.registry.set_started(true);

        let snw = match register_host(&self.con, &bus_name).await {
            Ok(snw) => snw,
            Err(e) => {
                log::warn!("StatusNotifierWatcher is not available, running without tray items: {}", e);
                return Ok(());
            }
        };

        let events = match item_events(&snw).await {
            Ok(events) => events,
            Err(e) => {
                self.registry.set_started(false);
                self.release_name().await;
                return Err(e.into());
            }
        };
        self.registry.set_registered(true);

        let source = BusProperties::new(self.con.clone());

        // initial items first
        match snw.registered_status_notifier_items().await {
            Ok(services) => {
                for svc in services {
                    self.registry.add_item(&svc, &source).await;
                }
            }
            Err(e) => log::warn!("Could not list registered StatusNotifierItems: {}", e),
        }

        self.task = Some(tokio::spawn(follow_items(events, self.registry.clone(), source, self.cancel.clone())));
        Ok(())
    }

    /// Stop following registrations and give up our bus name. The registry keeps its current
    /// items. Returns once the signal loop has finished, even if it was waiting on an item.
    /// Stopping twice is fine.
    pub async fn stop(&mut self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            self.registry.set_started(false);
            log::debug!("Notifier host stopped");
        }
        self.join().await;
        self.release_name().await;
    }

    async fn release_name(&mut self) {
        if let Some(bus_name) = self.bus_name.take() {
            if let Err(e) = self.con.release_name(bus_name.as_str()).await {
                log::debug!("Could not release {}: {}", bus_name, e);
            }
        }
    }

    /// A handle to the item registry, for reading snapshots from another thread.
    pub fn registry(&self) -> TrayRegistry {
        self.registry.clone()
    }

    pub fn items(&self) -> Vec<TrayItem> {
        self.registry.items()
    }

    pub fn item_count(&self) -> usize {
        self.registry.item_count()
    }

    pub fn is_available(&self) -> bool {
        self.registry.is_available()
    }

    /// The name we hold on the bus, while started.
    pub fn bus_name(&self) -> Option<&str> {
        self.bus_name.as_deref()
    }

    /// Wait for the signal loop to finish, i.e. after [`Host::stop`] or once the connection
    /// to the bus is lost.
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("notifier host task failed: {}", e);
            }
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Claim `org.kde.StatusNotifierHost-{pid}-{nr}`.
///
/// From <https://www.freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierHost/>:
///
/// Instances of this service are registered on the Dbus session bus, under a name on the
/// form org.freedesktop.StatusNotifierHost-id where id is an unique identifier, that keeps
/// the names unique on the bus, such as the process-id of the application or another type
/// of identifier if more that one StatusNotifierHost is registered by the same process.
async fn claim_host_name(con: &zbus::Connection) -> Result<String> {
    let bus_name = host_name(NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed));
    let flags = [zbus::fdo::RequestNameFlags::DoNotQueue];

    use zbus::fdo::RequestNameReply::*;
    match con.request_name_with_flags(bus_name.as_str(), flags.into_iter().collect()).await? {
        PrimaryOwner => Ok(bus_name),
        Exists | AlreadyOwner | InQueue => Err(Error::NameTaken(bus_name)),
    }
}

fn host_name(nr: u32) -> String {
    format!("{}-{}-{}", names::HOST_BUS_PREFIX, std::process::id(), nr)
}

/// Register ourself to StatusNotifierWatcher.
async fn register_host(con: &zbus::Connection, bus_name: &str) -> zbus::Result<proxy::StatusNotifierWatcherProxy<'static>> {
    let snw = proxy::StatusNotifierWatcherProxy::new(con).await?;
    snw.register_status_notifier_host(bus_name).await?;
    Ok(snw)
}

/// A registration change announced by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ItemEvent {
    Registered(String),
    Unregistered(String),
}

/// Both watcher signals as one stream, in the order the bus delivered them.
async fn item_events(snw: &proxy::StatusNotifierWatcherProxy<'static>) -> zbus::Result<BoxStream<'static, ItemEvent>> {
    let new_items = snw.receive_status_notifier_item_registered().await?;
    let gone_items = snw.receive_status_notifier_item_unregistered().await?;

    let new_items = OrderedStreamExt::filter_map(new_items, |sig| match sig.args() {
        Ok(args) => Some(ItemEvent::Registered(args.service.to_string())),
        Err(e) => {
            log::debug!("Dropping StatusNotifierItemRegistered signal: {}", e);
            None
        }
    });
    let gone_items = OrderedStreamExt::filter_map(gone_items, |sig| match sig.args() {
        Ok(args) => Some(ItemEvent::Unregistered(args.service.to_string())),
        Err(e) => {
            log::debug!("Dropping StatusNotifierItemUnregistered signal: {}", e);
            None
        }
    });
    Ok(ordered_stream::join(new_items, gone_items).into_stream().boxed())
}

/// Apply registration changes to the registry, one at a time, until cancelled or until the
/// stream ends. A pending property fetch is abandoned on cancellation.
pub(crate) async fn follow_items<S, P>(mut events: S, registry: TrayRegistry, source: P, cancel: CancellationToken)
where
    S: Stream<Item = ItemEvent> + Unpin,
    P: PropertySource,
{
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.next() => event,
        };
        match event {
            Some(ItemEvent::Registered(service)) => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = registry.add_item(&service, &source) => {}
                }
            }
            Some(ItemEvent::Unregistered(service)) => {
                registry.remove_item(&service);
            }
            None => {
                log::warn!("Lost connection to StatusNotifierWatcher, tray items will no longer update");
                break;
            }
        }
    }
}
