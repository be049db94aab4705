use crate::*;

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct RegistryState {
    items: HashMap<String, Entry>,
    /// The host claimed its bus name.
    started: bool,
    /// The watcher accepted our registration.
    registered: bool,
    /// Bumped on every insertion, so a slow property fetch can tell whether its item is
    /// still the one in the map.
    generation: u64,
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    item: TrayItem,
}

/// The set of tray items known to a host, keyed by item key.
///
/// Cloning is cheap and gives another handle to the same registry, so the UI can read
/// snapshots while the host's signal loop mutates it. The lock is never held while talking to
/// the bus.
#[derive(Clone)]
pub struct TrayRegistry {
    state: Arc<RwLock<RegistryState>>,
    on_change: ChangeCallback,
}

impl std::fmt::Debug for TrayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrayRegistry").field("state", &*self.read()).finish()
    }
}

impl TrayRegistry {
    /// Create an empty registry. `on_change` is called after every committed add or remove.
    pub fn new(on_change: impl Fn() + Send + Sync + 'static) -> Self {
        Self { state: Arc::new(RwLock::new(RegistryState::default())), on_change: Arc::new(on_change) }
    }

    // a panic while holding the lock can't leave the map half-updated, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of all items, ordered by item key.
    pub fn items(&self) -> Vec<TrayItem> {
        let state = self.read();
        let mut items: Vec<TrayItem> = state.items.values().map(|entry| entry.item.clone()).collect();
        items.sort_by(|a, b| a.key().cmp(&b.key()));
        items
    }

    pub fn item_count(&self) -> usize {
        self.read().items.len()
    }

    pub fn get(&self, key: &str) -> Option<TrayItem> {
        self.read().items.get(key).map(|entry| entry.item.clone())
    }

    pub fn is_started(&self) -> bool {
        self.read().started
    }

    /// Whether a watcher accepted us as a host. If not, the registry stays empty.
    pub fn is_available(&self) -> bool {
        self.read().registered
    }

    pub(crate) fn set_started(&self, started: bool) {
        self.write().started = started;
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        self.write().registered = registered;
    }

    /// Add (or replace) the item named by a registration signal and fetch its properties.
    ///
    /// The item is visible with empty descriptive fields while the fetch runs. Returns `false`
    /// if the item was removed or re-registered before the fetch finished, in which case the
    /// fetched properties are dropped and no change is reported.
    pub async fn add_item<P: PropertySource>(&self, service: &str, source: &P) -> bool {
        let address = ItemAddress::parse(service);
        let key = address.key();

        let generation = {
            let mut state = self.write();
            state.generation += 1;
            let generation = state.generation;
            if state.items.insert(key.clone(), Entry { generation, item: TrayItem::new(&address) }).is_some() {
                log::debug!("Replacing tray item {}", key);
            }
            generation
        };

        let props = fetch_properties(source, &address).await;

        let committed = {
            let mut state = self.write();
            match state.items.get_mut(&key) {
                Some(entry) if entry.generation == generation => {
                    entry.item = TrayItem::new(&address).with_properties(props);
                    true
                }
                _ => false,
            }
        };

        if committed {
            log::info!("new tray item: {}", key);
            (self.on_change)();
        } else {
            log::debug!("Tray item {} changed while its properties were fetched", key);
        }
        committed
    }

    /// Remove the item named by an unregistration signal. Unknown items are ignored.
    pub fn remove_item(&self, service: &str) -> bool {
        let key = ItemAddress::parse(service).key();
        let removed = self.write().items.remove(&key).is_some();
        if removed {
            log::info!("gone tray item: {}", key);
            (self.on_change)();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::FakeItems;
    use pretty_assertions::assert_eq;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn counting_registry() -> (TrayRegistry, Arc<AtomicUsize>) {
        let changes = Arc::new(AtomicUsize::new(0));
        let counter = changes.clone();
        let registry = TrayRegistry::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (registry, changes)
    }

    #[tokio::test]
    async fn test_add_uses_default_path() {
        let (registry, changes) = counting_registry();
        let fake = FakeItems::with(&[("svc/StatusNotifierItem", &[(ItemProperty::Title, "Steam")])]);

        assert!(registry.add_item("svc", &fake).await);

        let items = registry.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key(), "svc/StatusNotifierItem");
        assert_eq!(items[0].title, "Steam");
        assert!(items[0].available);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_with_custom_path() {
        let (registry, _) = counting_registry();
        registry.add_item("svc/custom", &FakeItems::default()).await;
        assert_eq!(registry.items()[0].key(), "svc/custom");
        assert!(registry.get("svc/custom").is_some());
        assert!(registry.get("svc//custom").is_none());
    }

    #[tokio::test]
    async fn test_reregistering_replaces() {
        let (registry, changes) = counting_registry();
        let fake = FakeItems::with(&[("svc/StatusNotifierItem", &[(ItemProperty::IconName, "old")])]);
        registry.add_item("svc", &fake).await;

        fake.props.lock().unwrap().insert(
            "svc/StatusNotifierItem".to_string(),
            [(ItemProperty::IconName, "new".to_string())].into_iter().collect(),
        );
        registry.add_item("svc", &fake).await;

        assert_eq!(registry.item_count(), 1);
        assert_eq!(registry.items()[0].icon_name, "new");
        assert_eq!(changes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_noop() {
        let (registry, changes) = counting_registry();
        registry.add_item("svc", &FakeItems::default()).await;

        assert!(!registry.remove_item("other"));
        assert!(!registry.remove_item("svc/elsewhere"));
        assert_eq!(registry.item_count(), 1);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_remove_add_fetches_again() {
        let (registry, changes) = counting_registry();
        let fake = FakeItems::with(&[("svc/StatusNotifierItem", &[(ItemProperty::Title, "a")])]);

        registry.add_item("svc", &fake).await;
        assert!(registry.remove_item("svc"));
        assert_eq!(registry.item_count(), 0);
        registry.add_item("svc", &fake).await;

        assert_eq!(registry.item_count(), 1);
        // title + icon + category per fetch, id is skipped because the title is set
        assert_eq!(fake.calls.load(Ordering::SeqCst), 6);
        assert_eq!(changes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_callback_sees_committed_state() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = {
            let seen = seen.clone();
            let cell: Arc<std::sync::OnceLock<TrayRegistry>> = Arc::new(std::sync::OnceLock::new());
            let cell_cb = cell.clone();
            let registry = TrayRegistry::new(move || {
                if let Some(registry) = cell_cb.get() {
                    seen.lock().unwrap().push(registry.items().iter().map(|i| (i.key(), i.title.clone())).collect::<Vec<_>>());
                }
            });
            cell.set(registry.clone()).unwrap();
            registry
        };
        let fake = FakeItems::with(&[("svc/StatusNotifierItem", &[(ItemProperty::Title, "Discord")])]);

        registry.add_item("svc", &fake).await;
        registry.remove_item("svc");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], vec![("svc/StatusNotifierItem".to_string(), "Discord".to_string())]);
        assert!(seen[1].is_empty());
    }

    #[tokio::test]
    async fn test_removed_during_fetch_is_not_resurrected() {
        let (registry, changes) = counting_registry();
        let fake = Arc::new(FakeItems { delay: Some(Duration::from_millis(50)), ..Default::default() });

        let add = {
            let registry = registry.clone();
            let fake = fake.clone();
            tokio::spawn(async move { registry.add_item("svc", &*fake).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(registry.item_count(), 1);
        assert!(registry.remove_item("svc"));

        assert!(!add.await.unwrap());
        assert_eq!(registry.item_count(), 0);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_snapshots_never_see_torn_items() {
        let (registry, _) = counting_registry();
        let fake = Arc::new(FakeItems {
            delay: Some(Duration::from_millis(5)),
            ..FakeItems::with(&[(
                "svc/StatusNotifierItem",
                &[(ItemProperty::IconName, "icon"), (ItemProperty::Title, "title"), (ItemProperty::Category, "cat")],
            )])
        });

        let writer = {
            let registry = registry.clone();
            let fake = fake.clone();
            tokio::spawn(async move {
                for _ in 0..5 {
                    registry.add_item("svc", &*fake).await;
                }
            })
        };

        let reader = {
            let registry = registry.clone();
            tokio::task::spawn_blocking(move || {
                let mut snapshots = 0;
                while snapshots < 10_000 {
                    for item in registry.items() {
                        let fields = [&item.icon_name, &item.title, &item.category];
                        let filled = fields.iter().filter(|f| !f.is_empty()).count();
                        assert!(filled == 0 || filled == 3, "torn item: {:?}", item);
                    }
                    snapshots += 1;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(registry.items()[0].title, "title");
    }

    #[test]
    fn test_availability_flags() {
        let (registry, _) = counting_registry();
        assert!(!registry.is_started());
        assert!(!registry.is_available());
        registry.set_started(true);
        registry.set_registered(true);
        assert!(registry.is_started());
        assert!(registry.is_available());
    }
}
