//! In-process backing store with call accounting and fault injection.
//!
//! Items live in a map keyed by `(category, namespace, key)`. Every trait call
//! is counted, `add` rejects existing items the way a real credential store
//! does, and individual operations can be made to fail on demand.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{codes, BackingError, BackingStore, Category};

/// Backing store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Update,
    Add,
    Delete,
    DeleteCategory(Category),
    DeleteNamespace,
}

/// Snapshot of how many times each operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch: usize,
    pub update: usize,
    pub add: usize,
    pub delete: usize,
    pub delete_category: usize,
    pub delete_namespace: usize,
}

#[derive(Default)]
struct Counters {
    fetch: AtomicUsize,
    update: AtomicUsize,
    add: AtomicUsize,
    delete: AtomicUsize,
    delete_category: AtomicUsize,
    delete_namespace: AtomicUsize,
    fetch_in_flight: AtomicUsize,
    fetch_peak: AtomicUsize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ItemId {
    category: Category,
    namespace: String,
    key: String,
}

impl ItemId {
    fn generic(namespace: &str, key: &str) -> Self {
        Self {
            category: Category::GenericSecret,
            namespace: namespace.to_string(),
            key: key.to_string(),
        }
    }
}

/// In-memory [`BackingStore`].
#[derive(Default)]
pub struct MemoryBackingStore {
    items: Mutex<HashMap<ItemId, Vec<u8>>>,
    faults: Mutex<HashSet<Operation>>,
    counters: Counters,
    latency: Option<Duration>,
}

impl MemoryBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`, simulating a slow platform store.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make `op` fail with [`codes::INJECTED`] until [`Self::clear_faults`].
    pub fn fail(&self, op: Operation) {
        self.faults.lock().insert(op);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Store an item directly, bypassing counters and faults.
    pub fn insert_raw(&self, category: Category, namespace: &str, key: &str, value: &[u8]) {
        let id = ItemId {
            category,
            namespace: namespace.to_string(),
            key: key.to_string(),
        };
        self.items.lock().insert(id, value.to_vec());
    }

    /// Read an item directly, bypassing counters and faults.
    pub fn get_raw(&self, category: Category, namespace: &str, key: &str) -> Option<Vec<u8>> {
        let id = ItemId {
            category,
            namespace: namespace.to_string(),
            key: key.to_string(),
        };
        self.items.lock().get(&id).cloned()
    }

    /// Total number of items across all categories and namespaces.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of items in one category.
    pub fn count_in_category(&self, category: Category) -> usize {
        self.items
            .lock()
            .keys()
            .filter(|id| id.category == category)
            .count()
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            fetch: c.fetch.load(Ordering::SeqCst),
            update: c.update.load(Ordering::SeqCst),
            add: c.add.load(Ordering::SeqCst),
            delete: c.delete.load(Ordering::SeqCst),
            delete_category: c.delete_category.load(Ordering::SeqCst),
            delete_namespace: c.delete_namespace.load(Ordering::SeqCst),
        }
    }

    /// Highest number of `fetch` calls observed running at the same time.
    pub fn peak_concurrent_fetches(&self) -> usize {
        self.counters.fetch_peak.load(Ordering::SeqCst)
    }

    fn check(&self, op: Operation) -> Result<(), BackingError> {
        if self.faults.lock().contains(&op) {
            Err(BackingError::failure(
                codes::INJECTED,
                format!("injected failure for {op:?}"),
            ))
        } else {
            Ok(())
        }
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl BackingStore for MemoryBackingStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, namespace: &str, key: &str) -> Result<Vec<u8>, BackingError> {
        let c = &self.counters;
        c.fetch.fetch_add(1, Ordering::SeqCst);
        let in_flight = c.fetch_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        c.fetch_peak.fetch_max(in_flight, Ordering::SeqCst);

        self.pause().await;
        let result = self.check(Operation::Fetch).and_then(|()| {
            self.items
                .lock()
                .get(&ItemId::generic(namespace, key))
                .cloned()
                .ok_or(BackingError::NotFound)
        });

        c.fetch_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn update(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), BackingError> {
        self.counters.update.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(Operation::Update)?;

        match self.items.lock().get_mut(&ItemId::generic(namespace, key)) {
            Some(existing) => {
                *existing = value.to_vec();
                Ok(())
            }
            None => Err(BackingError::NotFound),
        }
    }

    async fn add(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), BackingError> {
        self.counters.add.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(Operation::Add)?;

        let mut items = self.items.lock();
        let id = ItemId::generic(namespace, key);
        if items.contains_key(&id) {
            return Err(BackingError::Duplicate);
        }
        items.insert(id, value.to_vec());
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), BackingError> {
        self.counters.delete.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(Operation::Delete)?;

        match self.items.lock().remove(&ItemId::generic(namespace, key)) {
            Some(_) => Ok(()),
            None => Err(BackingError::NotFound),
        }
    }

    async fn delete_all_in_category(&self, category: Category) -> Result<(), BackingError> {
        self.counters.delete_category.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(Operation::DeleteCategory(category))?;

        self.items.lock().retain(|id, _| id.category != category);
        Ok(())
    }

    async fn delete_all_in_namespace(&self, namespace: &str) -> Result<(), BackingError> {
        self.counters.delete_namespace.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(Operation::DeleteNamespace)?;

        self.items.lock().retain(|id, _| id.namespace != namespace);
        Ok(())
    }
}
