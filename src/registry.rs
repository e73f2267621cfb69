use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::{borrow::Borrow, mem};
use parking_lot::RwLock;

pub(crate) type CopyFn<V> = Arc<dyn Fn(&V) -> V + Send + Sync>;

/// Keyed store shared between threads.
///
/// Every value that leaves the registry (through [`Self::get`], [`Self::map`] or [`Self::clone`])
/// passes through the registry's copy function. The default copy function is [`Clone::clone`],
/// so `Arc` values are shared and `Vec` values are shallow-cloned.
///
/// Read-only operations take a shared lock, mutating operations take an exclusive one.
/// No lock is held after an operation returns.
pub struct ConcurrentRegistry<K, V> {
    map: RwLock<BTreeMap<K, V>>,
    copy: CopyFn<V>,
}

impl<K, V> ConcurrentRegistry<K, V>
where
    V: Clone + 'static,
{
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_copy(V::clone)
    }
}

impl<K, V> Default for ConcurrentRegistry<K, V>
where
    V: Clone + 'static,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ConcurrentRegistry<K, V> {
    #[inline]
    #[must_use]
    pub fn with_copy(copy: impl Fn(&V) -> V + Send + Sync + 'static) -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
            copy: Arc::new(copy),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Removes all entries under a single exclusive lock
    #[inline]
    pub fn clear(&self) {
        self.map.write().clear();
    }

    /// Removes all entries and returns them without copying
    #[inline]
    #[must_use]
    pub fn drain(&self) -> BTreeMap<K, V> {
        mem::take(&mut *self.map.write())
    }
}

impl<K, V> ConcurrentRegistry<K, V>
where
    K: Ord,
{
    #[inline]
    #[must_use]
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.read().contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.read().get(key).map(|value| (self.copy)(value))
    }

    /// Inserts or overwrites, the last writer wins
    #[inline]
    pub fn set(&self, key: K, value: V) {
        self.map.write().insert(key, value);
    }

    #[inline]
    pub fn del<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.write().remove(key);
    }

    /// Removes the entry and hands the stored value over without copying
    #[inline]
    #[must_use]
    pub fn take<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.write().remove(key)
    }

    /// Returns a copy of the value under `key`, inserting `default()` first if the key is absent.
    /// The check and the insert happen under one exclusive lock.
    #[inline]
    pub fn get_or_insert_with(&self, key: K, default: impl FnOnce() -> V) -> V {
        let mut guard = self.map.write();
        let value = guard.entry(key).or_insert_with(default);
        (self.copy)(value)
    }

    /// Mutates the value under `key` in place, inserting `default()` first if the key is absent.
    /// The whole read-modify-write happens under one exclusive lock.
    #[inline]
    pub fn update<R>(&self, key: K, default: impl FnOnce() -> V, f: impl FnOnce(&mut V) -> R) -> R {
        let mut guard = self.map.write();
        f(guard.entry(key).or_insert_with(default))
    }
}

impl<K, V> ConcurrentRegistry<K, V>
where
    K: Ord + Clone,
{
    /// Returns a snapshot of every entry, each value passed through the copy function.
    /// The snapshot and the registry never observe each other's later mutations.
    #[must_use]
    pub fn map(&self) -> BTreeMap<K, V> {
        let guard = self.map.read();
        guard.iter().map(|(key, value)| (key.clone(), (self.copy)(value))).collect()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.map.read().keys().cloned().collect()
    }
}

impl<K, V> Clone for ConcurrentRegistry<K, V>
where
    K: Ord + Clone,
{
    fn clone(&self) -> Self {
        Self {
            map: RwLock::new(self.map()),
            copy: self.copy.clone(),
        }
    }
}
