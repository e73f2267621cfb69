use alloc::{string::String, sync::Arc, vec::Vec};
use tracing::{debug, error, info_span};

use crate::{
    any::Key,
    errors::{DisposeError, DisposeFailure},
    instance::Instance,
    registry::ConcurrentRegistry,
};

struct ScopeInner {
    name: String,
    /// `None` is a cached absent result
    instances: ConcurrentRegistry<Key, Option<Instance>>,
}

/// Named cache of resolved instances.
///
/// Clones share one cache. A scope is created by [`crate::Container::create_scope`] and closed by
/// [`crate::Container::delete_scope`], which disposes every cached instance.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    #[inline]
    #[must_use]
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.into(),
                instances: ConcurrentRegistry::new(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of cached keys, absent results included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.instances.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.instances.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.inner.instances.has(key)
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.inner.instances.keys()
    }

    /// `None` on a cache miss, `Some(None)` for a cached absent result
    #[inline]
    #[must_use]
    pub(crate) fn cached(&self, key: &Key) -> Option<Option<Instance>> {
        self.inner.instances.get(key)
    }

    #[inline]
    pub(crate) fn store(&self, key: Key, instance: Option<Instance>) {
        debug!(scope = self.name(), %key, absent = instance.is_none(), "Cached");
        self.inner.instances.set(key, instance);
    }

    /// Empties the cache and disposes every cached instance.
    ///
    /// All instances are disposed even if some fail.
    ///
    /// # Errors
    /// Returns every collected disposal failure
    pub(crate) fn close(&self) -> Result<(), DisposeError> {
        let span = info_span!("close", scope = self.name());
        let _guard = span.enter();

        let mut errors = DisposeError::default();
        for (key, instance) in self.inner.instances.drain() {
            let Some(instance) = instance else {
                continue;
            };
            if !instance.is_disposable() {
                continue;
            }

            match instance.dispose() {
                Ok(()) => debug!(%key, "Disposed"),
                Err(err) => {
                    error!(%key, %err, "Dispose failed");
                    errors.failures.push(DisposeFailure {
                        scope: self.inner.name.clone(),
                        key,
                        error: err,
                    });
                }
            }
        }

        errors.into_result()
    }
}
