use alloc::{borrow::Cow, string::String, sync::Arc, vec::Vec};
use core::fmt::{self, Write};
use tracing::{debug, error, info_span};

use crate::{
    any::{Key, TypeInfo},
    capability::Upcast,
    config::Config,
    context::BuildContext,
    errors::{DisposeError, RegisterErrorKind, ResolveErrorKind},
    instance::Instance,
    registry::ConcurrentRegistry,
    scope::Scope,
    service::{identity, upcast, Provide, ServiceEntry},
};

struct ContainerInner {
    services: ConcurrentRegistry<Key, Vec<ServiceEntry>>,
    scopes: ConcurrentRegistry<String, Scope>,
    config: Config,
}

/// Service table plus named scopes of cached instances.
///
/// Clones share both tables. Separately constructed containers never share state.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                services: ConcurrentRegistry::new(),
                scopes: ConcurrentRegistry::new(),
                config,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.config
    }

    /// Whether both handles point to the same container
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Unscoped build context for this container
    #[inline]
    #[must_use]
    pub fn context(&self) -> BuildContext {
        BuildContext::new(self.clone())
    }
}

impl Container {
    /// Registers a service under `key`.
    ///
    /// The draft is checked before anything is stored, the builder is never called here.
    /// Registering under a key that already has services adds another implementation:
    /// [`Self::build`] and [`Self::get`] use the latest one, [`Self::builds`] and [`Self::all`] use all of them.
    ///
    /// # Errors
    /// - Returns [`RegisterErrorKind::InvalidBuilder`] if the draft has no builder
    /// - Returns [`RegisterErrorKind::TypeMismatch`] if the produced type doesn't satisfy `key`
    pub fn register<T: Send + Sync + 'static>(&self, key: Key, provide: Provide<T>) -> Result<(), RegisterErrorKind> {
        match provide.into_entry(&key) {
            Ok(entry) => {
                self.append(key, entry);
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Registers `builder` under `T`
    pub fn provide<T: Send + Sync + 'static>(&self, builder: impl Fn(&BuildContext) -> T + Send + Sync + 'static) {
        let key = Key::of::<T>();
        self.append(key.clone(), ServiceEntry::new::<T>(key, Arc::new(builder), None, identity));
    }

    /// Registers `builder` under the capability `C`, cached by the produced type `T`
    pub fn provide_as<C, T>(&self, builder: impl Fn(&BuildContext) -> T + Send + Sync + 'static)
    where
        C: ?Sized + Send + Sync + 'static,
        T: Upcast<C>,
    {
        self.append(
            Key::of::<C>(),
            ServiceEntry::new::<T>(Key::of::<T>(), Arc::new(builder), None, upcast::<T, C>),
        );
    }

    /// Registers `builder` under the name key `name`
    pub fn provide_named<T: Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
        builder: impl Fn(&BuildContext) -> T + Send + Sync + 'static,
    ) {
        let key = Key::name(name);
        self.append(key.clone(), ServiceEntry::new::<T>(key, Arc::new(builder), None, identity));
    }

    fn append(&self, key: Key, entry: ServiceEntry) {
        debug!(%key, produced = %entry.produced(), "Registered");
        self.inner.services.update(key, Vec::new, |entries| entries.push(entry));
    }

    #[inline]
    #[must_use]
    pub fn has_service(&self, key: &Key) -> bool {
        self.inner.services.has(key)
    }

    /// Registered entries under `key`, in registration order
    #[inline]
    #[must_use]
    pub fn services(&self, key: &Key) -> Vec<ServiceEntry> {
        self.inner.services.get(key).unwrap_or_default()
    }

    #[inline]
    fn latest(&self, key: &Key) -> Option<ServiceEntry> {
        self.inner.services.get(key).and_then(|mut entries| entries.pop())
    }
}

impl Container {
    /// Builds a fresh instance using the latest service registered under `key`.
    /// Scope caches are neither read nor written.
    #[must_use]
    pub fn build_by_key(&self, key: &Key, ctx: &BuildContext) -> Option<Instance> {
        let span = info_span!("build", %key);
        let _guard = span.enter();

        let Some(entry) = self.latest(key) else {
            debug!("Service not found");
            return None;
        };
        Some(entry.build(ctx))
    }

    /// Same as [`Self::build_by_key`], but reports a missing service
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::ServiceNotFound`] if nothing is registered under `key`
    pub fn must_build_by_key(&self, key: &Key, ctx: &BuildContext) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("must_build", %key);
        let _guard = span.enter();

        let Some(entry) = self.latest(key) else {
            let err = ResolveErrorKind::ServiceNotFound { key: key.clone() };
            error!("{}", err);
            return Err(err);
        };
        Ok(entry.build(ctx))
    }

    /// Builds a fresh instance from every service registered under `key`, in registration order
    #[must_use]
    pub fn builds_by_key(&self, key: &Key, ctx: &BuildContext) -> Vec<Instance> {
        let span = info_span!("builds", %key);
        let _guard = span.enter();

        self.services(key).iter().map(|entry| entry.build(ctx)).collect()
    }

    /// Resolves `key` in the scope `name`, building and caching the instance on the first request.
    ///
    /// The builder gets `ctx` bound to this container and scope, so the dependencies it resolves
    /// through [`BuildContext::get`] are cached in the same scope.
    /// Returns `None` if the scope doesn't exist or nothing is registered under `key`.
    /// Two threads missing the cache at once may both build, the last store wins.
    #[must_use]
    pub fn get_by_key(&self, key: &Key, name: &str, ctx: &BuildContext) -> Option<Instance> {
        let span = info_span!("get", %key, scope = name);
        let _guard = span.enter();

        let Some(scope) = self.inner.scopes.get(name) else {
            debug!("Scope not found");
            return None;
        };

        if let Some(cached) = scope.cached(key) {
            debug!("Found in cache");
            return cached;
        }
        debug!("Not found in cache");

        let instance = self.build_by_key(key, &ctx.rebind(self, name));
        if instance.is_some() || self.inner.config.cache_absent {
            scope.store(key.clone(), instance.clone());
        }
        instance
    }

    /// Same as [`Self::get_by_key`], but reports why nothing was resolved
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::ScopeNotFound`] if the scope doesn't exist
    /// - Returns [`ResolveErrorKind::ServiceNotFound`] if nothing is registered under `key`
    ///   or an absent result is cached for it
    pub fn must_get_by_key(&self, key: &Key, name: &str, ctx: &BuildContext) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("must_get", %key, scope = name);
        let _guard = span.enter();

        let Some(scope) = self.inner.scopes.get(name) else {
            let err = ResolveErrorKind::ScopeNotFound { name: name.into() };
            error!("{}", err);
            return Err(err);
        };

        if let Some(cached) = scope.cached(key) {
            debug!("Found in cache");
            return cached.ok_or_else(|| {
                let err = ResolveErrorKind::ServiceNotFound { key: key.clone() };
                error!("{}", err);
                err
            });
        }
        debug!("Not found in cache");

        let instance = self.must_build_by_key(key, &ctx.rebind(self, name))?;
        scope.store(key.clone(), Some(instance.clone()));
        Ok(instance)
    }

    /// Resolves every service registered under `key` in the scope `name`, in registration order.
    ///
    /// Each instance is cached under the type its service produces, so a later [`Self::get_by_key`]
    /// of that type returns the same instance. Returns an empty list if the scope doesn't exist.
    ///
    /// A service whose produced key has a cached absent result in the scope (left by an earlier
    /// [`Self::get_by_key`] of that key before anything was registered under it) is skipped.
    #[must_use]
    pub fn all_by_key(&self, key: &Key, name: &str, ctx: &BuildContext) -> Vec<Instance> {
        let span = info_span!("all", %key, scope = name);
        let _guard = span.enter();

        let Some(scope) = self.inner.scopes.get(name) else {
            debug!("Scope not found");
            return Vec::new();
        };
        let ctx = ctx.rebind(self, name);

        self.services(key)
            .iter()
            .filter_map(|entry| {
                let produced = entry.produced();
                let instance = match scope.cached(produced) {
                    Some(cached) => {
                        debug!(%produced, "Found in cache");
                        cached?
                    }
                    None => {
                        debug!(%produced, "Not found in cache");
                        let instance = entry.build_produced(&ctx);
                        scope.store(produced.clone(), Some(instance.clone()));
                        instance
                    }
                };
                Some(entry.cast(instance))
            })
            .collect()
    }
}

impl Container {
    /// Typed [`Self::build_by_key`]
    #[must_use]
    pub fn build<T: ?Sized + Send + Sync + 'static>(&self, ctx: &BuildContext) -> Option<Arc<T>> {
        self.build_by_key(&Key::of::<T>(), ctx).and_then(|instance| instance.downcast())
    }

    /// Typed [`Self::must_build_by_key`]
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::ServiceNotFound`] if nothing is registered under `T`
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the built instance isn't a `T`
    pub fn must_build<T: ?Sized + Send + Sync + 'static>(&self, ctx: &BuildContext) -> Result<Arc<T>, ResolveErrorKind> {
        let key = Key::of::<T>();
        let instance = self.must_build_by_key(&key, ctx)?;
        downcast(key, &instance)
    }

    /// Typed [`Self::builds_by_key`]
    #[must_use]
    pub fn builds<T: ?Sized + Send + Sync + 'static>(&self, ctx: &BuildContext) -> Vec<Arc<T>> {
        self.builds_by_key(&Key::of::<T>(), ctx)
            .iter()
            .filter_map(Instance::downcast::<T>)
            .collect()
    }

    /// Typed [`Self::get_by_key`]
    #[must_use]
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, scope: &str, ctx: &BuildContext) -> Option<Arc<T>> {
        self.get_by_key(&Key::of::<T>(), scope, ctx).and_then(|instance| instance.downcast())
    }

    /// Typed [`Self::must_get_by_key`]
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::ScopeNotFound`] if the scope doesn't exist
    /// - Returns [`ResolveErrorKind::ServiceNotFound`] if nothing is registered under `T`
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the resolved instance isn't a `T`
    pub fn must_get<T: ?Sized + Send + Sync + 'static>(&self, scope: &str, ctx: &BuildContext) -> Result<Arc<T>, ResolveErrorKind> {
        let key = Key::of::<T>();
        let instance = self.must_get_by_key(&key, scope, ctx)?;
        downcast(key, &instance)
    }

    /// Typed [`Self::all_by_key`]
    #[must_use]
    pub fn all<T: ?Sized + Send + Sync + 'static>(&self, scope: &str, ctx: &BuildContext) -> Vec<Arc<T>> {
        self.all_by_key(&Key::of::<T>(), scope, ctx)
            .iter()
            .filter_map(Instance::downcast::<T>)
            .collect()
    }

    /// [`Self::get_by_key`] for a name key, downcast to `T`
    #[must_use]
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
        scope: &str,
        ctx: &BuildContext,
    ) -> Option<Arc<T>> {
        self.get_by_key(&Key::name(name), scope, ctx).and_then(|instance| instance.downcast())
    }

    /// [`Self::must_get_by_key`] for a name key, downcast to `T`
    ///
    /// # Errors
    /// Same as [`Self::must_get`]
    pub fn must_get_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
        scope: &str,
        ctx: &BuildContext,
    ) -> Result<Arc<T>, ResolveErrorKind> {
        let key = Key::name(name);
        let instance = self.must_get_by_key(&key, scope, ctx)?;
        downcast(key, &instance)
    }
}

impl Container {
    /// Creates an empty scope named `name`, or returns the existing one
    pub fn create_scope(&self, name: impl Into<String>) -> Scope {
        let name = name.into();
        self.inner.scopes.get_or_insert_with(name.clone(), || {
            debug!(scope = %name, "Scope created");
            Scope::new(name.as_str())
        })
    }

    /// Removes the scope `name` and disposes its cached instances.
    /// Does nothing if the scope doesn't exist.
    ///
    /// The scope is removed from the table before it's closed,
    /// so resolutions that start during disposal already see it missing.
    ///
    /// # Errors
    /// Returns every disposal failure of the scope's instances
    pub fn delete_scope(&self, name: &str) -> Result<(), DisposeError> {
        let Some(scope) = self.inner.scopes.take(name) else {
            return Ok(());
        };
        debug!(scope = name, "Scope deleted");
        scope.close()
    }

    /// Deletes every scope, then removes every registered service.
    /// All scopes are closed even if some disposals fail.
    ///
    /// # Errors
    /// Returns the disposal failures of all scopes together
    pub fn close(&self) -> Result<(), DisposeError> {
        let span = info_span!("close_container");
        let _guard = span.enter();

        let mut errors = DisposeError::default();
        for (name, scope) in self.inner.scopes.drain() {
            debug!(scope = %name, "Scope deleted");
            if let Err(err) = scope.close() {
                errors.extend(err);
            }
        }
        self.inner.services.clear();
        debug!("Container closed");

        errors.into_result()
    }

    #[inline]
    #[must_use]
    pub fn has_scope(&self, name: &str) -> bool {
        self.inner.scopes.has(name)
    }

    #[inline]
    #[must_use]
    pub fn scope(&self, name: &str) -> Option<Scope> {
        self.inner.scopes.get(name)
    }

    #[inline]
    #[must_use]
    pub fn scope_names(&self) -> Vec<String> {
        self.inner.scopes.keys()
    }

    /// Writes the service table and every scope's cached keys to `out`.
    /// The output is for people, its format isn't stable.
    ///
    /// # Errors
    /// Returns the error of `out`
    pub fn inspect<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str("Services:\n")?;
        for (key, entries) in self.inner.services.map() {
            writeln!(out, "{key}:")?;
            for entry in entries {
                writeln!(out, ".   {}", entry.produced())?;
            }
        }
        out.write_str("Scopes:\n")?;
        for (name, scope) in self.inner.scopes.map() {
            writeln!(out, "{name}:")?;
            for key in scope.keys() {
                writeln!(out, ".   {key}")?;
            }
        }
        Ok(())
    }
}

fn downcast<T: ?Sized + Send + Sync + 'static>(key: Key, instance: &Instance) -> Result<Arc<T>, ResolveErrorKind> {
    instance.downcast().ok_or_else(|| {
        let err = ResolveErrorKind::IncorrectType {
            key,
            expected: TypeInfo::of::<T>(),
            actual: instance.type_info(),
        };
        error!("{}", err);
        err
    })
}
