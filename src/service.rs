use alloc::{borrow::Cow, collections::BTreeMap, sync::Arc};
use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};

use crate::{
    any::Key,
    capability::Upcast,
    context::BuildContext,
    errors::RegisterErrorKind,
    finalizer::{Dispose, Finalizer},
    instance::Instance,
};

pub(crate) type BoxedBuilder = Arc<dyn Fn(&BuildContext) -> Instance + Send + Sync>;

/// Converts an instance of the produced type into an instance of a capability it satisfies
pub(crate) type Caster = fn(Instance) -> Instance;

#[inline]
pub(crate) fn identity(instance: Instance) -> Instance {
    instance
}

#[inline]
pub(crate) fn upcast<T, C>(instance: Instance) -> Instance
where
    T: Upcast<C>,
    C: ?Sized + Send + Sync + 'static,
{
    instance.map::<T, C>(<T as Upcast<C>>::upcast)
}

/// Registration draft for a service producing `T`.
///
/// A draft records the builder, the key the built value is cached under in a scope (the produced key),
/// the capabilities `T` satisfies and an optional finalizer.
/// [`crate::Container::register`] checks it and turns it into a [`ServiceEntry`].
pub struct Provide<T> {
    produced: Key,
    builder: Option<Arc<dyn Fn(&BuildContext) -> T + Send + Sync>>,
    finalizer: Option<Arc<dyn Finalizer<T>>>,
    casts: BTreeMap<Key, Caster>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Default for Provide<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Provide<T> {
    /// Creates a draft without a builder, produced key is `T`
    #[must_use]
    pub fn new() -> Self {
        let produced = Key::of::<T>();
        let mut casts = BTreeMap::new();
        casts.insert(produced.clone(), identity as Caster);

        Self {
            produced,
            builder: None,
            finalizer: None,
            casts,
            _marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn builder(mut self, builder: impl Fn(&BuildContext) -> T + Send + Sync + 'static) -> Self {
        self.builder = Some(Arc::new(builder));
        self
    }

    /// Produces under the name key `name` instead of the type key,
    /// so the instance is cached and resolvable by that name
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        let produced = Key::name(name);
        self.casts.insert(produced.clone(), identity);
        self.produced = produced;
        self
    }

    /// Allows registration under the capability `C`
    #[inline]
    #[must_use]
    pub fn satisfies<C>(mut self) -> Self
    where
        T: Upcast<C>,
        C: ?Sized + Send + Sync + 'static,
    {
        self.casts.insert(Key::of::<C>(), upcast::<T, C>);
        self
    }

    /// Sets the hook called with the cached instance when its scope closes
    #[inline]
    #[must_use]
    pub fn finalizer(mut self, finalizer: impl Finalizer<T>) -> Self {
        self.finalizer = Some(Arc::new(finalizer));
        self
    }

    /// Calls [`Dispose::dispose`] on the cached instance when its scope closes
    #[inline]
    #[must_use]
    pub fn disposable(self) -> Self
    where
        T: Dispose,
    {
        self.finalizer(|dependency: Arc<T>| dependency.dispose())
    }

    #[inline]
    #[must_use]
    pub fn produced(&self) -> &Key {
        &self.produced
    }

    /// Checks the draft against the registration key.
    ///
    /// # Errors
    /// - Returns [`RegisterErrorKind::InvalidBuilder`] if the builder isn't set
    /// - Returns [`RegisterErrorKind::TypeMismatch`] if `T` doesn't satisfy `key`
    pub(crate) fn into_entry(self, key: &Key) -> Result<ServiceEntry, RegisterErrorKind> {
        let Some(builder) = self.builder else {
            return Err(RegisterErrorKind::InvalidBuilder { key: key.clone() });
        };
        let Some(cast) = self.casts.get(key).copied() else {
            return Err(RegisterErrorKind::TypeMismatch {
                key: key.clone(),
                produced: self.produced,
            });
        };

        Ok(ServiceEntry::new(self.produced, builder, self.finalizer, cast))
    }
}

/// Shortcut for `Provide::new().builder(builder)`
#[inline]
#[must_use]
pub fn provide<T: Send + Sync + 'static>(builder: impl Fn(&BuildContext) -> T + Send + Sync + 'static) -> Provide<T> {
    Provide::new().builder(builder)
}

/// Checked registration: a builder and the key of the value it produces
#[derive(Clone)]
pub struct ServiceEntry {
    produced: Key,
    builder: BoxedBuilder,
    cast: Caster,
}

impl ServiceEntry {
    #[must_use]
    pub(crate) fn new<T: Send + Sync + 'static>(
        produced: Key,
        builder: Arc<dyn Fn(&BuildContext) -> T + Send + Sync>,
        finalizer: Option<Arc<dyn Finalizer<T>>>,
        cast: Caster,
    ) -> Self {
        Self {
            produced,
            builder: Arc::new(move |ctx| Instance::with_finalizer(Arc::new(builder(ctx)), finalizer.clone())),
            cast,
        }
    }

    #[inline]
    #[must_use]
    pub fn produced(&self) -> &Key {
        &self.produced
    }

    /// Builds an instance of the produced type
    #[inline]
    #[must_use]
    pub(crate) fn build_produced(&self, ctx: &BuildContext) -> Instance {
        (self.builder)(ctx)
    }

    /// Builds an instance of the produced type and casts it to the registration key's type
    #[inline]
    #[must_use]
    pub(crate) fn build(&self, ctx: &BuildContext) -> Instance {
        self.cast(self.build_produced(ctx))
    }

    #[inline]
    #[must_use]
    pub(crate) fn cast(&self, instance: Instance) -> Instance {
        (self.cast)(instance)
    }
}

impl Debug for ServiceEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry").field("produced", &self.produced).finish_non_exhaustive()
    }
}
