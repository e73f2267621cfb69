use alloc::{borrow::Cow, collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::any::{Any, TypeId};

use crate::{container::Container, errors::ResolveErrorKind};

/// Caller-supplied values a builder may read, keyed by type.
/// Deadlines, cancellation flags and request-scoped data go here.
#[derive(Clone, Default)]
pub struct Context {
    pub(crate) map: BTreeMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<Arc<T>> {
        self.insert_rc(Arc::new(value))
    }

    #[inline]
    pub fn insert_rc<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> Option<Arc<T>> {
        self.map.insert(TypeId::of::<T>(), value).and_then(|boxed| boxed.downcast().ok())
    }

    #[inline]
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.map.get(&TypeId::of::<T>()).and_then(|boxed| boxed.clone().downcast().ok())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Value passed to every builder.
///
/// It gives the builder its way back to the owning [`Container`], the scope the resolution runs in
/// (if any) and the caller's [`Context`]. The container passes it through untouched.
#[derive(Clone)]
pub struct BuildContext {
    container: Container,
    scope: Option<Cow<'static, str>>,
    context: Context,
}

impl BuildContext {
    #[inline]
    #[must_use]
    pub fn new(container: Container) -> Self {
        Self {
            container,
            scope: None,
            context: Context::new(),
        }
    }

    /// Resolutions made through [`Self::get`] and [`Self::all`] go to the scope `name`
    #[inline]
    #[must_use]
    pub fn in_scope(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.scope = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.context.insert(value);
        self
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[inline]
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.context.get()
    }

    /// Context for builders run by `container` in the scope `scope`.
    /// Keeps the caller's values, and is only copied when the container or the scope differ.
    pub(crate) fn rebind(&self, container: &Container, scope: &str) -> Cow<'_, Self> {
        if self.container.ptr_eq(container) && self.scope() == Some(scope) {
            return Cow::Borrowed(self);
        }
        Cow::Owned(Self {
            container: container.clone(),
            scope: Some(Cow::Owned(String::from(scope))),
            context: self.context.clone(),
        })
    }

    /// Resolves a dependency of the builder being run.
    /// Uses the scope cache when the context has a scope, otherwise builds a fresh instance.
    #[must_use]
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self.scope() {
            Some(scope) => self.container.get::<T>(scope, self),
            None => self.container.build::<T>(self),
        }
    }

    /// Same as [`Self::get`], but reports why nothing was resolved
    #[allow(clippy::missing_errors_doc)]
    pub fn must_get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        match self.scope() {
            Some(scope) => self.container.must_get::<T>(scope, self),
            None => self.container.must_build::<T>(self),
        }
    }

    /// Resolves every implementation registered under `T`
    #[must_use]
    pub fn all<T: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<T>> {
        match self.scope() {
            Some(scope) => self.container.all::<T>(scope, self),
            None => self.container.builds::<T>(self),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{BuildContext, Context};
    use crate::Container;

    use alloc::{
        borrow::Cow,
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use tracing_test::traced_test;

    #[derive(Debug, PartialEq)]
    struct Deadline(u64);

    #[test]
    #[traced_test]
    fn test_context_values() {
        let mut context = Context::new();
        assert!(context.is_empty());

        assert!(context.insert(Deadline(10)).is_none());
        let previous = context.insert(Deadline(20)).unwrap();

        assert_eq!(*previous, Deadline(10));
        assert_eq!(context.get::<Deadline>().as_deref(), Some(&Deadline(20)));
        assert!(context.get::<u8>().is_none());
        assert_eq!(context.len(), 1);
    }

    #[test]
    #[traced_test]
    fn test_build_context_accessors() {
        let container = Container::new();
        let ctx = BuildContext::new(container.clone()).in_scope("request").with_value(Deadline(5));

        assert_eq!(ctx.scope(), Some("request"));
        assert_eq!(ctx.value::<Deadline>().as_deref(), Some(&Deadline(5)));
        assert!(ctx.container().ptr_eq(&container));
        assert!(BuildContext::new(container).scope().is_none());
    }

    #[test]
    #[traced_test]
    fn test_rebind() {
        let container = Container::new();
        let ctx = BuildContext::new(container.clone()).in_scope("request").with_value(Deadline(3));

        assert!(matches!(ctx.rebind(&container, "request"), Cow::Borrowed(_)));

        let other_scope = ctx.rebind(&container, "session");
        assert_eq!(other_scope.scope(), Some("session"));
        assert_eq!(other_scope.value::<Deadline>().as_deref(), Some(&Deadline(3)));

        let other = Container::new();
        let other_container = ctx.rebind(&other, "request");
        assert!(other_container.container().ptr_eq(&other));
        assert_eq!(other_container.scope(), Some("request"));
    }

    #[test]
    #[traced_test]
    fn test_shared_context_values() {
        let deadline = Arc::new(Deadline(1));
        let mut context = Context::new();
        context.insert_rc(deadline.clone());

        let ctx = BuildContext::new(Container::new()).with_context(context);

        assert!(Arc::ptr_eq(&ctx.value::<Deadline>().unwrap(), &deadline));
    }
}
