use alloc::sync::Arc;
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

use crate::{
    any::TypeInfo,
    finalizer::{bind_finalizer, BoxedFinalizer, Finalizer},
};

/// Type-erased, cheaply cloneable handle to a built value.
///
/// The erased value is always an `Arc<T>`, where `T` is the type the instance was built or cast as,
/// so clones of an instance share one value.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
    finalizer: Option<BoxedFinalizer>,
}

impl Instance {
    #[inline]
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn from_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            type_info: TypeInfo::of::<T>(),
            finalizer: None,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn with_finalizer<T: Send + Sync + 'static>(value: Arc<T>, finalizer: Option<Arc<dyn Finalizer<T>>>) -> Self {
        let finalizer = finalizer.map(|finalizer| bind_finalizer(finalizer, value.clone()));
        Self {
            finalizer,
            ..Self::from_arc(value)
        }
    }

    /// Type the instance is stored as
    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.value.is::<Arc<T>>()
    }

    #[inline]
    #[must_use]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Whether the instance carries a disposal hook
    #[inline]
    #[must_use]
    pub fn is_disposable(&self) -> bool {
        self.finalizer.is_some()
    }

    /// Calls the disposal hook, if any.
    /// Instances without a hook are disposed trivially.
    pub fn dispose(&self) -> anyhow::Result<()> {
        match &self.finalizer {
            Some(finalizer) => finalizer(),
            None => Ok(()),
        }
    }

    /// Re-erases the value as `Arc<C>`, keeping the disposal hook.
    /// Returns the instance unchanged if it doesn't hold an `Arc<T>`.
    #[must_use]
    pub(crate) fn map<T, C>(self, f: impl FnOnce(Arc<T>) -> Arc<C>) -> Self
    where
        T: ?Sized + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        match self.downcast::<T>() {
            Some(value) => Self {
                finalizer: self.finalizer,
                ..Self::from_arc(f(value))
            },
            None => self,
        }
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_info.name)
            .field("disposable", &self.is_disposable())
            .finish_non_exhaustive()
    }
}
