use alloc::sync::Arc;

/// Hook called with a cached instance when the scope holding it closes.
///
/// # Warning
/// [`Drop`] isn't an equivalent of a finalizer: the finalizer is called while the scope closes and can fail,
/// while [`Drop`] is called whenever the last reference goes away.
pub trait Finalizer<Dep: ?Sized>: Send + Sync + 'static {
    fn finalize(&self, dependency: Arc<Dep>) -> anyhow::Result<()>;
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: Fn(Arc<Dep>) -> anyhow::Result<()> + Send + Sync + 'static,
    Dep: ?Sized,
{
    #[inline]
    fn finalize(&self, dependency: Arc<Dep>) -> anyhow::Result<()> {
        self(dependency)
    }
}

/// Disposal capability exposed by the instance itself.
///
/// Register the type with [`crate::Provide::disposable`] to have [`Dispose::dispose`] called when its scope closes.
pub trait Dispose {
    fn dispose(&self) -> anyhow::Result<()>;
}

pub(crate) type BoxedFinalizer = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Binds `finalizer` to one built value, so the hook survives the value being cast to a capability
#[must_use]
pub(crate) fn bind_finalizer<Dep>(finalizer: Arc<dyn Finalizer<Dep>>, dependency: Arc<Dep>) -> BoxedFinalizer
where
    Dep: Send + Sync + 'static,
{
    Arc::new(move || finalizer.finalize(dependency.clone()))
}
