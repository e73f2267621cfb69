use alloc::sync::Arc;

/// Proof that `Self` satisfies the capability `C`.
///
/// Every sized type satisfies itself. A `dyn Trait` capability is satisfied by the types listed in a
/// [`capability!`](crate::capability!) invocation, so a registration that binds a type to a capability it
/// doesn't implement is rejected when the registration is checked, without calling its builder.
pub trait Upcast<C: ?Sized>: Send + Sync + 'static {
    fn upcast(this: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Upcast<T> for T {
    #[inline]
    fn upcast(this: Arc<Self>) -> Arc<T> {
        this
    }
}

/// Declares the types that satisfy a trait-object capability.
///
/// # Examples
/// ```rust
/// use stevedore::capability;
///
/// trait Storage: Send + Sync {}
///
/// struct Postgres;
/// struct InMemory;
///
/// impl Storage for Postgres {}
/// impl Storage for InMemory {}
///
/// capability!(dyn Storage => [Postgres, InMemory]);
/// ```
#[macro_export]
macro_rules! capability {
    ($cap:ty => [$($(#[$attr:meta])* $impl:ty),* $(,)?]) => {
        $(
            $(#[$attr])*
            impl $crate::Upcast<$cap> for $impl {
                #[inline]
                fn upcast(this: $crate::macros_utils::Arc<Self>) -> $crate::macros_utils::Arc<$cap> {
                    this
                }
            }
        )*
    };
}
