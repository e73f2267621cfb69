//! Scoped, thread-safe service container.
//!
//! Builders are registered under a [`Key`], a type or a name. Resolving a key in a named [`Scope`]
//! builds the instance once and caches it there, every caller in that scope gets the same instance.
//! Several builders may share a capability key, [`Container::all`] resolves all of them.
//!
//! ```rust
//! use std::sync::Arc;
//! use stevedore::{capability, Container};
//!
//! trait Notifier: Send + Sync {
//!     fn channel(&self) -> &'static str;
//! }
//!
//! struct Email;
//! struct Sms;
//!
//! impl Notifier for Email {
//!     fn channel(&self) -> &'static str {
//!         "email"
//!     }
//! }
//!
//! impl Notifier for Sms {
//!     fn channel(&self) -> &'static str {
//!         "sms"
//!     }
//! }
//!
//! capability!(dyn Notifier => [Email, Sms]);
//!
//! let container = Container::new();
//! container.provide_as::<dyn Notifier, _>(|_| Email);
//! container.provide_as::<dyn Notifier, _>(|_| Sms);
//! container.create_scope("request");
//!
//! let ctx = container.context().in_scope("request");
//! let notifiers = container.all::<dyn Notifier>("request", &ctx);
//! assert_eq!(notifiers.len(), 2);
//!
//! let email = container.get::<Email>("request", &ctx).unwrap();
//! assert!(std::ptr::addr_eq(Arc::as_ptr(&email), Arc::as_ptr(&notifiers[0])));
//!
//! container.delete_scope("request").unwrap();
//! ```
#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod capability;

pub(crate) mod any;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod instance;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod service;

#[doc(hidden)]
pub mod macros_utils;

pub use any::{Key, TypeInfo};
pub use capability::Upcast;
pub use config::Config;
pub use container::Container;
pub use context::{BuildContext, Context};
pub use errors::{DisposeError, DisposeFailure, RegisterErrorKind, ResolveErrorKind};
pub use finalizer::{Dispose, Finalizer};
pub use instance::Instance;
pub use registry::ConcurrentRegistry;
pub use scope::Scope;
pub use service::{provide, Provide, ServiceEntry};
