mod dispose;
mod register;
mod resolve;

pub use dispose::{DisposeError, DisposeFailure};
pub use register::RegisterErrorKind;
pub use resolve::ResolveErrorKind;
