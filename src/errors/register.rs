use crate::any::Key;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterErrorKind {
    #[error("Builder not set for service registered under {key}")]
    InvalidBuilder { key: Key },
    #[error("Produced type {produced} doesn't satisfy the registered capability {key}")]
    TypeMismatch { key: Key, produced: Key },
}
