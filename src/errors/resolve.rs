use alloc::string::String;

use crate::any::{Key, TypeInfo};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("Service {key} not found in container")]
    ServiceNotFound { key: Key },
    #[error("Scope {name} not found in container")]
    ScopeNotFound { name: String },
    #[error("Incorrect instance type for {key}. Actual: {}, expected: {}", actual.name, expected.name)]
    IncorrectType { key: Key, expected: TypeInfo, actual: TypeInfo },
}
