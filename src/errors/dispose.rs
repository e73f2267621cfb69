use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display, Formatter};

use crate::any::Key;

/// Disposal hook failure of a single instance
#[derive(Debug)]
pub struct DisposeFailure {
    pub scope: String,
    pub key: Key,
    pub error: anyhow::Error,
}

impl Display for DisposeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} in scope {}: {}", self.key, self.scope, self.error)
    }
}

/// Every disposal failure collected while closing one or more scopes
#[derive(thiserror::Error, Debug, Default)]
pub struct DisposeError {
    pub failures: Vec<DisposeFailure>,
}

impl DisposeError {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    #[inline]
    pub(crate) fn extend(&mut self, other: DisposeError) {
        self.failures.extend(other.failures);
    }

    /// `Ok(())` when nothing failed
    #[inline]
    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for DisposeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to dispose {} instance(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}
