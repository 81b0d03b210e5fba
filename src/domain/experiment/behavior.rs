//! Behaviors: named code paths that an experiment can run

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_BEHAVIOR_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// BehaviorId
// ============================================================================

/// Process-unique identity of a behavior
///
/// Clones of a [`Behavior`] share their identity; two behaviors built from
/// the same closure are still distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(u64);

impl BehaviorId {
    fn next() -> Self {
        Self(NEXT_BEHAVIOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw identifier
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behavior-{}", self.0)
    }
}

// ============================================================================
// Behavior
// ============================================================================

type BehaviorFn<A, T, E> = dyn Fn(&A) -> Result<T, E> + Send + Sync;

/// A named callable that produces a value or fails
pub struct Behavior<A, T, E> {
    id: BehaviorId,
    name: Arc<str>,
    function: Arc<BehaviorFn<A, T, E>>,
}

impl<A, T, E> Behavior<A, T, E> {
    /// Create a new behavior with a fresh identity
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            id: BehaviorId::next(),
            name: Arc::from(name.into()),
            function: Arc::new(function),
        }
    }

    /// Get the behavior identity
    pub fn id(&self) -> BehaviorId {
        self.id
    }

    /// Get the behavior name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether both handles refer to the same behavior
    pub fn is(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Invoke the behavior
    pub fn call(&self, args: &A) -> Result<T, E> {
        (self.function)(args)
    }
}

impl<A, T, E> Clone for Behavior<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            function: Arc::clone(&self.function),
        }
    }
}

impl<A, T, E> fmt::Debug for Behavior<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
