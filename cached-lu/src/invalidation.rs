//! Deciding when a cached factorization may be reused.
//!
//! The coupling group owns a [`Linearization`] token and advances its epoch
//! every time it moves the point of linearization. The solver remembers which
//! epoch (and which size and mode) its factorization was built for,
//! and rebuilds whenever the caller's context disagrees.
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    config::AssemblyStrategy,
    system::{LinearSystem, Mode},
};

/// The next epoch to hand out. Shared by every token in the process,
/// so no two linearizations of any two systems share an epoch.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(0);

/// Identifies one invalidation epoch, i.e. the span between two
/// linearizations of the coupled system.
///
/// Epochs are unique within the process. A solver that last factored
/// some other system can never mistake that factorization for this one's,
/// even when both systems have the same size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    /// An epoch nobody else has. Later calls give larger epochs.
    pub fn fresh() -> Self {
        Self(NEXT_EPOCH.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Epoch {
    #[mutants::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}", self.0)
    }
}

/// Invalidation token owned by whoever linearizes the system.
#[derive(Debug)]
pub struct Linearization {
    epoch: Epoch,
}

impl Default for Linearization {
    fn default() -> Self {
        Self::new()
    }
}

impl Linearization {
    /// Starts in a fresh epoch.
    pub fn new() -> Self {
        Self {
            epoch: Epoch::fresh(),
        }
    }

    /// The point of linearization changed, so any factorization built before
    /// now is stale. Returns the new epoch.
    pub fn mark_stale(&mut self) -> Epoch {
        self.epoch = Epoch::fresh();
        self.epoch
    }

    /// The current epoch, to pass into a solve.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }
}

/// Everything one solve needs to know about its caller.
/// Passed by value into every call rather than stored on the solver.
#[derive(Debug)]
pub struct SolveContext<'a, S: ?Sized> {
    /// The operator to solve against.
    pub system: &'a S,
    /// Whether to solve the forward or transpose system.
    pub mode: Mode,
    /// The caller's current epoch.
    pub epoch: Epoch,
}

impl<S: ?Sized> Clone for SolveContext<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for SolveContext<'_, S> {}

impl<'a, S: LinearSystem + ?Sized> SolveContext<'a, S> {
    /// Solve `J x = b` against this system in this epoch.
    pub fn forward(system: &'a S, epoch: Epoch) -> Self {
        Self {
            system,
            mode: Mode::Forward,
            epoch,
        }
    }

    /// Solve `Jᵀ x = b` against this system in this epoch.
    pub fn transpose(system: &'a S, epoch: Epoch) -> Self {
        Self {
            system,
            mode: Mode::Transpose,
            epoch,
        }
    }
}

/// What a factorization was built from.
/// If any field differs from the caller's context, the factorization is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FactorKey {
    pub epoch: Epoch,
    pub size: usize,
    pub mode: Mode,
    pub strategy: AssemblyStrategy,
}
