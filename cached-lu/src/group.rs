use crate::{
    CachedLuSolver, Config, SolveError,
    invalidation::{Linearization, SolveContext},
    solver::{RhsSet, SolutionSet},
    system::{LinearSystem, Mode},
    timing::Timings,
};

/// A coupled system bundled with its invalidation token and its linear solver.
///
/// The only way to change the system is [`CoupledGroup::linearize`],
/// which also marks the cached factorization stale,
/// so a solve can never see a factorization of an older linearization.
#[derive(Debug)]
pub struct CoupledGroup<S> {
    system: S,
    linearization: Linearization,
    solver: CachedLuSolver,
}

impl<S: LinearSystem> CoupledGroup<S> {
    /// Group this system with a fresh solver.
    pub fn new(system: S, config: Config) -> Self {
        Self {
            system,
            linearization: Linearization::new(),
            solver: CachedLuSolver::new(config),
        }
    }

    /// Move the point of linearization. `update` may change anything about
    /// the system, including its size; the next solve refactors.
    pub fn linearize<F: FnOnce(&mut S)>(&mut self, update: F) {
        update(&mut self.system);
        self.mark_stale();
    }

    /// Force the next solve to refactor without changing the system.
    pub fn mark_stale(&mut self) {
        let epoch = self.linearization.mark_stale();
        log::trace!("coupled group moved to {epoch}");
    }

    /// Solve every right-hand side against the current linearization.
    pub fn solve_linear(&mut self, rhs: &RhsSet, mode: Mode) -> Result<SolutionSet, SolveError> {
        let ctx = SolveContext {
            system: &self.system,
            mode,
            epoch: self.linearization.epoch(),
        };
        self.solver.solve(rhs, ctx)
    }

    /// The coupled system.
    pub fn system(&self) -> &S {
        &self.system
    }

    /// The linear solver.
    pub fn solver(&self) -> &CachedLuSolver {
        &self.solver
    }

    /// Time spent in the linear solver so far.
    pub fn timings(&self) -> &Timings {
        self.solver.timings()
    }

    /// Take the system back.
    pub fn into_inner(self) -> S {
        self.system
    }
}
