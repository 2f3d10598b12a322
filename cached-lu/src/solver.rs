//! The solve engine: assemble and factor once per epoch, back-substitute many times.
use faer::{Mat, MatRef};
use indexmap::IndexMap;

use crate::{
    SolveError,
    assembly,
    config::Config,
    factorization::{DenseFactorization, new_factorization, solve_columns},
    invalidation::{FactorKey, SolveContext},
    system::LinearSystem,
    timing::{Phase, Stopwatch, Timings},
};

/// Right-hand sides, keyed by variable of interest. Solved in insertion order.
pub type RhsSet = IndexMap<String, Vec<f64>>;

/// Solutions, with the same keys in the same order as the [`RhsSet`] they came from.
pub type SolutionSet = IndexMap<String, Vec<f64>>;

/// Key used by [`CachedLuSolver::solve_one`] in errors.
const SINGLE_RHS_KEY: &str = "rhs";

/// Direct linear solver which keeps one dense LU factorization
/// and reuses it for every right-hand side until the system is relinearized.
///
/// Owns its Jacobian buffer and factorization exclusively.
/// Don't share one solver between coupled systems.
pub struct CachedLuSolver {
    config: Config,
    /// The last assembled matrix. Rebuilt in place.
    jacobian: Mat<f64>,
    factorization: Box<dyn DenseFactorization>,
    /// What the current factorization was built from.
    /// `None` until the first rebuild, and after any failed one.
    factored: Option<FactorKey>,
    timings: Timings,
}

impl Default for CachedLuSolver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for CachedLuSolver {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedLuSolver")
            .field("config", &self.config)
            .field("size", &self.jacobian.nrows())
            .field("factored", &self.factored)
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

impl CachedLuSolver {
    /// A solver with nothing factored yet and all timers at zero.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            jacobian: Mat::zeros(0, 0),
            factorization: new_factorization(config.pivoting),
            factored: None,
            timings: Timings::default(),
        }
    }

    /// How this solver was configured.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Time spent so far in each phase.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// The most recently factored Jacobian, if one is current.
    pub fn jacobian(&self) -> Option<MatRef<'_, f64>> {
        self.factored.map(|_| self.jacobian.as_ref())
    }

    /// Would solving in this context have to rebuild the factorization?
    /// True if nothing is factored yet, or the epoch, size, mode or
    /// assembly strategy differ from the last rebuild.
    pub fn is_stale<S: LinearSystem + ?Sized>(&self, ctx: SolveContext<'_, S>) -> bool {
        let Some(factored) = self.factored else {
            return true;
        };
        let Ok(strategy) = assembly::resolve(self.config.assembly, ctx.system) else {
            return true;
        };
        factored
            != (FactorKey {
                epoch: ctx.epoch,
                size: ctx.system.size(),
                mode: ctx.mode,
                strategy,
            })
    }

    /// Forget the current factorization, so the next solve rebuilds it.
    pub fn invalidate(&mut self) {
        self.factored = None;
    }

    /// Solve `J x = b` (or `Jᵀ x = b`) for every right-hand side in `rhs`.
    ///
    /// If the factorization is stale it is reassembled and refactored first,
    /// exactly once no matter how many right-hand sides there are.
    /// Every right-hand side is checked against the system's size
    /// before any of that work happens.
    pub fn solve<S: LinearSystem + ?Sized>(
        &mut self,
        rhs: &RhsSet,
        ctx: SolveContext<'_, S>,
    ) -> Result<SolutionSet, SolveError> {
        let n = ctx.system.size();
        if n == 0 {
            return Err(SolveError::EmptySystemNotAllowed);
        }
        for (key, b) in rhs {
            if b.len() != n {
                return Err(SolveError::DimensionMismatch {
                    key: key.clone(),
                    expected: n,
                    actual: b.len(),
                });
            }
        }
        if rhs.is_empty() {
            return Ok(SolutionSet::new());
        }

        if self.is_stale(ctx) {
            self.rebuild(ctx)?;
        }

        let solutions = if self.config.batch_rhs {
            self.back_substitute_batch(rhs, n)
        } else {
            self.back_substitute_each(rhs, n)
        };
        for (key, x) in &solutions {
            if x.iter().any(|v| !v.is_finite()) {
                return Err(SolveError::NonFiniteSolution { key: key.clone() });
            }
        }
        Ok(solutions)
    }

    /// Like [`CachedLuSolver::solve`] but for one unnamed right-hand side.
    pub fn solve_one<S: LinearSystem + ?Sized>(
        &mut self,
        rhs: &[f64],
        ctx: SolveContext<'_, S>,
    ) -> Result<Vec<f64>, SolveError> {
        let set = RhsSet::from([(SINGLE_RHS_KEY.to_owned(), rhs.to_vec())]);
        let mut solutions = self.solve(&set, ctx)?;
        Ok(solutions.swap_remove(SINGLE_RHS_KEY).unwrap_or_default())
    }

    /// Assemble and factor, then record what was factored.
    fn rebuild<S: LinearSystem + ?Sized>(&mut self, ctx: SolveContext<'_, S>) -> Result<(), SolveError> {
        // Whatever was cached is about to be overwritten.
        let previous = self.factored.take();
        let n = ctx.system.size();
        let strategy = assembly::resolve(self.config.assembly, ctx.system)?;
        if let Some(previous) = previous.filter(|previous| previous.size != n) {
            log::debug!(
                "system size changed from {} to {n}, rebuilding regardless of epoch",
                previous.size
            );
        }

        let watch = Stopwatch::start(self.config.record_timings);
        let assembled = assembly::assemble(ctx.system, ctx.mode, strategy, &mut self.jacobian);
        self.timings.record(Phase::Assembly, 1, watch.stop());
        assembled?;

        #[cfg(feature = "dbg-jac")]
        log::debug!("assembled Jacobian ({strategy}, {:?}): {:?}", ctx.mode, self.jacobian);

        let scale = assembly::max_abs_entry(&self.jacobian)?;
        let watch = Stopwatch::start(self.config.record_timings);
        let factored = self.factorization.factor(
            self.jacobian.as_ref(),
            scale,
            self.config.pivot_tolerance,
        );
        self.timings.record(Phase::Factorization, 1, watch.stop());
        factored?;

        log::debug!(
            "refactored {n}x{n} Jacobian for {} ({:?} mode, {strategy} assembly); {}",
            ctx.epoch,
            ctx.mode,
            self.timings
        );
        self.factored = Some(FactorKey {
            epoch: ctx.epoch,
            size: n,
            mode: ctx.mode,
            strategy,
        });
        Ok(())
    }

    /// One triangular solve per key, in insertion order,
    /// reusing one scratch column.
    fn back_substitute_each(&mut self, rhs: &RhsSet, n: usize) -> SolutionSet {
        let mut solutions = SolutionSet::with_capacity(rhs.len());
        let mut scratch = Mat::<f64>::zeros(n, 1);
        for (key, b) in rhs {
            log::trace!("solving for {key}");
            for (i, value) in b.iter().copied().enumerate() {
                scratch[(i, 0)] = value;
            }
            let watch = Stopwatch::start(self.config.record_timings);
            solve_columns(&*self.factorization, &mut scratch);
            self.timings.record(Phase::Solve, 1, watch.stop());
            let x = (0..n).map(|i| scratch[(i, 0)]).collect();
            solutions.insert(key.clone(), x);
        }
        solutions
    }

    /// Every key as one column of a single `n x k` solve.
    fn back_substitute_batch(&mut self, rhs: &RhsSet, n: usize) -> SolutionSet {
        let columns: Vec<&Vec<f64>> = rhs.values().collect();
        let mut block = Mat::from_fn(n, columns.len(), |i, j| columns[j][i]);
        log::trace!("solving {} right-hand sides at once", columns.len());
        let watch = Stopwatch::start(self.config.record_timings);
        solve_columns(&*self.factorization, &mut block);
        self.timings.record(Phase::Solve, columns.len(), watch.stop());
        rhs.keys()
            .enumerate()
            .map(|(j, key)| (key.clone(), (0..n).map(|i| block[(i, j)]).collect()))
            .collect()
    }
}
