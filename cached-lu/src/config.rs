use std::fmt;

/// How to turn the operator into an explicit matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum AssemblyStrategy {
    /// Apply the operator to every standard basis vector.
    /// Works for any operator, costs `n` products.
    Probe,
    /// Copy the partial-derivative blocks each component cached.
    /// Requires the system to expose a block structure.
    Blocks,
    /// Use blocks if the system exposes them, otherwise probe.
    #[default]
    Auto,
}

impl fmt::Display for AssemblyStrategy {
    #[mutants::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssemblyStrategy::Probe => "probe",
            AssemblyStrategy::Blocks => "blocks",
            AssemblyStrategy::Auto => "auto",
        })
    }
}

/// Which dense LU decomposition to cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Pivoting {
    /// Row pivoting only. `PA = LU`.
    #[default]
    Partial,
    /// Row and column pivoting. `PAQ = LU`. Slower, more robust.
    Full,
}

/// Configuration for [`crate::CachedLuSolver`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How the Jacobian gets assembled on a rebuild.
    pub assembly: AssemblyStrategy,
    /// Which decomposition gets cached.
    pub pivoting: Pivoting,
    /// A pivot `u_ii` counts as zero if
    /// `|u_ii| <= pivot_tolerance * n * max|J|`.
    pub pivot_tolerance: f64,
    /// Back-substitute every right-hand side of a call at once,
    /// as one `n x k` matrix, instead of one key at a time.
    pub batch_rhs: bool,
    /// Accumulate wall-clock time per phase.
    /// Call counts are always kept.
    pub record_timings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assembly: AssemblyStrategy::default(),
            pivoting: Pivoting::default(),
            pivot_tolerance: f64::EPSILON,
            batch_rhs: false,
            record_timings: true,
        }
    }
}

impl Config {
    /// Always assemble by probing.
    pub fn probe() -> Self {
        Self {
            assembly: AssemblyStrategy::Probe,
            ..Default::default()
        }
    }

    /// Always assemble from cached partial-derivative blocks.
    pub fn blocks() -> Self {
        Self {
            assembly: AssemblyStrategy::Blocks,
            ..Default::default()
        }
    }

    /// Set the assembly strategy.
    pub fn with_assembly(mut self, assembly: AssemblyStrategy) -> Self {
        self.assembly = assembly;
        self
    }

    /// Set the decomposition.
    pub fn with_pivoting(mut self, pivoting: Pivoting) -> Self {
        self.pivoting = pivoting;
        self
    }

    /// Set the relative singularity cutoff.
    pub fn with_pivot_tolerance(mut self, pivot_tolerance: f64) -> Self {
        self.pivot_tolerance = pivot_tolerance;
        self
    }

    /// Solve all right-hand sides of a call in one batch.
    pub fn with_batch_rhs(mut self, enabled: bool) -> Self {
        self.batch_rhs = enabled;
        self
    }

    /// Turn wall-clock timing on or off.
    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.record_timings = enabled;
        self
    }
}
