//! Cached dense LU solves for coupled multidisciplinary systems.
//!
//! Every nonlinear iteration of a coupled aero-structural solve needs linear
//! solves against the same Jacobian, often with several right-hand sides
//! (one per variable of interest). This crate turns the coupled system's
//! operator into a dense matrix, factors it once per linearization,
//! and reuses that factorization for every right-hand side until the
//! system is linearized again.
//!
//! The matrix can be built by probing a matrix-free operator with each basis
//! vector, or from the partial-derivative blocks each component cached.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use crate::config::{AssemblyStrategy, Config, Pivoting};
pub use crate::error::{RegistryError, SolveError};
pub use crate::factorization::{DenseFactorization, FullLu, PartialLu};
pub use crate::group::CoupledGroup;
pub use crate::id::{ComponentId, IdGenerator};
pub use crate::invalidation::{Epoch, Linearization, SolveContext};
pub use crate::operators::{BlockSystem, DenseOperator};
pub use crate::registry::{PartialCache, Variable, VariableRegistry};
pub use crate::solver::{CachedLuSolver, RhsSet, SolutionSet};
pub use crate::system::{BlockStructure, LinearSystem, Mode};
pub use crate::timing::{Phase, Timings};

/// Building the dense Jacobian, by probing or from cached blocks.
mod assembly;
/// Solver configuration.
mod config;
/// Errors.
mod error;
/// LU decompositions.
mod factorization;
/// A system bundled with its invalidation token and solver.
mod group;
/// IDs of components which own variables.
mod id;
/// Epochs and the staleness check.
mod invalidation;
/// Ready-made linear systems.
mod operators;
/// Variables and partial-derivative caches.
mod registry;
/// The solve engine.
mod solver;
/// Traits describing the systems being solved.
mod system;
/// Per-phase timers.
mod timing;
