use std::ops::Range;

/// Errors that could occur while assembling, factoring or applying
/// the cached factorization.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum SolveError {
    /// A right-hand side had the wrong length.
    /// Raised before any assembly or factorization work happens.
    #[error(
        "Right-hand side {key:?} has length {actual} but the system has {expected} unknowns"
    )]
    DimensionMismatch {
        /// Which right-hand side was wrong.
        key: String,
        /// The system's dimension.
        expected: usize,
        /// The right-hand side's length.
        actual: usize,
    },
    /// The assembled Jacobian can't be inverted to the working tolerance.
    #[error(
        "The Jacobian is singular: pivot {pivot} has magnitude {magnitude:e}, at or below the threshold {threshold:e}"
    )]
    SingularSystem {
        /// Which diagonal entry of `U` was too small.
        pivot: usize,
        /// Its absolute value.
        magnitude: f64,
        /// The cutoff it was compared against.
        threshold: f64,
    },
    /// The assembled Jacobian contained NaN or infinity.
    #[error("The Jacobian has a non-finite entry at row {row}, column {col}")]
    NonFiniteJacobian {
        /// Row of the bad entry.
        row: usize,
        /// Column of the bad entry.
        col: usize,
    },
    /// Back-substitution produced NaN or infinity.
    #[error("The solution for {key:?} is not finite")]
    NonFiniteSolution {
        /// Which right-hand side produced it.
        key: String,
    },
    /// Block assembly was requested, but the system has no variable registry
    /// or partial-derivative caches to assemble from.
    #[error("Block assembly was requested but the system exposes no block structure")]
    MissingBlockStructure,
    /// A cached partial-derivative block doesn't fit the slices of its variables.
    #[error(
        "Partial d({of})/d({wrt}) should be {expected:?} (rows, cols) but the cached block is {actual:?}"
    )]
    BlockShapeMismatch {
        /// Output variable.
        of: String,
        /// Input variable.
        wrt: String,
        /// Shape implied by the variables' slices.
        expected: (usize, usize),
        /// Shape of the cached block.
        actual: (usize, usize),
    },
    /// A variable's slice runs past the end of the state vector.
    #[error("Variable {variable} occupies {slice:?} but the system only has {size} unknowns")]
    SliceOutOfBounds {
        /// The offending variable.
        variable: String,
        /// Its slice in the flattened state.
        slice: Range<usize>,
        /// The system's dimension.
        size: usize,
    },
    /// You tried to solve a system with no unknowns.
    #[error("Cannot solve an empty system")]
    EmptySystemNotAllowed,
}

/// Errors from building a variable registry or filling partial caches.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum RegistryError {
    /// Every variable name must be unique within one system.
    #[error("Variable {name} was registered twice")]
    DuplicateVariable {
        /// The repeated name.
        name: String,
    },
    /// Variables must own at least one entry of the state vector.
    #[error("Variable {name} would occupy zero entries of the state vector")]
    EmptySlice {
        /// The empty variable.
        name: String,
    },
    /// A partial derivative referred to a variable which was never registered.
    #[error("Variable {name} was never registered")]
    UnknownVariable {
        /// The unregistered name.
        name: String,
    },
}
