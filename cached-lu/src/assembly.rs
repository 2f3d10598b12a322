//! Building the dense Jacobian which gets factored.
use faer::Mat;

use crate::{
    SolveError,
    config::AssemblyStrategy,
    system::{LinearSystem, Mode},
};

/// Copying cached partial-derivative blocks into place.
mod blocks;
/// Applying the operator to each basis vector.
mod probe;

pub(crate) use blocks::assemble_blocks;
pub(crate) use probe::assemble_probe;

/// Picks the concrete strategy for this system.
/// Never returns [`AssemblyStrategy::Auto`].
pub(crate) fn resolve<S: LinearSystem + ?Sized>(
    strategy: AssemblyStrategy,
    system: &S,
) -> Result<AssemblyStrategy, SolveError> {
    let has_blocks = system.block_structure().is_some();
    match strategy {
        AssemblyStrategy::Probe => Ok(AssemblyStrategy::Probe),
        AssemblyStrategy::Blocks if has_blocks => Ok(AssemblyStrategy::Blocks),
        AssemblyStrategy::Blocks => Err(SolveError::MissingBlockStructure),
        AssemblyStrategy::Auto if has_blocks => Ok(AssemblyStrategy::Blocks),
        AssemblyStrategy::Auto => Ok(AssemblyStrategy::Probe),
    }
}

/// Overwrite `jac` with the system's Jacobian (or its transpose, in transpose mode).
/// `strategy` must already be resolved.
pub(crate) fn assemble<S: LinearSystem + ?Sized>(
    system: &S,
    mode: Mode,
    strategy: AssemblyStrategy,
    jac: &mut Mat<f64>,
) -> Result<(), SolveError> {
    let n = system.size();
    if jac.nrows() != n || jac.ncols() != n {
        *jac = Mat::zeros(n, n);
    }
    match strategy {
        AssemblyStrategy::Blocks => {
            let structure = system
                .block_structure()
                .ok_or(SolveError::MissingBlockStructure)?;
            assemble_blocks(structure, mode, jac)
        }
        AssemblyStrategy::Probe | AssemblyStrategy::Auto => {
            assemble_probe(system, mode, jac);
            Ok(())
        }
    }
}

/// Largest absolute entry of the matrix, used to scale the singularity cutoff.
/// Fails on the first NaN or infinity.
pub(crate) fn max_abs_entry(jac: &Mat<f64>) -> Result<f64, SolveError> {
    let mut largest = 0.0;
    for col in 0..jac.ncols() {
        for row in 0..jac.nrows() {
            let value = jac[(row, col)];
            if !value.is_finite() {
                return Err(SolveError::NonFiniteJacobian { row, col });
            }
            largest = libm::fmax(largest, value.abs());
        }
    }
    Ok(largest)
}
