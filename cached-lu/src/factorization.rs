//! Dense LU decompositions which can be factored once and applied many times.
use faer::{
    Mat, MatMut, MatRef,
    linalg::solvers::{FullPivLu, PartialPivLu},
    prelude::Solve,
};

use crate::{SolveError, config::Pivoting};

/// A decomposition of one Jacobian snapshot.
pub trait DenseFactorization {
    /// Decompose `a`, replacing whatever was factored before.
    /// `scale` is the largest absolute entry of `a`, used for the singularity cutoff.
    fn factor(&mut self, a: MatRef<'_, f64>, scale: f64, tolerance: f64) -> Result<(), SolveError>;

    /// Overwrites each column of `rhs` with the solution of `A x = rhs`.
    fn solve_in_place(&self, rhs: MatMut<'_, f64>);
}

/// Build the decomposition this pivoting strategy asks for.
pub(crate) fn new_factorization(pivoting: Pivoting) -> Box<dyn DenseFactorization> {
    match pivoting {
        Pivoting::Partial => Box::<PartialLu>::default(),
        Pivoting::Full => Box::<FullLu>::default(),
    }
}

/// `PA = LU`: a row permutation plus combined lower/upper triangular factors.
#[derive(Default)]
pub struct PartialLu {
    lu: Option<PartialPivLu<f64>>,
}

impl DenseFactorization for PartialLu {
    fn factor(&mut self, a: MatRef<'_, f64>, scale: f64, tolerance: f64) -> Result<(), SolveError> {
        // Drop the old factors first, so a failed factorization can't be reused.
        self.lu = None;
        let lu = a.partial_piv_lu();
        check_pivots(lu.U(), scale, tolerance)?;
        self.lu = Some(lu);
        Ok(())
    }

    fn solve_in_place(&self, mut rhs: MatMut<'_, f64>) {
        let Some(lu) = self.lu.as_ref() else {
            // Nothing was factored; the solver never gets here.
            return;
        };
        // `solve` returns a new matrix, so copy the result back to keep this in-place.
        let solution = lu.solve(rhs.as_ref());
        rhs.copy_from(&solution);
    }
}

/// `PAQ = LU`: row and column permutations.
#[derive(Default)]
pub struct FullLu {
    lu: Option<FullPivLu<f64>>,
}

impl DenseFactorization for FullLu {
    fn factor(&mut self, a: MatRef<'_, f64>, scale: f64, tolerance: f64) -> Result<(), SolveError> {
        self.lu = None;
        let lu = a.full_piv_lu();
        check_pivots(lu.U(), scale, tolerance)?;
        self.lu = Some(lu);
        Ok(())
    }

    fn solve_in_place(&self, mut rhs: MatMut<'_, f64>) {
        let Some(lu) = self.lu.as_ref() else {
            return;
        };
        let solution = lu.solve(rhs.as_ref());
        rhs.copy_from(&solution);
    }
}

/// A pivot is zero if it's non-finite, or no bigger than
/// `tolerance * n * scale`, mirroring LAPACK's rank cutoff.
fn check_pivots(u: MatRef<'_, f64>, scale: f64, tolerance: f64) -> Result<(), SolveError> {
    let n = u.nrows().min(u.ncols());
    let threshold = tolerance * (n as f64) * scale;
    for pivot in 0..n {
        let magnitude = u.get(pivot, pivot).abs();
        if !magnitude.is_finite() || magnitude <= threshold {
            return Err(SolveError::SingularSystem {
                pivot,
                magnitude,
                threshold,
            });
        }
    }
    Ok(())
}

/// Solve a batch of right-hand sides held as columns of one matrix.
pub(crate) fn solve_columns(factorization: &dyn DenseFactorization, rhs: &mut Mat<f64>) {
    factorization.solve_in_place(rhs.as_mut());
}
