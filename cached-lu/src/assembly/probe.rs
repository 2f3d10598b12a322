use faer::Mat;

use crate::system::{LinearSystem, Mode};

/// Column `i` of `jac` becomes `apply(e_i, mode)`.
/// The operator handles transposition itself, so `mode` is passed straight through.
pub(crate) fn assemble_probe<S: LinearSystem + ?Sized>(system: &S, mode: Mode, jac: &mut Mat<f64>) {
    let n = system.size();
    debug_assert_eq!(jac.nrows(), n, "Jacobian must be resized before probing");

    // One basis vector and one output column, reused for every probe.
    let mut basis = vec![0.0; n];
    let mut column = vec![0.0; n];
    for col in 0..n {
        basis[col] = 1.0;
        column.fill(0.0);
        system.apply(&basis, mode, &mut column);
        basis[col] = 0.0;
        for (row, value) in column.iter().copied().enumerate() {
            jac[(row, col)] = value;
        }
    }
}
