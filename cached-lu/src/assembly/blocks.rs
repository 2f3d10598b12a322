use faer::Mat;

use crate::{SolveError, system::BlockStructure, system::Mode};

/// Copy every cached block `d(of)/d(wrt)` into `jac[of, wrt]`
/// (or its transpose into `jac[wrt, of]` in transpose mode).
///
/// Blocks are looked up in the cache of `of`'s owner only.
/// A block nobody cached is left as zero: it means the two variables
/// don't affect each other, not that the derivative is unknown.
pub(crate) fn assemble_blocks(
    structure: &dyn BlockStructure,
    mode: Mode,
    jac: &mut Mat<f64>,
) -> Result<(), SolveError> {
    let n = jac.nrows();
    let variables = structure.variables();
    for (name, var) in variables.iter() {
        if var.slice.end > n {
            return Err(SolveError::SliceOutOfBounds {
                variable: name.to_owned(),
                slice: var.slice(),
                size: n,
            });
        }
    }

    jac.fill(0.0);
    for (of, out_var) in variables.iter() {
        let Some(partials) = structure.partials(out_var.owner()) else {
            continue;
        };
        for (wrt, in_var) in variables.iter() {
            let Some(block) = partials.get(of, wrt) else {
                continue;
            };
            let expected = (out_var.len(), in_var.len());
            let actual = (block.nrows(), block.ncols());
            if expected != actual {
                return Err(SolveError::BlockShapeMismatch {
                    of: of.to_owned(),
                    wrt: wrt.to_owned(),
                    expected,
                    actual,
                });
            }
            let (r0, c0) = (out_var.slice.start, in_var.slice.start);
            for j in 0..block.ncols() {
                for i in 0..block.nrows() {
                    match mode {
                        Mode::Forward => jac[(r0 + i, c0 + j)] = block[(i, j)],
                        Mode::Transpose => jac[(c0 + j, r0 + i)] = block[(i, j)],
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockSystem, IdGenerator, assembly::assemble_probe};

    /// Two variables from two components, `a` (2 entries) and `b` (1 entry).
    /// `b` doesn't depend on `a`.
    fn two_components() -> BlockSystem {
        let mut ids = IdGenerator::default();
        let (aero, structs) = (ids.next_id(), ids.next_id());
        let mut system = BlockSystem::new();
        system.add_variable("a", 2, aero).unwrap();
        system.add_variable("b", 1, structs).unwrap();
        system
            .set_partial("a", "a", Mat::from_fn(2, 2, |i, j| 1.0 + (i * 2 + j) as f64))
            .unwrap();
        system
            .set_partial("a", "b", Mat::from_fn(2, 1, |i, _| -(i as f64) - 1.0))
            .unwrap();
        system
            .set_partial("b", "b", Mat::from_fn(1, 1, |_, _| 7.0))
            .unwrap();
        system
    }

    #[test]
    fn places_blocks_at_their_slices() {
        let system = two_components();
        let mut jac = Mat::zeros(3, 3);
        assemble_blocks(&system, Mode::Forward, &mut jac).unwrap();
        let expected = Mat::from_fn(3, 3, |i, j| match (i, j) {
            (0, 0) => 1.0,
            (0, 1) => 2.0,
            (1, 0) => 3.0,
            (1, 1) => 4.0,
            (0, 2) => -1.0,
            (1, 2) => -2.0,
            (2, 2) => 7.0,
            _ => 0.0,
        });
        assert_eq!(jac, expected);
    }

    #[test]
    fn missing_blocks_are_zero_not_leftovers() {
        let system = two_components();
        // Garbage from a previous epoch must not survive into the uncoupled block.
        let mut jac = Mat::from_fn(3, 3, |_, _| 123.0);
        assemble_blocks(&system, Mode::Forward, &mut jac).unwrap();

        let mut explicit = two_components();
        explicit.set_partial("b", "a", Mat::zeros(1, 2)).unwrap();
        let mut jac_explicit = Mat::zeros(3, 3);
        assemble_blocks(&explicit, Mode::Forward, &mut jac_explicit).unwrap();

        assert_eq!(jac, jac_explicit);
        assert_eq!(jac[(2, 0)], 0.0);
        assert_eq!(jac[(2, 1)], 0.0);
    }

    #[test]
    fn matches_probing_in_both_modes() {
        let system = two_components();
        for mode in [Mode::Forward, Mode::Transpose] {
            let mut from_blocks = Mat::zeros(3, 3);
            let mut from_probe = Mat::zeros(3, 3);
            assemble_blocks(&system, mode, &mut from_blocks).unwrap();
            assemble_probe(&system, mode, &mut from_probe);
            assert_eq!(from_blocks, from_probe, "strategies disagree in {mode:?} mode");
        }
    }

    #[test]
    fn only_the_owner_is_asked() {
        // `b` belongs to `structs`, so a block for `b` cached by `aero` is ignored.
        let mut system = two_components();
        system
            .cache_mut(0)
            .insert("b", "a", Mat::from_fn(1, 2, |_, _| 5.0));
        let mut jac = Mat::zeros(3, 3);
        assemble_blocks(&system, Mode::Forward, &mut jac).unwrap();
        assert_eq!(jac[(2, 0)], 0.0);
        assert_eq!(jac[(2, 1)], 0.0);
    }

    #[test]
    fn rejects_misshapen_blocks() {
        let mut system = two_components();
        system
            .cache_mut(1)
            .insert("b", "a", Mat::zeros(2, 2));
        let mut jac = Mat::zeros(3, 3);
        let err = assemble_blocks(&system, Mode::Forward, &mut jac).unwrap_err();
        assert_eq!(
            err,
            SolveError::BlockShapeMismatch {
                of: "b".to_owned(),
                wrt: "a".to_owned(),
                expected: (1, 2),
                actual: (2, 2),
            }
        );
    }

    #[test]
    fn rejects_slices_past_the_end() {
        let system = two_components();
        let mut jac = Mat::zeros(2, 2);
        let err = assemble_blocks(&system, Mode::Forward, &mut jac).unwrap_err();
        assert_eq!(
            err,
            SolveError::SliceOutOfBounds {
                variable: "b".to_owned(),
                slice: 2..3,
                size: 2,
            }
        );
    }
}
