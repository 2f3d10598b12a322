//! Ready-made [`LinearSystem`]s.
use faer::{Mat, MatRef};
use indexmap::IndexMap;

use crate::{
    RegistryError,
    id::ComponentId,
    registry::{PartialCache, VariableRegistry},
    system::{BlockStructure, LinearSystem, Mode},
};

/// An explicit square matrix, exposed only through matrix-vector products.
#[derive(Clone, Debug)]
pub struct DenseOperator {
    matrix: Mat<f64>,
}

impl DenseOperator {
    /// Wrap a square matrix.
    ///
    /// # Panics
    /// If the matrix isn't square.
    pub fn new(matrix: Mat<f64>) -> Self {
        assert_eq!(
            matrix.nrows(),
            matrix.ncols(),
            "A linear operator must be square, but this matrix is {}x{}",
            matrix.nrows(),
            matrix.ncols()
        );
        Self { matrix }
    }

    /// The wrapped matrix.
    pub fn matrix(&self) -> &Mat<f64> {
        &self.matrix
    }

    /// Swap in a new matrix, e.g. after relinearizing.
    /// The size may change.
    ///
    /// # Panics
    /// If the matrix isn't square.
    pub fn set_matrix(&mut self, matrix: Mat<f64>) {
        *self = Self::new(matrix);
    }
}

impl LinearSystem for DenseOperator {
    fn size(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, input: &[f64], mode: Mode, out: &mut [f64]) {
        let a = match mode {
            Mode::Forward => self.matrix.as_ref(),
            Mode::Transpose => self.matrix.transpose(),
        };
        accumulate(a, input, out);
    }
}

/// `out += a * input`, one column of `a` at a time.
/// Columns whose input is zero are skipped entirely, so a non-finite entry
/// only shows up in products which actually touch its column.
fn accumulate(a: MatRef<'_, f64>, input: &[f64], out: &mut [f64]) {
    for (j, &x) in input.iter().enumerate().take(a.ncols()) {
        if x == 0.0 {
            continue;
        }
        for (o, &a_ij) in out.iter_mut().zip(a.col(j).iter()) {
            *o += a_ij * x;
        }
    }
}

/// A coupled system described entirely by the partial-derivative blocks
/// its components cache during linearization.
///
/// Its matrix-free product is the block product, so probing it and
/// assembling it from blocks give the same matrix.
#[derive(Clone, Debug, Default)]
pub struct BlockSystem {
    variables: VariableRegistry,
    caches: IndexMap<ComponentId, PartialCache>,
}

impl BlockSystem {
    /// A system with no variables yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next variable, owned by `owner`.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        len: usize,
        owner: ComponentId,
    ) -> Result<std::ops::Range<usize>, RegistryError> {
        self.variables.add(name, len, owner)
    }

    /// Cache `d(of)/d(wrt)` in the cache of `of`'s owner.
    /// Both variables must already be registered.
    /// Shapes are checked when the Jacobian gets assembled.
    pub fn set_partial(&mut self, of: &str, wrt: &str, block: Mat<f64>) -> Result<(), RegistryError> {
        let owner = self
            .variables
            .get(of)
            .ok_or_else(|| RegistryError::UnknownVariable {
                name: of.to_owned(),
            })?
            .owner();
        if self.variables.get(wrt).is_none() {
            return Err(RegistryError::UnknownVariable {
                name: wrt.to_owned(),
            });
        }
        self.cache_mut(owner).insert(of, wrt, block);
        Ok(())
    }

    /// Direct access to one component's cache, creating it if needed.
    pub fn cache_mut(&mut self, owner: ComponentId) -> &mut PartialCache {
        self.caches.entry(owner).or_default()
    }

    /// Drop every cached block, e.g. before relinearizing.
    pub fn clear_partials(&mut self) {
        self.caches.clear();
    }
}

impl BlockStructure for BlockSystem {
    fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    fn partials(&self, owner: ComponentId) -> Option<&PartialCache> {
        self.caches.get(&owner)
    }
}

impl LinearSystem for BlockSystem {
    fn size(&self) -> usize {
        self.variables.size()
    }

    fn apply(&self, input: &[f64], mode: Mode, out: &mut [f64]) {
        for (of, out_var) in self.variables.iter() {
            let Some(partials) = self.partials(out_var.owner()) else {
                continue;
            };
            for (wrt, in_var) in self.variables.iter() {
                let Some(block) = partials.get(of, wrt) else {
                    continue;
                };
                let (rows, cols) = (out_var.slice(), in_var.slice());
                // Misshapen blocks are reported by assembly, so just stay in bounds here.
                let nrows = block.nrows().min(rows.len());
                let ncols = block.ncols().min(cols.len());
                let block = block.as_ref().submatrix(0, 0, nrows, ncols);
                let (rows, cols) = (rows.start..rows.start + nrows, cols.start..cols.start + ncols);
                match mode {
                    Mode::Forward => accumulate(block, &input[cols], &mut out[rows]),
                    Mode::Transpose => {
                        accumulate(block.transpose(), &input[rows], &mut out[cols]);
                    }
                }
            }
        }
    }

    fn block_structure(&self) -> Option<&dyn BlockStructure> {
        Some(self)
    }
}
