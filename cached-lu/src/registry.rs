//! Variables of a coupled system and the per-component caches of their partial derivatives.
use std::ops::Range;

use faer::Mat;
use indexmap::IndexMap;

use crate::{RegistryError, id::ComponentId};

/// One named variable of the coupled system.
/// Occupies a contiguous slice of the flattened state vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub(crate) slice: Range<usize>,
    pub(crate) owner: ComponentId,
}

impl Variable {
    /// Where this variable lives in the flattened state vector.
    pub fn slice(&self) -> Range<usize> {
        self.slice.clone()
    }

    /// How many scalar unknowns this variable has.
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    /// Variables always have at least one entry.
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    /// The component which computes this variable's residual,
    /// and therefore caches its partial derivatives.
    pub fn owner(&self) -> ComponentId {
        self.owner
    }
}

/// Ordered mapping from variable name to its slice and owner.
/// Variables are laid out back-to-back in registration order.
#[derive(Clone, Debug, Default)]
pub struct VariableRegistry {
    variables: IndexMap<String, Variable>,
    size: usize,
}

impl VariableRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable of `len` unknowns, owned by `owner`.
    /// It is placed directly after the previously registered variable.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        len: usize,
        owner: ComponentId,
    ) -> Result<Range<usize>, RegistryError> {
        let name = name.into();
        if len == 0 {
            return Err(RegistryError::EmptySlice { name });
        }
        if self.variables.contains_key(&name) {
            return Err(RegistryError::DuplicateVariable { name });
        }
        let slice = self.size..self.size + len;
        self.size += len;
        self.variables.insert(
            name,
            Variable {
                slice: slice.clone(),
                owner,
            },
        );
        Ok(slice)
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Total number of scalar unknowns across all variables.
    pub fn size(&self) -> usize {
        self.size
    }

    /// How many variables were registered.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Were any variables registered?
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variables in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(name, var)| (name.as_str(), var))
    }
}

/// One component's cache of partial derivatives, `d(of)/d(wrt)`.
/// Each block has `len(of)` rows and `len(wrt)` columns.
///
/// A missing block means the two variables aren't coupled,
/// i.e. the block is exactly zero.
#[derive(Clone, Debug, Default)]
pub struct PartialCache {
    blocks: IndexMap<String, IndexMap<String, Mat<f64>>>,
}

impl PartialCache {
    /// An empty cache, i.e. a component with no couplings at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the block `d(of)/d(wrt)`.
    pub fn insert(&mut self, of: impl Into<String>, wrt: impl Into<String>, block: Mat<f64>) {
        self.blocks
            .entry(of.into())
            .or_default()
            .insert(wrt.into(), block);
    }

    /// The block `d(of)/d(wrt)`, if one was cached.
    pub fn get(&self, of: &str, wrt: &str) -> Option<&Mat<f64>> {
        self.blocks.get(of)?.get(wrt)
    }

    /// Forget the block `d(of)/d(wrt)`, returning it if it was there.
    pub fn remove(&mut self, of: &str, wrt: &str) -> Option<Mat<f64>> {
        self.blocks.get_mut(of)?.shift_remove(wrt)
    }

    /// Number of cached blocks.
    pub fn len(&self) -> usize {
        self.blocks.values().map(IndexMap::len).sum()
    }

    /// Are there any cached blocks?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
