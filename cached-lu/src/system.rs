use crate::{
    id::ComponentId,
    registry::{PartialCache, VariableRegistry},
};

/// Which linear system is being solved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `J x = b`, used by Newton updates and forward derivatives.
    #[default]
    Forward,
    /// `Jᵀ x = b`, used by adjoint derivatives.
    Transpose,
}

/// A linear operator owned by the coupling group, which the solver
/// turns into an explicit matrix and factors.
pub trait LinearSystem {
    /// Number of scalar unknowns, i.e. the operator is `size() x size()`.
    /// May change between linearizations.
    fn size(&self) -> usize;

    /// Matrix-free product. Writes `J input` into `out` in [`Mode::Forward`],
    /// or `Jᵀ input` in [`Mode::Transpose`].
    /// Both slices have length `size()`, and `out` arrives zeroed.
    fn apply(&self, input: &[f64], mode: Mode, out: &mut [f64]);

    /// Structural information the solver may assemble from instead of probing.
    /// Systems which only support matrix-vector products keep the default.
    fn block_structure(&self) -> Option<&dyn BlockStructure> {
        None
    }
}

/// Named variables and the partial-derivative blocks their owners cached
/// during linearization.
pub trait BlockStructure {
    /// Every variable in the flattened state vector.
    fn variables(&self) -> &VariableRegistry;

    /// The partial-derivative cache of one component.
    /// `None` means that component cached nothing.
    fn partials(&self, owner: ComponentId) -> Option<&PartialCache>;
}
