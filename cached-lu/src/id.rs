/// The ID of a component in a coupled system.
/// Each registered variable is owned by exactly one component,
/// and only that component's partial-derivative cache is consulted for it.
pub type ComponentId = u32;

/// Hands out component IDs in order, starting from 0.
///
/// IDs name the components which own variables, not the variables themselves:
/// several variables share an ID when one component computes all of them.
/// Use one generator per coupled system so IDs stay unique within it.
#[derive(Default, Debug)]
pub struct IdGenerator {
    next: ComponentId,
}

impl IdGenerator {
    /// Claim the next unused component ID.
    pub fn next_id(&mut self) -> ComponentId {
        let id = self.next;
        self.next += 1;
        id
    }
}
