use serde::{Deserialize, Serialize};

/// The `(id, state)` pair recovered from a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedKey {
    pub id: String,
    pub state: String,
}

impl ParsedKey {
    pub fn new(id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
        }
    }
}

/// Outcome of relocating every member of one set into another.
///
/// `moved` can be lower than `attempted` when another worker took a member
/// between enumeration and its move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub attempted: usize,
    pub moved: usize,
}

impl MoveReport {
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}
