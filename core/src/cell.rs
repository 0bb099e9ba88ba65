use serde::{Deserialize, Serialize};

/// Player-visible state of a single board position.
///
/// `neighbor_mines` is only meaningful for non-mine cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub neighbor_mines: u8,
}

impl Cell {
    /// Whether a reveal would be accepted for this cell.
    pub const fn can_reveal(self) -> bool {
        !self.is_revealed && !self.is_flagged
    }

    /// Whether a flag toggle would be accepted for this cell.
    pub const fn can_flag(self) -> bool {
        !self.is_revealed
    }
}
