use serde::{Deserialize, Serialize};

/// A single cell of the falling board.
///
/// `mine_near_by` is the number of mines among the eight neighbors and is
/// always zero for a mine. A flagged tile is never revealed directly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    is_mine: bool,
    is_flagged: bool,
    is_revealed: bool,
    default_revealed: bool,
    mine_near_by: u8,
}

impl Tile {
    pub const fn new(is_mine: bool, mine_near_by: u8, revealed: bool) -> Self {
        Self {
            is_mine,
            is_flagged: false,
            is_revealed: revealed,
            default_revealed: revealed,
            mine_near_by: if is_mine { 0 } else { mine_near_by },
        }
    }

    /// Restores the state the tile had right after generation.
    pub fn reset(&mut self) {
        self.is_flagged = false;
        self.is_revealed = self.default_revealed;
    }

    pub fn update_mine_near_by(&mut self, mine_near_by: u8) {
        self.mine_near_by = mine_near_by;
    }

    pub fn reveal(&mut self) {
        self.is_revealed = true;
    }

    pub fn flag(&mut self) {
        self.is_flagged = !self.is_flagged;
    }

    pub const fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub const fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    pub const fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    pub const fn is_default_revealed(&self) -> bool {
        self.default_revealed
    }

    pub const fn mine_near_by(&self) -> u8 {
        self.mine_near_by
    }

    pub const fn is_unrevealed_mine(&self) -> bool {
        self.is_mine && !self.is_revealed
    }

    /// Hidden tiles and revealed numbered tiles can still be acted on.
    pub const fn is_revealable(&self) -> bool {
        !self.is_flagged && (!self.is_revealed || self.mine_near_by > 0)
    }

    /// Whether the tile is fine to let through the boundary.
    pub const fn is_settled(&self) -> bool {
        if self.is_mine {
            self.is_flagged || self.is_revealed
        } else {
            self.is_revealed && !self.is_flagged
        }
    }
}
