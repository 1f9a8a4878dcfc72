use serde::{Deserialize, Serialize};

/// Sentinel for a mine in a transmitted mine map.
pub const MINE_CELL: i8 = -1;

/// Sentinel for a pre-revealed safe cell in a transmitted mine map.
pub const SAFE_CELL: i8 = -2;

/// Seed data handed to every player of a multi-player match.
///
/// `mine_map` is row-major: the outer index is the floor (0 is the topmost
/// floor), the inner index is the column. Mines are encoded as
/// [`MINE_CELL`], pre-revealed cells as [`SAFE_CELL`], and every other cell
/// as a non-negative neighbor count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSeed {
    pub mine_map: Vec<Vec<i8>>,
    pub total_players: u32,
    pub rank: u32,
}

impl MatchSeed {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn floors(&self) -> usize {
        self.mine_map.len()
    }

    pub fn mine_count(&self) -> usize {
        self.mine_map
            .iter()
            .flatten()
            .filter(|&&cell| cell == MINE_CELL)
            .count()
    }
}
