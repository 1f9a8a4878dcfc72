use core::ops::{Index, IndexMut};
use ndarray::{Array2, aview1};
use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

// raw-map values of a mine and of a mine-free cell that starts revealed
pub use minetower_protocol::{MINE_CELL as MINE, SAFE_CELL as SAFE};

/// What a [`MineMapGenerator`] is asked to produce.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub floors: usize,
    pub total_mines: usize,
    pub max_mine_neighbors: u8,
    /// Keep the last floor mine-free and revealed.
    pub clean_last_floor: bool,
    /// How many trailing floors the pre-revealed opening may grow into.
    pub revealable_floors: usize,
    /// Floors visible at once, used to size the mine bands.
    pub floor_fit: usize,
    /// Mines of the floor this map will be stacked on, if any.
    pub seam_mines: Option<[bool; CELL_PER_FLOOR]>,
}

impl GenerationRequest {
    pub fn for_mode(settings: &ModeSettings, viewport: &Viewport) -> Self {
        Self {
            floors: settings.total_floors,
            total_mines: settings.total_mines,
            max_mine_neighbors: settings.max_mine_neighbors,
            clean_last_floor: true,
            revealable_floors: settings.revealable_floors,
            floor_fit: viewport.floor_fit(),
            seam_mines: None,
        }
    }
}

pub trait MineMapGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<MineMap>;
}

/// Intermediate numeric board: [`MINE`], [`SAFE`], or a non-negative count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineMap {
    cells: Array2<i8>,
}

impl MineMap {
    pub fn empty(floors: usize) -> Result<Self> {
        if floors == 0 {
            return Err(GameError::InvalidMineMap("no floors"));
        }
        Ok(Self {
            cells: Array2::zeros((floors, CELL_PER_FLOOR)),
        })
    }

    /// Builds a map from floor-major rows, as transmitted for multi-player.
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(GameError::InvalidMineMap("no floors"));
        }
        if rows.iter().any(|row| row.len() != CELL_PER_FLOOR) {
            return Err(GameError::InvalidMineMap("floor width"));
        }
        if rows.iter().flatten().any(|&cell| !(SAFE..=8).contains(&cell)) {
            return Err(GameError::InvalidMineMap("cell value"));
        }

        let flat: Vec<i8> = rows.iter().flatten().copied().collect();
        let cells = Array2::from_shape_vec((rows.len(), CELL_PER_FLOOR), flat)
            .map_err(|_| GameError::InvalidMineMap("floor width"))?;
        Ok(Self { cells })
    }

    pub fn floors(&self) -> usize {
        self.cells.nrows()
    }

    pub fn is_mine(&self, coords: Coord2) -> bool {
        self[coords] == MINE
    }

    pub fn mine_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == MINE).count()
    }

    pub fn neighbor_mines(&self, coords: Coord2) -> u8 {
        self.cells
            .iter_neighbors(coords)
            .filter(|&pos| self.is_mine(pos))
            .count() as u8
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    fn push_floor(&mut self, floor: &[i8; CELL_PER_FLOOR]) -> Result<()> {
        self.cells
            .push_row(aview1(floor))
            .map_err(|_| GameError::InvalidMineMap("floor width"))
    }
}

impl Index<Coord2> for MineMap {
    type Output = i8;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for MineMap {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.cells[coords.to_nd_index()]
    }
}

/// Turns a raw map into tiles with neighbor counts.
///
/// Out-of-bounds neighbors count as empty, mines always report zero.
pub fn materialize(map: &MineMap) -> Board {
    let tiles = Array2::from_shape_fn((map.floors(), CELL_PER_FLOOR), |(y, x)| {
        let coords = (x, y);
        Tile::new(
            map.is_mine(coords),
            map.neighbor_mines(coords),
            map[coords] == SAFE,
        )
    });
    Board::from_tiles(tiles)
}

/// Appends the retiring floor below a fresh map and materializes both.
///
/// The returned board ends with the seam floor: same mines, marks and
/// reveal state as `retiring`, with its neighbor count extended by the mines
/// of the new floor above it.
pub fn merge_floor(retiring: &[Tile], mut map: MineMap) -> Result<Board> {
    if retiring.len() != CELL_PER_FLOOR {
        return Err(GameError::InvalidMineMap("floor width"));
    }

    let mut seam = [0; CELL_PER_FLOOR];
    for (cell, tile) in seam.iter_mut().zip(retiring) {
        if tile.is_mine() {
            *cell = MINE;
        } else if tile.is_revealed() {
            *cell = SAFE;
        }
    }
    map.push_floor(&seam)?;

    let mut board = materialize(&map);
    let seam_row = board.floors() - 1;
    for (x, old) in retiring.iter().enumerate() {
        let above = (x.saturating_sub(1)..=(x + 1).min(CELL_PER_FLOOR - 1))
            .filter(|&column| map.is_mine((column, seam_row - 1)))
            .count() as u8;

        let mut tile = Tile::new(
            old.is_mine(),
            old.mine_near_by() + above,
            old.is_default_revealed(),
        );
        if old.is_revealed() {
            tile.reveal();
        }
        if old.is_flagged() {
            tile.flag();
        }
        board[(x, seam_row)] = tile;
    }

    Ok(board)
}
