use core::ops::{Index, IndexMut};
use ndarray::{Array2, ArrayView1, Axis, concatenate, s};
use serde::{Deserialize, Serialize};

use crate::*;

/// Tile grid of the falling board, floor 0 on top.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    tiles: Array2<Tile>,
}

impl Board {
    pub fn from_tiles(tiles: Array2<Tile>) -> Self {
        Self { tiles }
    }

    pub fn empty() -> Self {
        Self {
            tiles: Array2::default((0, CELL_PER_FLOOR)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn floors(&self) -> usize {
        self.tiles.nrows()
    }

    pub fn contains(&self, (x, y): Coord2) -> bool {
        x < CELL_PER_FLOOR && y < self.floors()
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn floor(&self, y: usize) -> ArrayView1<'_, Tile> {
        self.tiles.row(y)
    }

    pub fn mine_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_mine()).count()
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.tiles.iter_neighbors(coords)
    }

    /// Puts every tile back to its generated state, keeping the allocation.
    pub fn reset(&mut self) {
        self.tiles.iter_mut().for_each(Tile::reset);
    }

    /// Replaces the top floor with `batch`, whose last floor is the merged copy of it.
    pub fn splice_top(&mut self, batch: Board) -> Result<()> {
        if self.is_empty() {
            self.tiles = batch.tiles;
            return Ok(());
        }
        let tiles = concatenate(
            Axis(0),
            &[batch.tiles.view(), self.tiles.slice(s![1.., ..])],
        )
        .map_err(|_| GameError::InvalidMineMap("floor width"))?;
        self.tiles = tiles;
        Ok(())
    }

    /// Drops `count` floors from the bottom of the board.
    pub fn drop_bottom(&mut self, count: usize) {
        let keep = self.floors().saturating_sub(count);
        let tiles = self.tiles.slice(s![..keep, ..]).to_owned();
        self.tiles = tiles;
    }

    /// Numeric view of the board: mines as [`MINE`], revealed empty tiles as
    /// [`SAFE`], revealed numbers as their count, hidden tiles as zero.
    pub fn to_mine_map(&self) -> Array2<i8> {
        self.tiles.mapv(|tile| {
            if tile.is_mine() {
                MINE
            } else if tile.is_revealed() {
                match tile.mine_near_by() {
                    0 => SAFE,
                    count => count as i8,
                }
            } else {
                0
            }
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.tiles[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.tiles[coords.to_nd_index()]
    }
}
