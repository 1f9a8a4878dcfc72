use smallvec::SmallVec;

use crate::*;

/// Up to eight neighbors still waiting to be revealed.
pub type Frontier = SmallVec<[Coord2; 8]>;

impl Board {
    /// Reveals one tile and returns where a flood fill should continue.
    ///
    /// Numbered tiles stop the flood, so they return an empty frontier.
    pub fn reveal_tile(&mut self, coords: Coord2) -> Frontier {
        let tile = &mut self[coords];
        tile.reveal();

        if tile.mine_near_by() > 0 {
            return Frontier::new();
        }

        self.iter_neighbors(coords)
            .filter(|&pos| {
                let neighbor = self[pos];
                !neighbor.is_unrevealed_mine() && neighbor.is_revealable()
            })
            .collect()
    }

    /// Reveals `start` and drains the flood fill from it, returning how many
    /// tiles went from hidden to revealed.
    pub fn flood_reveal(&mut self, start: Coord2) -> usize {
        let mut revealed = usize::from(!self[start].is_revealed());
        let mut to_visit = self.reveal_tile(start).into_vec();

        while let Some(coords) = to_visit.pop() {
            if self[coords].is_revealed() {
                continue;
            }
            revealed += 1;
            let frontier = self.reveal_tile(coords);
            log::trace!("Flood opened {:?}, {} more to visit", coords, frontier.len());
            to_visit.extend(frontier);
        }

        revealed
    }

    /// Resolves a chord on a revealed numbered tile.
    ///
    /// Flagged neighbors and exposed mines both count toward the tile's
    /// number. Nothing changes unless they match it exactly.
    pub fn chord(&mut self, coords: Coord2) -> ChordOutcome {
        let tile = self[coords];
        if !tile.is_revealed() || tile.mine_near_by() == 0 {
            return ChordOutcome::NotNumbered;
        }

        let target = usize::from(tile.mine_near_by());
        let mut marked = 0;
        let mut candidates = Frontier::new();

        for pos in self.iter_neighbors(coords) {
            let neighbor = self[pos];
            if neighbor.is_revealed() && !neighbor.is_mine() {
                continue;
            }
            if neighbor.is_flagged() || neighbor.is_revealed() {
                marked += 1;
                if marked > target {
                    return ChordOutcome::OverMarked;
                }
                continue;
            }
            candidates.push(pos);
        }

        if marked != target {
            return ChordOutcome::Unsatisfied;
        }

        let mines = candidates.iter().filter(|&&pos| self[pos].is_mine()).count();
        if mines > 0 {
            for &pos in &candidates {
                self[pos].reveal();
            }
            return ChordOutcome::ExposedMines(mines);
        }

        let revealed = candidates
            .into_iter()
            .map(|pos| self.flood_reveal(pos))
            .sum();
        ChordOutcome::Revealed(revealed)
    }

    /// Toggles the flag of a hidden tile; revealed tiles are left alone.
    pub fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        let tile = &mut self[coords];
        if tile.is_revealed() {
            return MarkOutcome::NoChange;
        }

        tile.flag();
        if tile.is_flagged() {
            MarkOutcome::Flagged
        } else {
            MarkOutcome::Unflagged
        }
    }
}
