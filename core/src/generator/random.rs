use core::ops::Range;
use ndarray::Array2;
use rand::prelude::*;

use super::*;

/// Placement attempts allowed per band cell before the neighbor limit is relaxed.
const ATTEMPTS_PER_CELL: usize = 64;

/// Most mines a cell can have around it.
const MAX_NEIGHBORS: u8 = 8;

/// Generation strategy that spreads mines in bands of roughly one screen, keeping mine clusters under the mode's
/// neighbor limit, and opens a safe revealed area at the bottom of the board.
#[derive(Clone, Debug)]
pub struct RandomMineMapGenerator {
    rng: SmallRng,
}

impl RandomMineMapGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Next band end, between two thirds of a screen and a full screen past `start`.
    fn band_end(&mut self, start: usize, floor_fit: f64) -> usize {
        let height = 2.0 * floor_fit / 3.0 + self.rng.random_range(0.0..1.0) * floor_fit / 3.0;
        start + (height.floor() as usize).max(1)
    }

    fn place_band(
        &mut self,
        map: &mut MineMap,
        rows: Range<usize>,
        quota: usize,
        max_mine_neighbors: u8,
    ) -> Result<()> {
        let budget = rows.len() * CELL_PER_FLOOR * ATTEMPTS_PER_CELL;
        let mut limit = max_mine_neighbors;
        let mut placed = 0;

        loop {
            let mut attempts = 0;
            while placed < quota && attempts < budget {
                attempts += 1;
                let coords = (
                    self.rng.random_range(0..CELL_PER_FLOOR),
                    self.rng.random_range(rows.clone()),
                );
                if map.is_mine(coords) || !accepts_mine(map, coords, limit) {
                    continue;
                }
                map[coords] = MINE;
                placed += 1;
            }

            if placed == quota {
                return Ok(());
            }
            if limit >= MAX_NEIGHBORS {
                return Err(GameError::GenerationFailed {
                    placed,
                    requested: quota,
                });
            }
            limit += 1;
            log::warn!(
                "Band {:?} stuck at {}/{} mines, relaxing neighbor limit to {}",
                rows,
                placed,
                quota,
                limit
            );
        }
    }
}

impl MineMapGenerator for RandomMineMapGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<MineMap> {
        let mut map = MineMap::empty(request.floors)?;

        // a clean last floor also keeps the floor above it mine-free, so the
        // opening never borders a hidden mine
        let mine_rows = if request.clean_last_floor {
            request.floors.saturating_sub(2)
        } else {
            request.floors
        };
        if request.total_mines > mine_rows * CELL_PER_FLOOR {
            return Err(GameError::GenerationFailed {
                placed: 0,
                requested: request.total_mines,
            });
        }

        let floor_fit = request.floor_fit.max(1) as f64;
        let mut remaining = request.total_mines;
        let mut start = 0;

        while start < mine_rows {
            let mut end = self.band_end(start, floor_fit);
            if end >= mine_rows || ((mine_rows - end) as f64) < floor_fit / 2.0 {
                end = mine_rows;
            }

            let quota = if end == mine_rows {
                remaining
            } else {
                let share = request.total_mines as f64 * (end - start) as f64 / mine_rows as f64;
                (share.round() as usize).min(remaining)
            };

            log::trace!("Mine band {}..{} gets {} mines", start, end, quota);
            self.place_band(&mut map, start..end, quota, request.max_mine_neighbors)?;
            remaining -= quota;
            start = end;
        }

        carve_opening(&mut map, request);

        // double check mine count
        let count = map.mine_count();
        if count != request.total_mines {
            log::warn!(
                "Generated mine map count mismatch, actual: {}, requested: {}",
                count,
                request.total_mines
            );
        }
        Ok(map)
    }
}

/// Whether a mine at `coords` keeps it and every mine around it within `limit` mine neighbors.
fn accepts_mine(map: &MineMap, coords: Coord2, limit: u8) -> bool {
    if map.neighbor_mines(coords) > limit {
        return false;
    }
    map.iter_neighbors(coords)
        .filter(|&pos| map.is_mine(pos))
        .all(|pos| map.neighbor_mines(pos) < limit)
}

/// Whether a last-floor cell at column `x` touches a mine of the floor below.
fn borders_seam_mine(request: &GenerationRequest, x: usize) -> bool {
    request.seam_mines.is_some_and(|seam| {
        seam[x.saturating_sub(1)..=(x + 1).min(CELL_PER_FLOOR - 1)]
            .iter()
            .any(|&mine| mine)
    })
}

/// Grows the pre-revealed opening from the last floor.
///
/// A cell joins only when none of its neighbors is a mine, seam mines below
/// the last floor included, and growth stays within the last
/// `revealable_floors` floors.
fn carve_opening(map: &mut MineMap, request: &GenerationRequest) {
    let last = map.floors() - 1;

    if request.clean_last_floor {
        for x in 0..CELL_PER_FLOOR {
            map[(x, last)] = SAFE;
        }
    }

    if request.revealable_floors == 0 {
        return;
    }

    let zone_start = map.floors().saturating_sub(request.revealable_floors);
    let mut visited: Array2<bool> = Array2::default((map.floors(), CELL_PER_FLOOR));
    let mut to_visit: Vec<Coord2> = (0..CELL_PER_FLOOR).map(|x| (x, last)).collect();

    while let Some(coords) = to_visit.pop() {
        if visited[coords.to_nd_index()] {
            continue;
        }
        visited[coords.to_nd_index()] = true;

        let (x, y) = coords;
        if map.is_mine(coords)
            || map.neighbor_mines(coords) > 0
            || (y == last && borders_seam_mine(request, x))
        {
            continue;
        }
        map[coords] = SAFE;

        to_visit.extend(
            map.iter_neighbors(coords)
                .filter(|&(_, y)| y >= zone_start)
                .filter(|pos| !visited[pos.to_nd_index()]),
        );
    }
}
