use log::{debug, info, trace};
use minetower_protocol::MatchSeed;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// No board yet.
    #[default]
    Pending,
    Ready,
    Started,
    Win,
    GameOver,
    Paused,
    /// Reserved, no transition leads here.
    TimeStopped,
}

impl Status {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Win | Self::GameOver)
    }
}

/// Standing of this player in a multi-player match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub total_players: u32,
    pub rank: u32,
}

impl PlayerInfo {
    pub fn new(total_players: u32, rank: u32) -> Result<Self> {
        if total_players == 0 || rank == 0 {
            return Err(GameError::MissingPlayerInfo);
        }
        Ok(Self {
            total_players,
            rank,
        })
    }
}

/// Validated multi-player seed.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiplayerSeed {
    pub mine_map: MineMap,
    pub players: PlayerInfo,
}

impl TryFrom<MatchSeed> for MultiplayerSeed {
    type Error = GameError;

    fn try_from(seed: MatchSeed) -> Result<Self> {
        Ok(Self {
            mine_map: MineMap::from_rows(&seed.mine_map)?,
            players: PlayerInfo::new(seed.total_players, seed.rank)?,
        })
    }
}

/// Arguments of [`Simulation::reset`].
///
/// Unset modes keep the current ones. Without `regenerate` an existing board
/// is only reset in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResetRequest {
    pub regenerate: bool,
    pub mine_map: Option<MineMap>,
    pub game_mode: Option<GameMode>,
    pub player_mode: Option<PlayerMode>,
    pub players: Option<PlayerInfo>,
    pub start: bool,
}

impl ResetRequest {
    pub fn soft() -> Self {
        Self::default()
    }

    pub fn regenerate() -> Self {
        Self {
            regenerate: true,
            ..Self::default()
        }
    }

    pub fn multiplayer(seed: MultiplayerSeed) -> Self {
        Self::regenerate()
            .with_player_mode(PlayerMode::Multi)
            .with_mine_map(seed.mine_map)
            .with_players(seed.players)
    }

    pub fn with_mine_map(mut self, mine_map: MineMap) -> Self {
        self.mine_map = Some(mine_map);
        self
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = Some(game_mode);
        self
    }

    pub fn with_player_mode(mut self, player_mode: PlayerMode) -> Self {
        self.player_mode = Some(player_mode);
        self
    }

    pub fn with_players(mut self, players: PlayerInfo) -> Self {
        self.players = Some(players);
        self
    }

    pub fn and_start(mut self) -> Self {
        self.start = true;
        self
    }
}

/// The falling board: owns the tiles, the fall, and the run status.
///
/// Board row 0 is the top floor. Floors are numbered from the bottom, floor 1
/// being the first one to reach the boundary.
#[derive(Debug)]
pub struct Simulation<C: GameClock, G: MineMapGenerator = RandomMineMapGenerator> {
    config: SimulationConfig,
    clock: C,
    generator: G,

    status: Status,
    game_mode: GameMode,
    player_mode: PlayerMode,
    players: Option<PlayerInfo>,

    board: Board,
    tile_size: f64,
    height: f64,
    start_position: Position,
    position: Position,
    last_tile: Option<Coord2>,

    speed: f64,
    accelerating: bool,
    acceleration_until: f64,

    total_mines: usize,
    remaining_mines: isize,
    current_floor: usize,
    /// Floor that ended the run at the boundary.
    failed_floor: Option<usize>,
    /// Floors dropped off the bottom of a marathon board.
    trimmed_floors: usize,
    /// Floors generated during this run, marathon extensions included.
    generated_floors: usize,
}

impl<C: GameClock> Simulation<C> {
    pub fn seeded(config: SimulationConfig, clock: C, seed: u64) -> Self {
        Self::new(config, clock, RandomMineMapGenerator::new(seed))
    }
}

impl<C: GameClock, G: MineMapGenerator> Simulation<C, G> {
    pub fn new(config: SimulationConfig, clock: C, generator: G) -> Self {
        Self {
            status: Status::Pending,
            game_mode: config.game_mode,
            player_mode: config.player_mode,
            players: None,
            board: Board::empty(),
            tile_size: config.viewport.tile_size(),
            height: 0.0,
            start_position: Position::default(),
            position: Position::default(),
            last_tile: None,
            speed: 0.0,
            accelerating: false,
            acceleration_until: 0.0,
            total_mines: 0,
            remaining_mines: 0,
            current_floor: 0,
            failed_floor: None,
            trimmed_floors: 0,
            generated_floors: 0,
            config,
            clock,
            generator,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Takes effect on the next reset.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    pub fn player_mode(&self) -> PlayerMode {
        self.player_mode
    }

    pub fn players(&self) -> Option<PlayerInfo> {
        self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_accelerating(&self) -> bool {
        self.accelerating
    }

    pub fn last_tile(&self) -> Option<Coord2> {
        self.last_tile
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn remaining_mines(&self) -> isize {
        self.remaining_mines
    }

    pub fn current_floor(&self) -> usize {
        self.current_floor
    }

    fn mode_settings(&self) -> ModeSettings {
        *self.config.modes.get(self.game_mode)
    }

    /// Rebuilds or restores the board and puts the run back at its start.
    ///
    /// Fails before touching any state when a multi-player reset lacks its
    /// seed data, or when generation fails.
    pub fn reset(&mut self, request: ResetRequest) -> Result<()> {
        let game_mode = request.game_mode.unwrap_or(self.game_mode);
        let player_mode = request.player_mode.unwrap_or(self.player_mode);
        let regenerate = request.regenerate || self.board.is_empty();
        let multi = player_mode == PlayerMode::Multi;

        if multi && regenerate && request.mine_map.is_none() {
            return Err(GameError::MissingMineMap);
        }
        let players = match player_mode {
            PlayerMode::Single => None,
            PlayerMode::Multi => {
                let players = request
                    .players
                    .or(self.players)
                    .ok_or(GameError::MissingPlayerInfo)?;
                Some(PlayerInfo::new(players.total_players, players.rank)?)
            }
        };

        let fresh = if regenerate {
            let map = match request.mine_map {
                Some(map) => map,
                None => {
                    let settings = self.config.modes.get(game_mode);
                    let generation = GenerationRequest::for_mode(settings, &self.config.viewport);
                    self.generator.generate(&generation)?
                }
            };
            Some(materialize(&map))
        } else {
            None
        };

        match fresh {
            Some(board) => {
                self.board = board;
                self.trimmed_floors = 0;
                self.generated_floors = self.board.floors();
                trace!("New board layout: {:?}", self.board.to_mine_map());
            }
            None => self.board.reset(),
        }

        self.game_mode = game_mode;
        self.player_mode = player_mode;
        self.players = players;

        self.total_mines = self.board.mine_count();
        self.remaining_mines = self.total_mines as isize;
        self.current_floor = 0;
        self.failed_floor = None;
        self.last_tile = None;
        self.speed = 0.0;
        self.accelerating = false;
        self.acceleration_until = 0.0;

        let viewport = self.config.viewport;
        self.tile_size = viewport.tile_size();
        self.height = self.tile_size * self.board.floors() as f64;
        self.start_position = Position::new(0.0, -self.height + viewport.height / 3.0);
        self.position = self.start_position;

        debug!(
            "Reset {} {} board: {} floors, {} mines, regenerated: {}",
            self.game_mode,
            self.player_mode,
            self.board.floors(),
            self.total_mines,
            regenerate
        );
        self.set_status(Status::Ready);

        if request.start {
            self.start();
        }
        Ok(())
    }

    /// Starts a ready run or resumes a paused one.
    pub fn start(&mut self) -> bool {
        if !matches!(self.status, Status::Ready | Status::Paused) {
            return false;
        }
        self.speed = self.mode_settings().speed.for_progress(self.fall_progress());
        self.set_status(Status::Started);
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.status != Status::Started {
            return false;
        }
        self.set_status(Status::Paused);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.status {
            Status::Started => self.pause(),
            Status::Paused => self.start(),
            _ => false,
        }
    }

    fn set_status(&mut self, status: Status) {
        if self.status == status {
            return;
        }
        debug!("Status {:?} -> {:?}", self.status, status);
        self.status = status;
        match status {
            Status::Win => info!(
                "Won at floor {} in {:.1} ms",
                self.current_floor,
                self.clock.game_time()
            ),
            Status::GameOver => info!("Game over at floor {}", self.current_floor),
            _ => {}
        }
    }

    /// Share of the fall covered so far, from 0 at the starting position to 1
    /// once the top of the board reaches the top of the viewport.
    pub fn fall_progress(&self) -> f64 {
        let distance = -self.start_position.y;
        if distance <= 0.0 {
            return 1.0;
        }
        ((self.position.y - self.start_position.y) / distance).clamp(0.0, 1.0)
    }

    /// Grants an acceleration window measured in game time.
    ///
    /// Releasing does not cut a granted window short, it runs out on its own.
    pub fn set_accelerate(&mut self, accelerating: bool) {
        if !accelerating {
            return;
        }
        let now = self.clock.game_time();
        if self.acceleration_until - now <= 0.0 {
            self.acceleration_until = now + self.config.acceleration_duration;
        }
        self.accelerating = true;
    }

    fn is_falling(&self) -> bool {
        match self.player_mode {
            PlayerMode::Single => self.status == Status::Started,
            PlayerMode::Multi => {
                matches!(self.status, Status::Ready | Status::Started | Status::Paused)
            }
        }
    }

    /// Advances the fall by `elapsed` milliseconds and settles the floors
    /// that reached the boundary.
    pub fn update_pos(&mut self, elapsed: f64) -> Result<()> {
        if !self.is_falling() {
            return Ok(());
        }

        self.speed = self.mode_settings().speed.for_progress(self.fall_progress());
        if self.acceleration_until - self.clock.game_time() <= 0.0 {
            self.accelerating = false;
        }
        let speed = if self.accelerating {
            self.config.acceleration_speed
        } else {
            self.speed
        };
        self.position.y += speed * elapsed;

        let boundary = self.config.viewport.boundary();
        if self.remaining_mines == 0 || self.position.y > boundary {
            self.set_status(Status::Win);
            return Ok(());
        }
        if self.position.y + self.height <= boundary {
            return Ok(());
        }

        let row = self.boundary_row(boundary);
        let floor = self.floor_of_row(row);
        if floor <= self.current_floor {
            return Ok(());
        }
        let previous = self.current_floor;
        self.current_floor = floor;

        for crossed in previous + 1..=floor {
            let Some(row) = self.row_of_floor(crossed) else {
                continue;
            };
            if !self.is_floor_settled(row) {
                info!("Floor {} reached the boundary unresolved", crossed);
                self.failed_floor = Some(crossed);
                self.set_status(Status::GameOver);
                return Ok(());
            }
        }

        if !self.game_mode.is_marathon() {
            return Ok(());
        }
        let extended = self.extend_marathon(row);
        self.trim_trailing_floors();
        extended
    }

    /// Board row currently straddling the boundary.
    fn boundary_row(&self, boundary: f64) -> usize {
        let row = ((boundary - self.position.y) / self.tile_size).floor();
        let last = self.board.floors().saturating_sub(1);
        if row.is_finite() && row > 0.0 {
            (row as usize).min(last)
        } else {
            0
        }
    }

    fn floor_of_row(&self, row: usize) -> usize {
        self.trimmed_floors + self.board.floors() - row
    }

    fn row_of_floor(&self, floor: usize) -> Option<usize> {
        if floor <= self.trimmed_floors {
            return None;
        }
        (self.trimmed_floors + self.board.floors()).checked_sub(floor)
    }

    /// Whether a floor at the boundary may pass.
    ///
    /// Marks and opened mines already moved the counter, so passing leaves it
    /// alone.
    fn is_floor_settled(&self, row: usize) -> bool {
        self.board.floor(row).iter().all(Tile::is_settled)
    }

    /// Splices a fresh batch of floors on top while the boundary is still in
    /// the lower half of the mode's board.
    fn extend_marathon(&mut self, row: usize) -> Result<()> {
        let settings = self.mode_settings();
        if self.generated_floors >= self.config.marathon_floor_budget
            || row > settings.total_floors / 2
        {
            return Ok(());
        }

        let retiring = self.board.floor(0).to_vec();
        let request = GenerationRequest {
            clean_last_floor: false,
            revealable_floors: usize::from(retiring.iter().any(Tile::is_revealed)),
            seam_mines: Some(core::array::from_fn(|x| retiring[x].is_mine())),
            ..GenerationRequest::for_mode(&settings, &self.config.viewport)
        };
        let map = self.generator.generate(&request)?;
        let added_mines = map.mine_count();
        let batch = merge_floor(&retiring, map)?;
        let added_rows = batch.floors() - 1;

        self.board.splice_top(batch)?;
        self.total_mines += added_mines;
        self.remaining_mines += added_mines as isize;
        self.generated_floors += added_rows;

        let shift = added_rows as f64 * self.tile_size;
        self.height += shift;
        self.start_position.y = -self.height + self.config.viewport.height / 3.0;
        self.position.y -= shift;
        if let Some((x, y)) = self.last_tile {
            self.last_tile = Some((x, y + added_rows));
        }

        debug!(
            "Marathon extended by {} floors and {} mines, {} generated so far",
            added_rows, added_mines, self.generated_floors
        );
        Ok(())
    }

    /// Drops trailing floors that fell out of the viewport.
    fn trim_trailing_floors(&mut self) {
        let bottom = self.config.viewport.height;
        let below = (0..self.board.floors())
            .rev()
            .take_while(|&row| self.position.y + row as f64 * self.tile_size >= bottom)
            .count();
        if below == 0 {
            return;
        }

        self.board.drop_bottom(below);
        self.trimmed_floors += below;
        self.height -= below as f64 * self.tile_size;
        if matches!(self.last_tile, Some((_, y)) if y >= self.board.floors()) {
            self.last_tile = None;
        }
        trace!("Trimmed {} floors, {} so far", below, self.trimmed_floors);
    }

    fn push_down(&mut self) {
        self.position.y += self.tile_size;
    }

    pub fn is_on_ui(&self, y: f64) -> bool {
        let viewport = &self.config.viewport;
        viewport.is_on_status_band(y) || viewport.is_on_control_band(y)
    }

    /// Handles a press on the control band: back on the left, start or pause
    /// in the middle, acceleration on the right.
    pub fn click_on_ui(&mut self, pointer: Pointer) -> Result<UiAction> {
        let viewport = self.config.viewport;
        let Position { x, y } = pointer.position;
        if !viewport.is_on_control_band(y) {
            return Ok(UiAction::None);
        }

        if x < viewport.width / 3.0 {
            self.clock.reset_time();
            self.reset(ResetRequest::soft())?;
            return Ok(UiAction::Back);
        }

        if x < 2.0 * viewport.width / 3.0 {
            return Ok(match self.status {
                Status::Win | Status::GameOver => {
                    self.clock.reset_time();
                    self.reset(ResetRequest::regenerate().and_start())?;
                    UiAction::Restarted
                }
                Status::Ready | Status::Paused => {
                    self.start();
                    UiAction::Started
                }
                Status::Started => {
                    self.pause();
                    UiAction::Paused
                }
                Status::Pending | Status::TimeStopped => UiAction::None,
            });
        }

        if self.status != Status::Started {
            return Ok(UiAction::None);
        }
        self.set_accelerate(true);
        Ok(UiAction::Accelerated)
    }

    fn tile_at(&self, position: Position) -> Option<Coord2> {
        if self.tile_size <= 0.0 {
            return None;
        }
        let x = ((position.x - self.position.x) / self.tile_size).floor();
        let y = ((position.y - self.position.y) / self.tile_size).floor();
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        self.board.validate_coords((x as usize, y as usize)).ok()
    }

    /// Applies a press on the board.
    ///
    /// Revealed numbers chord with either press. Otherwise a click toggles a
    /// flag and a double click reveals; opening a mine costs one tile of fall.
    /// Floors at or past the boundary are out of play.
    pub fn click_on_tile(&mut self, pointer: Pointer) -> TileOutcome {
        if self.status != Status::Started
            || pointer.position.y >= self.config.viewport.boundary()
        {
            return TileOutcome::Ignored;
        }
        let Some(coords) = self.tile_at(pointer.position) else {
            return TileOutcome::Ignored;
        };
        if self.floor_of_row(coords.1) <= self.current_floor {
            return TileOutcome::Ignored;
        }
        self.last_tile = Some(coords);
        let tile = self.board[coords];

        if tile.is_revealed() && tile.mine_near_by() > 0 {
            let outcome = self.board.chord(coords);
            if let ChordOutcome::ExposedMines(mines) = outcome {
                debug!("Chord at {:?} exposed {} mines", coords, mines);
                self.remaining_mines -= mines as isize;
                self.push_down();
            }
            return TileOutcome::Chorded(outcome);
        }

        match pointer.action {
            PointerAction::Click => {
                let outcome = self.board.toggle_flag(coords);
                self.remaining_mines += outcome.mine_delta();
                TileOutcome::Marked(outcome)
            }
            PointerAction::DoubleClick if tile.is_revealable() => {
                if tile.is_mine() {
                    debug!("Opened a mine at {:?}", coords);
                    self.board[coords].reveal();
                    self.remaining_mines -= 1;
                    self.push_down();
                    TileOutcome::MineHit
                } else {
                    TileOutcome::Revealed(self.board.flood_reveal(coords))
                }
            }
            _ => TileOutcome::Ignored,
        }
    }

    /// Routes one classified pointer event for the current status.
    pub fn handle_pointer(&mut self, pointer: Pointer) -> Result<PointerOutcome> {
        if pointer.action == PointerAction::Drag && self.status == Status::Started {
            self.set_accelerate(true);
            return Ok(PointerOutcome::Accelerated);
        }
        if !pointer.is_press() || self.status == Status::Pending {
            return Ok(PointerOutcome::Ignored);
        }

        if self.is_on_ui(pointer.position.y) {
            return Ok(PointerOutcome::Ui(self.click_on_ui(pointer)?));
        }
        if self.status.is_finished() {
            return Ok(PointerOutcome::Ignored);
        }
        // a board press starts a ready run or resumes a paused one
        if self.start() {
            return Ok(PointerOutcome::Started);
        }
        Ok(PointerOutcome::Tile(self.click_on_tile(pointer)))
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        if self.status == Status::Pending {
            surface.loading();
            return;
        }

        if self.status != Status::Ready {
            let paint = if self.status == Status::Paused {
                Paint::BoardPaused
            } else {
                Paint::Board
            };
            surface.fill(paint, self.position, self.config.viewport.width, self.height);
            self.draw_tiles(surface);
        }
        self.draw_hud(surface);
    }

    fn draw_tiles<S: Surface + ?Sized>(&self, surface: &mut S) {
        let size = self.tile_size;
        let bottom = self.config.viewport.height;
        let paused = self.status == Status::Paused;
        let missed_row = self.failed_floor.and_then(|floor| self.row_of_floor(floor));

        for y in 0..self.board.floors() {
            let top = self.position.y + y as f64 * size;
            if top + size < 0.0 || top > bottom {
                continue;
            }

            for (x, tile) in self.board.floor(y).iter().enumerate() {
                let position = Position::new(self.position.x + x as f64 * size, top);
                if paused {
                    draw_hidden_tile(surface, position, size);
                } else {
                    let highlighted = self.last_tile == Some((x, y));
                    draw_tile(surface, tile, position, size, highlighted, missed_row == Some(y));
                }
            }

            let floor = self.floor_of_row(y);
            if !paused && floor % 10 == 0 {
                let label = Position::new(size / 2.0, top + size / 4.0);
                surface.text(&floor.to_string(), TextStyle::FloorLabel, Paint::FloorLabel, label);
            }
        }
    }

    fn draw_hud<S: Surface + ?Sized>(&self, surface: &mut S) {
        let viewport = self.config.viewport;
        let width = viewport.width;

        surface.fill(Paint::UiBand, Position::default(), width, viewport.status_band());
        surface.fill(
            Paint::UiBand,
            Position::new(0.0, viewport.boundary()),
            width,
            viewport.control_band(),
        );

        let mines = if self.game_mode.is_marathon() {
            "??".to_owned()
        } else {
            self.remaining_mines.to_string()
        };
        let top = width / 20.0;
        let status_line = [
            (format!("M:{}", self.game_mode), width / 6.0),
            (format!("B:{mines}"), width / 2.0),
            (format!("F:{}", self.current_floor), 5.0 * width / 8.0),
            (
                format!("T:{}", format_game_time(self.clock.game_time())),
                width - width / 8.0,
            ),
        ];
        for (text, x) in &status_line {
            surface.text(text, TextStyle::Hud, Paint::HudText, Position::new(*x, top));
        }

        let bottom = viewport.height - width / 20.0;
        let control = match self.status {
            Status::Ready | Status::Win | Status::GameOver => "> start",
            Status::Paused => "|> resume",
            _ => "|| pause",
        };
        surface.text("< Back", TextStyle::Hud, Paint::HudText, Position::new(width / 8.0, bottom));
        surface.text(control, TextStyle::Hud, Paint::HudText, Position::new(width / 2.0, bottom));
        if self.status == Status::Started {
            let accelerate = Position::new(width - width / 8.0, bottom);
            surface.text("V down", TextStyle::Hud, Paint::HudText, accelerate);
        }

        let banner = match self.status {
            Status::GameOver => Some(("GAME OVER", Paint::GameOverText)),
            Status::Win => Some(("WIN", Paint::WinText)),
            Status::Paused => Some(("PAUSED", Paint::PausedText)),
            _ => None,
        };
        if let Some((text, paint)) = banner {
            let center = Position::new(width / 2.0, viewport.height / 2.0);
            surface.text(text, TextStyle::Banner, paint, center);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::*;

    type TestSimulation = Simulation<SteppedClock>;

    // 90x200 viewport: 10px tiles, boundary at 188.75
    fn config(game_mode: GameMode) -> SimulationConfig {
        let speed = SpeedTiers::new(1.0, 1.0, 1.0);
        let mut config = SimulationConfig {
            viewport: Viewport::new(90.0, 200.0),
            game_mode,
            acceleration_speed: 4.0,
            ..SimulationConfig::default()
        };
        config.modes.normal.speed = speed;
        config.modes.marathon = ModeSettings {
            total_floors: 20,
            total_mines: 5,
            max_mine_neighbors: 0,
            revealable_floors: 3,
            speed,
        };
        config
    }

    fn simulation(game_mode: GameMode) -> TestSimulation {
        Simulation::seeded(config(game_mode), SteppedClock::new(), 1)
    }

    fn rows(rows: &[[i8; CELL_PER_FLOOR]]) -> Vec<Vec<i8>> {
        rows.iter().map(|row| row.to_vec()).collect()
    }

    fn tower_rows() -> Vec<Vec<i8>> {
        rows(&[
            [-1, 0, 0, 0, 0, 0, 0, 0, 0],
            [0; CELL_PER_FLOOR],
            [0, 0, 0, 0, 0, 0, 0, 0, -1],
            [-2; CELL_PER_FLOOR],
        ])
    }

    fn started_tower() -> TestSimulation {
        let mut sim = simulation(GameMode::Normal);
        let map = MineMap::from_rows(&tower_rows()).unwrap();
        sim.reset(ResetRequest::regenerate().with_mine_map(map).and_start())
            .unwrap();
        sim
    }

    fn press(sim: &mut TestSimulation, action: PointerAction, (x, y): Coord2) -> TileOutcome {
        let size = sim.tile_size();
        let position = sim.position();
        let pointer = Pointer::new(
            action,
            position.x + (x as f64 + 0.5) * size,
            position.y + (y as f64 + 0.5) * size,
        );
        sim.click_on_tile(pointer)
    }

    fn settle_everything<G: MineMapGenerator>(sim: &mut Simulation<SteppedClock, G>) {
        // marks set directly, the counter is left alone
        for y in 0..sim.board.floors() {
            for x in 0..CELL_PER_FLOOR {
                let tile = &mut sim.board[(x, y)];
                if tile.is_mine() {
                    if !tile.is_flagged() {
                        tile.flag();
                    }
                } else {
                    tile.reveal();
                }
            }
        }
    }

    /// Hands out the first board, then fails every later generation.
    struct FirstBoardOnly {
        inner: RandomMineMapGenerator,
        used: bool,
    }

    impl MineMapGenerator for FirstBoardOnly {
        fn generate(&mut self, request: &GenerationRequest) -> Result<MineMap> {
            if self.used {
                return Err(GameError::GenerationFailed {
                    placed: 0,
                    requested: request.total_mines,
                });
            }
            self.used = true;
            self.inner.generate(request)
        }
    }

    fn stuck_marathon() -> Simulation<SteppedClock, FirstBoardOnly> {
        let generator = FirstBoardOnly {
            inner: RandomMineMapGenerator::new(1),
            used: false,
        };
        let mut sim = Simulation::new(config(GameMode::Marathon), SteppedClock::new(), generator);
        sim.reset(ResetRequest::regenerate().and_start()).unwrap();
        sim
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn reset_places_board_above_the_boundary() {
        let sim = started_tower();

        assert_eq!(sim.status(), Status::Started);
        assert_eq!(sim.tile_size(), 10.0);
        assert_eq!(sim.height(), 40.0);
        assert_close(sim.position().y, -40.0 + 200.0 / 3.0);
        assert_eq!(sim.total_mines(), 2);
        assert_eq!(sim.remaining_mines(), 2);
        assert_eq!(sim.fall_progress(), 1.0);
    }

    #[test]
    fn soft_reset_restores_the_generated_board() {
        let mut sim = started_tower();
        let pristine = sim.board().clone();
        let start = sim.position();

        assert_eq!(
            press(&mut sim, PointerAction::Click, (8, 2)),
            TileOutcome::Marked(MarkOutcome::Flagged)
        );
        assert!(matches!(
            press(&mut sim, PointerAction::DoubleClick, (0, 2)),
            TileOutcome::Revealed(_)
        ));
        sim.update_pos(5.0).unwrap();
        assert_eq!(sim.remaining_mines(), 1);

        sim.reset(ResetRequest::soft()).unwrap();

        assert_eq!(sim.board(), &pristine);
        assert_eq!(sim.remaining_mines(), 2);
        assert_eq!(sim.position(), start);
        assert_eq!(sim.status(), Status::Ready);
        assert_eq!(sim.current_floor(), 0);
        assert_eq!(sim.last_tile(), None);
    }

    #[test]
    fn single_player_board_only_falls_while_started() {
        let mut sim = started_tower();
        sim.pause();
        let position = sim.position();

        sim.update_pos(50.0).unwrap();

        assert_eq!(sim.position(), position);
    }

    #[test]
    fn first_crossing_checks_the_opening() {
        let mut sim = started_tower();

        sim.update_pos(125.0).unwrap();

        assert_eq!(sim.current_floor(), 1);
        assert_eq!(sim.status(), Status::Started);
        assert_eq!(sim.remaining_mines(), 2);
    }

    #[test]
    fn resolved_floors_pass_the_boundary() {
        let mut sim = started_tower();
        press(&mut sim, PointerAction::Click, (8, 2));
        press(&mut sim, PointerAction::DoubleClick, (0, 2));

        sim.update_pos(133.0).unwrap();

        assert_eq!(sim.current_floor(), 2);
        assert_eq!(sim.status(), Status::Started);
        assert_eq!(sim.remaining_mines(), 1);

        sim.update_pos(10.0).unwrap();

        assert_eq!(sim.current_floor(), 3);
        assert_eq!(sim.status(), Status::Started);
    }

    #[test]
    fn unresolved_floor_ends_the_run() {
        let mut sim = started_tower();

        sim.update_pos(133.0).unwrap();

        assert_eq!(sim.status(), Status::GameOver);
        assert_eq!(sim.current_floor(), 2);

        let position = sim.position();
        sim.update_pos(10.0).unwrap();
        assert_eq!(sim.position(), position);
    }

    #[test]
    fn crossed_floors_are_out_of_play() {
        let mut sim = started_tower();
        press(&mut sim, PointerAction::Click, (8, 2));
        press(&mut sim, PointerAction::DoubleClick, (0, 2));
        sim.update_pos(133.0).unwrap();
        assert_eq!(sim.current_floor(), 2);

        assert_eq!(press(&mut sim, PointerAction::Click, (8, 2)), TileOutcome::Ignored);
        assert!(sim.board()[(8, 2)].is_flagged());
        assert_eq!(sim.remaining_mines(), 1);

        // floor 3 is still above the boundary
        assert_eq!(
            press(&mut sim, PointerAction::Click, (0, 1)),
            TileOutcome::Marked(MarkOutcome::Flagged)
        );
    }

    #[test]
    fn fast_tick_stops_at_the_first_unresolved_floor() {
        let mut sim = started_tower();

        // floors 1 to 3 cross in one tick, floor 2 is unresolved
        sim.update_pos(143.0).unwrap();

        assert_eq!(sim.status(), Status::GameOver);
        assert_eq!(sim.current_floor(), 3);
        assert_eq!(sim.failed_floor, Some(2));

        let mut surface = RecordingSurface::default();
        sim.draw(&mut surface);
        assert_eq!(surface.fills(Paint::TileMissed), 8);
    }

    #[test]
    fn wrong_flag_ends_the_run() {
        let mut sim = started_tower();
        press(&mut sim, PointerAction::Click, (3, 2));
        // the counter would hit zero and win first
        sim.board[(8, 2)].flag();
        press(&mut sim, PointerAction::DoubleClick, (0, 2));

        sim.update_pos(133.0).unwrap();

        assert_eq!(sim.status(), Status::GameOver);
    }

    #[test]
    fn flagging_every_mine_wins() {
        let mut sim = started_tower();
        press(&mut sim, PointerAction::Click, (0, 0));
        press(&mut sim, PointerAction::Click, (8, 2));
        assert_eq!(sim.remaining_mines(), 0);

        sim.update_pos(1.0).unwrap();

        assert_eq!(sim.status(), Status::Win);
    }

    #[test]
    fn board_passing_the_boundary_wins() {
        let mut sim = started_tower();
        settle_everything(&mut sim);

        for _ in 0..100 {
            if sim.status() != Status::Started {
                break;
            }
            sim.update_pos(10.0).unwrap();
        }

        assert_eq!(sim.status(), Status::Win);
        assert_eq!(sim.current_floor(), 4);
    }

    #[test]
    fn opening_a_mine_pushes_the_board_down() {
        let mut sim = started_tower();
        let before = sim.position().y;

        assert_eq!(
            press(&mut sim, PointerAction::DoubleClick, (0, 0)),
            TileOutcome::MineHit
        );

        assert_close(sim.position().y, before + 10.0);
        assert_eq!(sim.remaining_mines(), 1);
        assert!(sim.board()[(0, 0)].is_revealed());
        assert_eq!(sim.status(), Status::Started);
    }

    #[test]
    fn chord_on_a_wrong_flag_pushes_the_board_down() {
        let mut sim = started_tower();
        assert_eq!(
            press(&mut sim, PointerAction::DoubleClick, (1, 1)),
            TileOutcome::Revealed(1)
        );
        press(&mut sim, PointerAction::Click, (2, 0));
        let before = sim.position().y;

        let outcome = press(&mut sim, PointerAction::Click, (1, 1));

        assert_eq!(outcome, TileOutcome::Chorded(ChordOutcome::ExposedMines(1)));
        assert_close(sim.position().y, before + 10.0);
        assert_eq!(sim.remaining_mines(), 0);
        assert!(sim.board()[(0, 0)].is_revealed());
        assert_eq!(sim.last_tile(), Some((1, 1)));
    }

    #[test]
    fn acceleration_runs_out_in_game_time() {
        let mut sim = started_tower();
        let start = sim.position().y;

        sim.set_accelerate(true);
        sim.update_pos(5.0).unwrap();
        assert_close(sim.position().y, start + 20.0);

        sim.clock_mut().advance(100.0);
        sim.set_accelerate(false);
        sim.update_pos(5.0).unwrap();
        assert_close(sim.position().y, start + 40.0);
        assert!(sim.is_accelerating());

        sim.clock_mut().advance(100.0);
        sim.update_pos(5.0).unwrap();
        assert_close(sim.position().y, start + 45.0);
        assert!(!sim.is_accelerating());
    }

    #[test]
    fn speed_follows_fall_progress() {
        let mut config = config(GameMode::Normal);
        config.modes.normal.speed = SpeedTiers::new(0.5, 1.0, 2.0);
        let mut sim = Simulation::seeded(config, SteppedClock::new(), 1);
        let mut tall = vec![vec![SAFE; CELL_PER_FLOOR]; 31];
        tall[0][0] = MINE;
        let map = MineMap::from_rows(&tall).unwrap();
        sim.reset(ResetRequest::regenerate().with_mine_map(map).and_start())
            .unwrap();
        settle_everything(&mut sim);
        let start = sim.position().y;

        assert_eq!(sim.fall_progress(), 0.0);
        assert_eq!(sim.speed(), 0.5);

        sim.update_pos(300.0).unwrap();
        assert_close(sim.position().y, start + 150.0);

        sim.update_pos(10.0).unwrap();
        assert_eq!(sim.speed(), 1.0);
        assert_close(sim.position().y, start + 160.0);

        sim.update_pos(50.0).unwrap();
        sim.update_pos(1.0).unwrap();
        assert_eq!(sim.speed(), 2.0);
        assert_eq!(sim.status(), Status::Started);
    }

    #[test]
    fn multi_player_reset_requires_seed_data() {
        let mut sim = simulation(GameMode::Normal);
        let map = MineMap::from_rows(&tower_rows()).unwrap();

        let err = sim
            .reset(ResetRequest::regenerate().with_player_mode(PlayerMode::Multi))
            .unwrap_err();
        assert_eq!(err, GameError::MissingMineMap);

        let err = sim
            .reset(
                ResetRequest::regenerate()
                    .with_player_mode(PlayerMode::Multi)
                    .with_mine_map(map),
            )
            .unwrap_err();
        assert_eq!(err, GameError::MissingPlayerInfo);

        assert_eq!(sim.status(), Status::Pending);
        assert!(sim.board().is_empty());
        assert_eq!(sim.player_mode(), PlayerMode::Single);
    }

    #[test]
    fn multi_player_board_falls_before_the_start() {
        let mut sim = simulation(GameMode::Normal);
        let seed = MultiplayerSeed::try_from(MatchSeed {
            mine_map: tower_rows(),
            total_players: 4,
            rank: 2,
        })
        .unwrap();

        sim.reset(ResetRequest::multiplayer(seed)).unwrap();
        let start = sim.position().y;
        sim.update_pos(3.0).unwrap();

        assert_eq!(sim.status(), Status::Ready);
        assert_eq!(sim.player_mode(), PlayerMode::Multi);
        assert_eq!(
            sim.players(),
            Some(PlayerInfo {
                total_players: 4,
                rank: 2
            })
        );
        assert_close(sim.position().y, start + 3.0);

        // soft resets keep the match standing
        sim.reset(ResetRequest::soft()).unwrap();
        assert_eq!(sim.players().map(|players| players.rank), Some(2));
    }

    #[test]
    fn match_seed_is_validated() {
        let bad_map = MatchSeed {
            mine_map: vec![vec![0; 3]],
            total_players: 2,
            rank: 1,
        };
        let no_rank = MatchSeed {
            mine_map: tower_rows(),
            total_players: 2,
            rank: 0,
        };

        assert_eq!(
            MultiplayerSeed::try_from(bad_map),
            Err(GameError::InvalidMineMap("floor width"))
        );
        assert_eq!(
            MultiplayerSeed::try_from(no_rank),
            Err(GameError::MissingPlayerInfo)
        );
    }

    #[test]
    fn control_band_zones() {
        let mut sim = started_tower();
        let band = 195.0;

        assert_eq!(sim.click_on_ui(Pointer::click(45.0, 5.0)).unwrap(), UiAction::None);
        assert_eq!(sim.click_on_ui(Pointer::click(45.0, band)).unwrap(), UiAction::Paused);
        assert_eq!(sim.click_on_ui(Pointer::click(80.0, band)).unwrap(), UiAction::None);
        assert_eq!(sim.click_on_ui(Pointer::click(45.0, band)).unwrap(), UiAction::Started);
        assert_eq!(
            sim.click_on_ui(Pointer::click(80.0, band)).unwrap(),
            UiAction::Accelerated
        );
        assert!(sim.is_accelerating());

        sim.clock_mut().advance(1_000.0);
        assert_eq!(sim.click_on_ui(Pointer::click(10.0, band)).unwrap(), UiAction::Back);
        assert_eq!(sim.status(), Status::Ready);
        assert_eq!(sim.clock().game_time(), 0.0);
        assert!(!sim.is_accelerating());
    }

    #[test]
    fn restart_after_game_over_regenerates() {
        let mut sim = started_tower();
        sim.update_pos(133.0).unwrap();
        assert_eq!(sim.status(), Status::GameOver);

        let action = sim.click_on_ui(Pointer::click(45.0, 195.0)).unwrap();

        assert_eq!(action, UiAction::Restarted);
        assert_eq!(sim.status(), Status::Started);
        assert_eq!(sim.current_floor(), 0);
        assert_eq!(sim.board().floors(), 150);
        assert_eq!(sim.total_mines(), 100);
    }

    #[test]
    fn pointer_routing_follows_status() {
        let mut sim = simulation(GameMode::Normal);
        let map = MineMap::from_rows(&tower_rows()).unwrap();
        assert_eq!(
            sim.handle_pointer(Pointer::click(45.0, 100.0)).unwrap(),
            PointerOutcome::Ignored
        );
        sim.reset(ResetRequest::regenerate().with_mine_map(map)).unwrap();

        let drag = Pointer::new(PointerAction::Drag, 45.0, 100.0);
        assert_eq!(sim.handle_pointer(drag).unwrap(), PointerOutcome::Ignored);
        assert_eq!(
            sim.handle_pointer(Pointer::click(45.0, 100.0)).unwrap(),
            PointerOutcome::Started
        );
        assert_eq!(sim.handle_pointer(drag).unwrap(), PointerOutcome::Accelerated);

        // revealed opening tile, a click has nothing to flag
        let y = sim.position().y + 35.0;
        assert_eq!(
            sim.handle_pointer(Pointer::click(45.0, y)).unwrap(),
            PointerOutcome::Tile(TileOutcome::Marked(MarkOutcome::NoChange))
        );
        assert_eq!(
            sim.handle_pointer(Pointer::click(45.0, 195.0)).unwrap(),
            PointerOutcome::Ui(UiAction::Paused)
        );

        assert!(sim.toggle_pause());
        assert_eq!(sim.status(), Status::Started);
        assert!(!sim.start());
    }

    #[test]
    fn finished_run_only_answers_the_control_band() {
        let mut sim = started_tower();
        sim.update_pos(133.0).unwrap();
        assert!(sim.status().is_finished());

        assert_eq!(
            sim.handle_pointer(Pointer::double_click(45.0, 100.0)).unwrap(),
            PointerOutcome::Ignored
        );
        assert_eq!(
            sim.handle_pointer(Pointer::click(45.0, 195.0)).unwrap(),
            PointerOutcome::Ui(UiAction::Restarted)
        );
        assert_eq!(sim.status(), Status::Started);
    }

    #[test]
    fn marathon_extension_keeps_the_fall_continuous() {
        let mut sim = simulation(GameMode::Marathon);
        sim.reset(ResetRequest::regenerate().and_start()).unwrap();
        settle_everything(&mut sim);
        let old_top = sim.board().floor(0).to_vec();
        let start = sim.position().y;
        assert_eq!(sim.board().floors(), 20);
        assert_eq!(sim.total_mines(), 5);

        // boundary reaches row 10, the middle of the board
        sim.update_pos(213.0).unwrap();

        assert_eq!(sim.status(), Status::Started);
        assert_eq!(sim.current_floor(), 10);
        assert_eq!(sim.total_mines(), 10);
        assert_eq!(sim.remaining_mines(), 10);
        assert_close(sim.position().y, start + 213.0 - 200.0);
        assert_eq!(sim.generated_floors, 40);

        // 40 floors spliced, then the 7 below the viewport trimmed
        assert_eq!(sim.board().floors(), 33);
        assert_eq!(sim.trimmed_floors, 7);
        assert_close(sim.height(), 330.0);
        assert_eq!(sim.row_of_floor(10), Some(30));
        assert_eq!(sim.boundary_row(sim.config().viewport.boundary()), 30);

        for (x, old) in old_top.iter().enumerate() {
            let seam = sim.board()[(x, 20)];
            assert_eq!(seam.is_mine(), old.is_mine());
            assert_eq!(seam.is_flagged(), old.is_flagged());
            assert_eq!(seam.is_revealed(), old.is_revealed());
        }

        sim.update_pos(10.0).unwrap();
        assert_eq!(sim.current_floor(), 11);
        assert_eq!(sim.status(), Status::Started);
    }

    #[test]
    fn failed_extension_still_checks_crossed_floors() {
        let mut sim = stuck_marathon();

        sim.update_pos(213.0).unwrap();

        assert_eq!(sim.status(), Status::GameOver);
        assert_eq!(sim.total_mines(), 5);

        let position = sim.position();
        sim.update_pos(10.0).unwrap();
        assert_eq!(sim.position(), position);
    }

    #[test]
    fn failed_extension_is_reported_after_the_crossing() {
        let mut sim = stuck_marathon();
        settle_everything(&mut sim);

        let err = sim.update_pos(213.0).unwrap_err();

        assert_eq!(
            err,
            GameError::GenerationFailed {
                placed: 0,
                requested: 5
            }
        );
        assert_eq!(sim.status(), Status::Started);
        assert_eq!(sim.current_floor(), 10);
        assert_eq!(sim.total_mines(), 5);
        assert_eq!(sim.trimmed_floors, 7);

        assert!(sim.update_pos(10.0).is_err());
        assert_eq!(sim.current_floor(), 11);
        assert_eq!(sim.status(), Status::Started);
    }

    #[test]
    fn marathon_budget_stops_extension() {
        let mut config = config(GameMode::Marathon);
        config.marathon_floor_budget = 20;
        let mut sim = Simulation::seeded(config, SteppedClock::new(), 1);
        sim.reset(ResetRequest::regenerate().and_start()).unwrap();
        settle_everything(&mut sim);

        sim.update_pos(213.0).unwrap();

        assert_eq!(sim.current_floor(), 10);
        assert_eq!(sim.generated_floors, 20);
        assert_eq!(sim.total_mines(), 5);
        assert_eq!(sim.trimmed_floors, 7);
        assert_eq!(sim.row_of_floor(10), Some(10));
    }

    #[test]
    fn pending_draw_shows_loading() {
        let sim = simulation(GameMode::Normal);
        let mut surface = RecordingSurface::default();

        sim.draw(&mut surface);

        assert_eq!(surface.ops, vec![DrawOp::Loading]);
    }

    #[test]
    fn hud_follows_the_run() {
        let mut sim = started_tower();
        let mut surface = RecordingSurface::default();

        sim.draw(&mut surface);
        let texts = surface.texts();
        for text in ["M:NORMAL", "B:2", "F:0", "T:0.0 s", "< Back", "|| pause", "V down"] {
            assert!(texts.contains(&text), "missing {text}");
        }
        assert_eq!(surface.fills(Paint::Board), 1);

        sim.pause();
        let mut surface = RecordingSurface::default();
        sim.draw(&mut surface);
        let texts = surface.texts();
        assert!(texts.contains(&"PAUSED"));
        assert!(texts.contains(&"|> resume"));
        assert!(!texts.contains(&"V down"));
        assert_eq!(surface.fills(Paint::TileHidden), 36);
        assert_eq!(surface.fills(Paint::TileRevealed), 0);
    }

    #[test]
    fn game_over_tints_the_missed_floor() {
        let mut sim = started_tower();
        sim.update_pos(133.0).unwrap();
        let mut surface = RecordingSurface::default();

        sim.draw(&mut surface);

        let texts = surface.texts();
        assert!(texts.contains(&"GAME OVER"));
        assert!(texts.contains(&"> start"));
        assert_eq!(surface.fills(Paint::TileMissed), 8);
    }

    #[test]
    fn marathon_hides_the_mine_count() {
        let mut sim = simulation(GameMode::Marathon);
        sim.reset(ResetRequest::regenerate()).unwrap();
        let mut surface = RecordingSurface::default();

        sim.draw(&mut surface);

        let texts = surface.texts();
        assert!(texts.contains(&"B:??"));
        assert!(texts.contains(&"> start"));
        assert_eq!(surface.fills(Paint::Board), 0);
    }
}
