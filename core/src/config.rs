use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Normal,
    Hard,
    Fast,
    Marathon,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [Self::Normal, Self::Hard, Self::Fast, Self::Marathon];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Hard => "HARD",
            Self::Fast => "FAST",
            Self::Marathon => "MARATHON",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&mode| mode == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let index = Self::ALL.iter().position(|&mode| mode == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub const fn is_marathon(self) -> bool {
        matches!(self, Self::Marathon)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerMode {
    #[default]
    Single,
    Multi,
}

impl PlayerMode {
    pub const ALL: [PlayerMode; 2] = [Self::Single, Self::Multi];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Multi => "MULTI",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Single => Self::Multi,
            Self::Multi => Self::Single,
        }
    }
}

impl fmt::Display for PlayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fall speeds in board pixels per millisecond.
///
/// `base` applies until half of the fall distance is covered, `mid` until
/// three quarters, `late` for the rest.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedTiers {
    pub base: f64,
    pub mid: f64,
    pub late: f64,
}

impl SpeedTiers {
    pub const fn new(base: f64, mid: f64, late: f64) -> Self {
        Self { base, mid, late }
    }

    pub fn for_progress(&self, progress: f64) -> f64 {
        if progress > 0.75 {
            self.late
        } else if progress > 0.5 {
            self.mid
        } else {
            self.base
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    pub total_floors: usize,
    pub total_mines: usize,
    pub max_mine_neighbors: u8,
    pub revealable_floors: usize,
    pub speed: SpeedTiers,
}

impl ModeSettings {
    pub const fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Normal => Self {
                total_floors: 150,
                total_mines: 100,
                max_mine_neighbors: 0,
                revealable_floors: 5,
                speed: SpeedTiers::new(0.015, 0.015, 0.02),
            },
            GameMode::Hard => Self {
                total_floors: 400,
                total_mines: 600,
                max_mine_neighbors: 5,
                revealable_floors: 3,
                speed: SpeedTiers::new(0.015, 0.02, 0.035),
            },
            GameMode::Fast => Self {
                total_floors: 150,
                total_mines: 100,
                max_mine_neighbors: 3,
                revealable_floors: 2,
                speed: SpeedTiers::new(0.02, 0.03, 0.05),
            },
            GameMode::Marathon => Self {
                total_floors: 100,
                total_mines: 50,
                max_mine_neighbors: 0,
                revealable_floors: 3,
                speed: SpeedTiers::new(0.02, 0.02, 0.02),
            },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTable {
    pub normal: ModeSettings,
    pub hard: ModeSettings,
    pub fast: ModeSettings,
    pub marathon: ModeSettings,
}

impl ModeTable {
    pub const fn get(&self, mode: GameMode) -> &ModeSettings {
        match mode {
            GameMode::Normal => &self.normal,
            GameMode::Hard => &self.hard,
            GameMode::Fast => &self.fast,
            GameMode::Marathon => &self.marathon,
        }
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            normal: ModeSettings::for_mode(GameMode::Normal),
            hard: ModeSettings::for_mode(GameMode::Hard),
            fast: ModeSettings::for_mode(GameMode::Fast),
            marathon: ModeSettings::for_mode(GameMode::Marathon),
        }
    }
}

/// Playfield size in pixels, plus the layout derived from it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn tile_size(&self) -> f64 {
        self.width / CELL_PER_FLOOR as f64
    }

    /// Height of the bottom control band.
    pub fn control_band(&self) -> f64 {
        self.width / 8.0
    }

    /// Height of the top status band.
    pub fn status_band(&self) -> f64 {
        self.width / 10.0
    }

    /// The line floors are checked against as they fall.
    pub fn boundary(&self) -> f64 {
        self.height - self.control_band()
    }

    /// How many whole floors fit between the top and the boundary.
    pub fn floor_fit(&self) -> usize {
        let fit = (self.boundary() / self.tile_size()).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }

    pub fn is_on_status_band(&self, y: f64) -> bool {
        y >= 0.0 && y < self.status_band()
    }

    pub fn is_on_control_band(&self, y: f64) -> bool {
        y > self.boundary() && y < self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(360.0, 640.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub viewport: Viewport,
    pub game_mode: GameMode,
    pub player_mode: PlayerMode,
    pub modes: ModeTable,
    /// Fall speed while accelerating, pixels per millisecond.
    pub acceleration_speed: f64,
    /// Game time granted per acceleration request, in milliseconds.
    pub acceleration_duration: f64,
    /// Upper bound of floors a marathon run may ever generate.
    pub marathon_floor_budget: usize,
}

impl SimulationConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| GameError::InvalidConfig(err.to_string()))
    }

    pub fn mode_settings(&self) -> &ModeSettings {
        self.modes.get(self.game_mode)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            game_mode: GameMode::default(),
            player_mode: PlayerMode::default(),
            modes: ModeTable::default(),
            acceleration_speed: 0.5,
            acceleration_duration: 150.0,
            marathon_floor_budget: 1500,
        }
    }
}
