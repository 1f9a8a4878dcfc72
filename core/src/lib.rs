pub use board::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use generator::*;
pub use input::*;
pub use reveal::*;
pub use simulation::*;
pub use surface::*;
pub use tile::*;
pub use types::*;

mod board;
mod clock;
mod config;
mod error;
mod generator;
mod input;
mod reveal;
mod simulation;
mod surface;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Change to the remaining-mine counter.
    pub const fn mine_delta(self) -> isize {
        match self {
            Self::NoChange => 0,
            Self::Flagged => -1,
            Self::Unflagged => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChordOutcome {
    /// The tile is hidden, flagged, or shows no number.
    NotNumbered,
    /// Fewer marks than the number; nothing happened.
    Unsatisfied,
    /// More marks than the number; nothing happened.
    OverMarked,
    /// A wrong flag let the chord open mines, all candidates were revealed.
    ExposedMines(usize),
    /// The chord opened this many tiles.
    Revealed(usize),
}

impl ChordOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::ExposedMines(_) | Self::Revealed(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileOutcome {
    Ignored,
    Marked(MarkOutcome),
    Chorded(ChordOutcome),
    Revealed(usize),
    MineHit,
}

impl TileOutcome {
    pub const fn has_update(self) -> bool {
        use TileOutcome::*;
        match self {
            Ignored => false,
            Marked(outcome) => outcome.has_update(),
            Chorded(outcome) => outcome.has_update(),
            Revealed(_) => true,
            MineHit => true,
        }
    }
}

/// What a click on the control band did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UiAction {
    None,
    /// Soft reset, the frontend goes back to its menu.
    Back,
    Restarted,
    Started,
    Paused,
    Accelerated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    Accelerated,
    Started,
    Ui(UiAction),
    Tile(TileOutcome),
}
