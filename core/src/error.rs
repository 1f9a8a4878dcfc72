use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Multi-player mode needs a mine map from the match seed")]
    MissingMineMap,
    #[error("Multi-player mode needs the player count and rank")]
    MissingPlayerInfo,
    #[error("Mine map is malformed: {0}")]
    InvalidMineMap(&'static str),
    #[error("Could only place {placed} of {requested} mines")]
    GenerationFailed { placed: usize, requested: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = core::result::Result<T, GameError>;
