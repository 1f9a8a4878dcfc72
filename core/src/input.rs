use serde::{Deserialize, Serialize};

use crate::*;

/// Pointer gesture, already told apart by the input layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerAction {
    Click,
    DoubleClick,
    Drag,
    #[default]
    None,
}

/// A classified pointer event in playfield coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub action: PointerAction,
    pub position: Position,
}

impl Pointer {
    pub const fn new(action: PointerAction, x: f64, y: f64) -> Self {
        Self {
            action,
            position: Position::new(x, y),
        }
    }

    pub const fn click(x: f64, y: f64) -> Self {
        Self::new(PointerAction::Click, x, y)
    }

    pub const fn double_click(x: f64, y: f64) -> Self {
        Self::new(PointerAction::DoubleClick, x, y)
    }

    pub const fn is_press(&self) -> bool {
        matches!(self.action, PointerAction::Click | PointerAction::DoubleClick)
    }
}
