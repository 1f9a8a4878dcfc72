use crate::*;

/// Semantic colors; the frontend maps them to its theme.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Paint {
    Board,
    BoardPaused,
    UiBand,
    TileBackground,
    TileRevealed,
    TileMine,
    /// Safe tile left hidden on the floor that ended the run.
    TileMissed,
    TileHighlight,
    TileHidden,
    Border,
    BorderHidden,
    Count(u8),
    Flag,
    MineText,
    HiddenText,
    FloorLabel,
    HudText,
    GameOverText,
    WinText,
    PausedText,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Tile,
    FloorLabel,
    Hud,
    Banner,
}

/// Drawing capability handed to [`Simulation::draw`].
///
/// Text is anchored at its center.
pub trait Surface {
    fn fill(&mut self, paint: Paint, position: Position, width: f64, height: f64);
    fn frame(&mut self, paint: Paint, position: Position, width: f64, height: f64);
    fn text(&mut self, text: &str, style: TextStyle, paint: Paint, position: Position);
    fn loading(&mut self);
}

const HIDDEN_TEXT: &str = "?";
const MINE_TEXT: &str = "B";
const FLAG_TEXT: &str = "F";

pub(crate) fn draw_tile<S: Surface + ?Sized>(
    surface: &mut S,
    tile: &Tile,
    position: Position,
    size: f64,
    highlighted: bool,
    missed: bool,
) {
    let background = match (tile.is_revealed(), tile.is_mine()) {
        (true, true) => Paint::TileMine,
        (true, false) => Paint::TileRevealed,
        (false, false) if missed => Paint::TileMissed,
        (false, _) => Paint::TileBackground,
    };
    let border = if tile.is_revealed() {
        Paint::Border
    } else {
        Paint::BorderHidden
    };

    surface.fill(background, position, size, size);
    surface.frame(border, position, size, size);
    if highlighted {
        surface.fill(Paint::TileHighlight, position, size, size);
    }

    let center = Position::new(position.x + size / 2.0, position.y + size / 2.0);
    if tile.is_revealed() {
        if tile.is_mine() {
            surface.text(MINE_TEXT, TextStyle::Tile, Paint::MineText, center);
        } else if tile.mine_near_by() > 0 {
            let count = tile.mine_near_by();
            surface.text(&count.to_string(), TextStyle::Tile, Paint::Count(count), center);
        }
    } else if tile.is_flagged() {
        surface.text(FLAG_TEXT, TextStyle::Tile, Paint::Flag, center);
    }
}

/// Paused boards hide every tile behind the same face.
pub(crate) fn draw_hidden_tile<S: Surface + ?Sized>(surface: &mut S, position: Position, size: f64) {
    surface.fill(Paint::TileHidden, position, size, size);
    surface.frame(Paint::Border, position, size, size);

    let center = Position::new(position.x + size / 2.0, position.y + size / 2.0);
    surface.text(HIDDEN_TEXT, TextStyle::Tile, Paint::HiddenText, center);
}
