/// Source of game time, in milliseconds.
///
/// Game time only advances while a run is in play, so anything timed against
/// it (acceleration windows, the HUD timer) stops while paused.
pub trait GameClock {
    fn game_time(&self) -> f64;
    fn reset_time(&mut self);
}

/// Clock advanced by hand, for headless drivers and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SteppedClock {
    time: f64,
}

impl SteppedClock {
    pub const fn new() -> Self {
        Self { time: 0.0 }
    }

    pub fn advance(&mut self, ms: f64) {
        self.time += ms;
    }
}

impl GameClock for SteppedClock {
    fn game_time(&self) -> f64 {
        self.time
    }

    fn reset_time(&mut self) {
        self.time = 0.0;
    }
}

const SECOND: f64 = 1000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;

/// Formats game time for the HUD: `12.3 s`, `4.5 m` or `1.2 h`.
pub fn format_game_time(ms: f64) -> String {
    if ms > HOUR {
        format!("{:.1} h", ms / HOUR)
    } else if ms > MINUTE {
        format!("{:.1} m", ms / MINUTE)
    } else {
        format!("{:.1} s", ms / SECOND)
    }
}
