mod board;
mod types;
mod win_detector;

pub use board::{BOARD_CELLS, GameState};
pub use types::{Mark, Outcome};
pub use win_detector::{WINNING_LINES, check_outcome};
