use super::types::{Mark, Outcome};
use super::win_detector::check_outcome;

pub const BOARD_CELLS: usize = 9;

/// Local copy of one game. There is no authoritative shared board in a
/// remote session; both peers hold their own `GameState` and keep them
/// consistent by applying the same moves in the order received.
#[derive(Debug, Clone)]
pub struct GameState {
    board: [Mark; BOARD_CELLS],
    current_mark: Mark,
    outcome: Outcome,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: [Mark::Empty; BOARD_CELLS],
            current_mark: Mark::X,
            outcome: Outcome::InProgress,
        }
    }

    pub fn play_move(&mut self, index: usize) -> Result<(), String> {
        if self.outcome != Outcome::InProgress {
            return Err("Game is already over".to_string());
        }

        if index >= BOARD_CELLS {
            return Err(format!("Cell {} is out of range", index));
        }

        if self.board[index] != Mark::Empty {
            return Err(format!("Cell {} is already marked", index));
        }

        self.board[index] = self.current_mark;
        self.outcome = check_outcome(&self.board);

        // The winner keeps the turn, matching what the status line reports.
        if self.outcome == Outcome::InProgress
            && let Some(next) = self.current_mark.opponent()
        {
            self.current_mark = next;
        }

        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &[Mark; BOARD_CELLS] {
        &self.board
    }

    pub fn current_turn(&self) -> Mark {
        self.current_mark
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_active(&self) -> bool {
        self.outcome == Outcome::InProgress
    }

    pub fn cell_is_empty(&self, index: usize) -> bool {
        index < BOARD_CELLS && self.board[index] == Mark::Empty
    }

    pub fn available_moves(&self) -> Vec<usize> {
        self.board
            .iter()
            .enumerate()
            .filter(|&(_, &mark)| mark == Mark::Empty)
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
