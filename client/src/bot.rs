use rand::prelude::IndexedRandom;

use common::game::{BOARD_CELLS, GameState, Mark};

/// Chooses a cell for the side to move. An implementation may be a local
/// policy or a remote recommendation call; either way the caller validates
/// the answer before playing it.
pub trait MoveProvider {
    fn choose_move(&mut self, board: &[Mark; BOARD_CELLS], mark: Mark) -> Option<usize>;
}

pub struct RandomMoveProvider;

impl MoveProvider for RandomMoveProvider {
    fn choose_move(&mut self, board: &[Mark; BOARD_CELLS], _mark: Mark) -> Option<usize> {
        let open_cells: Vec<usize> = board
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Mark::Empty)
            .map(|(index, _)| index)
            .collect();

        open_cells.choose(&mut rand::rng()).copied()
    }
}

/// Asks the provider for a move; any missing or unplayable answer falls back
/// to a random legal cell. Returns `None` only when the board is full.
pub fn pick_cpu_move(provider: &mut dyn MoveProvider, game: &GameState) -> Option<usize> {
    match provider.choose_move(game.board(), game.current_turn()) {
        Some(index) if game.cell_is_empty(index) => Some(index),
        _ => game.available_moves().choose(&mut rand::rng()).copied(),
    }
}
