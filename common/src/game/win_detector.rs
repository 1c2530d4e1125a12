use super::board::BOARD_CELLS;
use super::types::{Mark, Outcome};

pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub fn check_outcome(board: &[Mark; BOARD_CELLS]) -> Outcome {
    for line in WINNING_LINES {
        let [a, b, c] = line;
        if board[a] != Mark::Empty && board[a] == board[b] && board[a] == board[c] {
            return Outcome::Win {
                mark: board[a],
                line,
            };
        }
    }

    if board.iter().all(|&cell| cell != Mark::Empty) {
        return Outcome::Draw;
    }

    Outcome::InProgress
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(cells: [char; BOARD_CELLS]) -> [Mark; BOARD_CELLS] {
        cells.map(|c| match c {
            'X' => Mark::X,
            'O' => Mark::O,
            _ => Mark::Empty,
        })
    }

    #[test]
    fn test_empty_board_is_in_progress() {
        let board = [Mark::Empty; BOARD_CELLS];

        assert_eq!(check_outcome(&board), Outcome::InProgress);
    }

    #[test]
    fn test_top_row_win_reports_line() {
        let board = board_from(['X', 'X', 'X', 'O', 'O', ' ', ' ', ' ', ' ']);

        assert_eq!(
            check_outcome(&board),
            Outcome::Win {
                mark: Mark::X,
                line: [0, 1, 2],
            }
        );
    }

    #[test]
    fn test_column_win_for_o() {
        let board = board_from(['O', 'X', 'X', 'O', 'X', ' ', 'O', ' ', ' ']);

        assert_eq!(
            check_outcome(&board),
            Outcome::Win {
                mark: Mark::O,
                line: [0, 3, 6],
            }
        );
    }

    #[test]
    fn test_diagonal_win() {
        let board = board_from(['X', 'O', ' ', 'O', 'X', ' ', ' ', ' ', 'X']);

        assert_eq!(
            check_outcome(&board),
            Outcome::Win {
                mark: Mark::X,
                line: [0, 4, 8],
            }
        );
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let board = board_from(['X', 'O', 'X', 'X', 'O', 'O', 'O', 'X', 'X']);

        assert_eq!(check_outcome(&board), Outcome::Draw);
    }

    #[test]
    fn test_each_winning_line_is_detected() {
        for line in WINNING_LINES {
            let mut board = [Mark::Empty; BOARD_CELLS];
            for index in line {
                board[index] = Mark::O;
            }

            assert_eq!(
                check_outcome(&board),
                Outcome::Win {
                    mark: Mark::O,
                    line,
                }
            );
        }
    }

    // Exhaustive sweep over every 3^9 cell assignment, pruned to boards with a
    // legal mark balance and at most one winning side, checking the outcome
    // against a direct recount.
    #[test]
    fn test_outcome_matches_recount_over_reachable_boards() {
        let mut checked = 0usize;

        for encoded in 0..3usize.pow(BOARD_CELLS as u32) {
            let mut board = [Mark::Empty; BOARD_CELLS];
            let mut value = encoded;
            for cell in board.iter_mut() {
                *cell = match value % 3 {
                    1 => Mark::X,
                    2 => Mark::O,
                    _ => Mark::Empty,
                };
                value /= 3;
            }

            let x_count = board.iter().filter(|&&m| m == Mark::X).count();
            let o_count = board.iter().filter(|&&m| m == Mark::O).count();
            if x_count != o_count && x_count != o_count + 1 {
                continue;
            }

            let winners: Vec<Mark> = [Mark::X, Mark::O]
                .into_iter()
                .filter(|&mark| {
                    WINNING_LINES
                        .iter()
                        .any(|line| line.iter().all(|&i| board[i] == mark))
                })
                .collect();
            if winners.len() > 1 {
                continue;
            }

            let expected = match winners.first() {
                Some(&mark) => mark,
                None => Mark::Empty,
            };
            match check_outcome(&board) {
                Outcome::Win { mark, line } => {
                    assert_eq!(mark, expected);
                    assert!(line.iter().all(|&i| board[i] == mark));
                }
                Outcome::Draw => {
                    assert_eq!(expected, Mark::Empty);
                    assert_eq!(x_count + o_count, BOARD_CELLS);
                }
                Outcome::InProgress => {
                    assert_eq!(expected, Mark::Empty);
                    assert!(x_count + o_count < BOARD_CELLS);
                }
            }
            checked += 1;
        }

        assert!(checked > 0);
    }
}
