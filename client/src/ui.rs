use common::game::{BOARD_CELLS, GameState, Mark};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Move(usize),
    Restart,
    Quit,
}

/// One line of player input: a cell number, `r` to restart, `q` to leave.
/// Anything else is `None` and the caller re-prompts.
pub fn parse_command(line: &str) -> Option<InputCommand> {
    let trimmed = line.trim();
    match trimmed {
        "r" | "R" => Some(InputCommand::Restart),
        "q" | "Q" => Some(InputCommand::Quit),
        _ => trimmed
            .parse::<usize>()
            .ok()
            .filter(|&index| index < BOARD_CELLS)
            .map(InputCommand::Move),
    }
}

pub fn mark_name(mark: Mark) -> &'static str {
    match mark {
        Mark::X => "X",
        Mark::O => "O",
        Mark::Empty => " ",
    }
}

/// Renders the grid with cell numbers in the empty cells, so the prompt and
/// the board use the same addressing.
pub fn render_board(game: &GameState) -> String {
    let mut out = String::new();
    for row in 0..3 {
        if row > 0 {
            out.push_str("---+---+---\n");
        }
        for col in 0..3 {
            let index = row * 3 + col;
            if col > 0 {
                out.push('|');
            }
            let glyph = match game.board()[index] {
                Mark::X => 'X',
                Mark::O => 'O',
                Mark::Empty => (b'0' + index as u8) as char,
            };
            out.push(' ');
            out.push(glyph);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_numbers() {
        assert_eq!(parse_command("4"), Some(InputCommand::Move(4)));
        assert_eq!(parse_command(" 0 "), Some(InputCommand::Move(0)));
        assert_eq!(parse_command("8"), Some(InputCommand::Move(8)));
    }

    #[test]
    fn test_parse_rejects_out_of_range_cells() {
        assert_eq!(parse_command("9"), None);
        assert_eq!(parse_command("-1"), None);
        assert_eq!(parse_command("99"), None);
    }

    #[test]
    fn test_parse_commands_are_case_insensitive() {
        assert_eq!(parse_command("r"), Some(InputCommand::Restart));
        assert_eq!(parse_command("R"), Some(InputCommand::Restart));
        assert_eq!(parse_command("q"), Some(InputCommand::Quit));
        assert_eq!(parse_command("Q"), Some(InputCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("restart please"), None);
    }

    #[test]
    fn test_render_shows_marks_and_cell_numbers() {
        let mut game = GameState::new();
        game.play_move(4).unwrap();
        game.play_move(0).unwrap();

        let rendered = render_board(&game);

        assert!(rendered.contains(" O | 1 | 2 "));
        assert!(rendered.contains(" 3 | X | 5 "));
        assert!(rendered.contains(" 6 | 7 | 8 "));
    }
}
