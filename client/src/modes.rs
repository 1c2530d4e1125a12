use tokio::io::{BufReader, Lines, Stdin};
use tokio::time::Duration;

use common::game::{GameState, Mark, Outcome};
use common::session::{self, GameSession, SessionEvent};
use common::transport::{Transport, TransportChannel};

use crate::bot::{RandomMoveProvider, pick_cpu_move};
use crate::scores::Scoreboard;
use crate::ui::{self, InputCommand};

pub type StdinLines = Lines<BufReader<Stdin>>;

const CPU_THINK_DELAY: Duration = Duration::from_millis(500);

enum PostRound {
    Again,
    Menu,
}

enum PairedEnd {
    LocalLeave,
    PeerLeft,
    ConnectionLost,
}

async fn next_command(input: &mut StdinLines) -> Result<InputCommand, String> {
    loop {
        let line = input
            .next_line()
            .await
            .map_err(|e| format!("Failed to read input: {}", e))?;
        let Some(line) = line else {
            // Closed stdin reads as leaving.
            return Ok(InputCommand::Quit);
        };
        match ui::parse_command(&line) {
            Some(command) => return Ok(command),
            None => println!("Enter a cell number 0-8, r to restart, or q for the menu."),
        }
    }
}

async fn post_round_prompt(input: &mut StdinLines) -> Result<PostRound, String> {
    println!("Press r for another round or q for the menu.");
    loop {
        match next_command(input).await? {
            InputCommand::Restart => return Ok(PostRound::Again),
            InputCommand::Quit => return Ok(PostRound::Menu),
            InputCommand::Move(_) => {
                println!("The round is over. Press r for another round or q for the menu.")
            }
        }
    }
}

pub async fn run_vs_cpu(input: &mut StdinLines) -> Result<(), String> {
    println!("You are X. The CPU plays O.");
    let mut scores = Scoreboard::new();
    let mut provider = RandomMoveProvider;

    loop {
        let mut game = GameState::new();

        let quit = loop {
            println!("\n{}", ui::render_board(&game));

            match game.outcome() {
                Outcome::Win { mark, .. } => {
                    scores.record_win(mark);
                    let winner = if mark == Mark::X { "You" } else { "The CPU" };
                    println!("{} won!", winner);
                    break false;
                }
                Outcome::Draw => {
                    println!("It's a draw!");
                    break false;
                }
                Outcome::InProgress => {}
            }

            if game.current_turn() == Mark::O {
                tokio::time::sleep(CPU_THINK_DELAY).await;
                if let Some(index) = pick_cpu_move(&mut provider, &game)
                    && game.play_move(index).is_ok()
                {
                    println!("The CPU plays {}.", index);
                }
                continue;
            }

            println!("Your turn.");
            match next_command(input).await? {
                InputCommand::Move(index) => {
                    // Occupied cells are a silent no-op.
                    let _ = game.play_move(index);
                }
                InputCommand::Restart => game.reset(),
                InputCommand::Quit => break true,
            }
        };

        if quit {
            return Ok(());
        }

        println!(
            "Score: You (X) {} / CPU (O) {}",
            scores.wins(Mark::X),
            scores.wins(Mark::O)
        );
        match post_round_prompt(input).await? {
            PostRound::Again => continue,
            PostRound::Menu => return Ok(()),
        }
    }
}

pub async fn run_local_two_player(input: &mut StdinLines) -> Result<(), String> {
    println!("Two players on this device. X starts.");
    let mut scores = Scoreboard::new();

    loop {
        let mut game = GameState::new();

        let quit = loop {
            println!("\n{}", ui::render_board(&game));

            match game.outcome() {
                Outcome::Win { mark, .. } => {
                    scores.record_win(mark);
                    println!("Player {} won!", ui::mark_name(mark));
                    break false;
                }
                Outcome::Draw => {
                    println!("It's a draw!");
                    break false;
                }
                Outcome::InProgress => {}
            }

            println!("Player {}'s turn.", ui::mark_name(game.current_turn()));
            match next_command(input).await? {
                InputCommand::Move(index) => {
                    let _ = game.play_move(index);
                }
                InputCommand::Restart => game.reset(),
                InputCommand::Quit => break true,
            }
        };

        if quit {
            return Ok(());
        }

        println!(
            "Score: Player X {} / Player O {}",
            scores.wins(Mark::X),
            scores.wins(Mark::O)
        );
        match post_round_prompt(input).await? {
            PostRound::Again => continue,
            PostRound::Menu => return Ok(()),
        }
    }
}

pub async fn run_host<T: Transport>(transport: &T, input: &mut StdinLines) -> Result<(), String> {
    let hosted = session::host(transport).await?;
    println!("Room code: {}", hosted.room_code());
    println!("Share it with your opponent and wait here. Press q to cancel.");

    let paired = tokio::select! {
        result = hosted.wait_for_peer() => result?,
        cancelled = wait_for_quit(input) => {
            cancelled?;
            println!("Stopped hosting. Returning to menu.");
            return Ok(());
        }
    };

    run_paired(paired, input).await
}

pub async fn run_join<T: Transport>(
    transport: &T,
    raw_code: &str,
    join_timeout: Duration,
    input: &mut StdinLines,
) -> Result<(), String> {
    println!("Joining...");
    match session::join(transport, raw_code, join_timeout).await {
        Ok(paired) => run_paired(paired, input).await,
        Err(reason) => {
            // Recoverable: back to the menu, free to retry.
            println!("{}", reason);
            Ok(())
        }
    }
}

async fn wait_for_quit(input: &mut StdinLines) -> Result<(), String> {
    loop {
        match next_command(input).await? {
            InputCommand::Quit => return Ok(()),
            _ => println!("Still waiting for an opponent. Press q to cancel."),
        }
    }
}

async fn run_paired<C: TransportChannel>(
    mut session: GameSession<C>,
    input: &mut StdinLines,
) -> Result<(), String> {
    let mut scores = Scoreboard::new();
    println!("Opponent found! You are {}.", ui::mark_name(session.local_mark()));
    println!("\n{}", ui::render_board(session.game()));
    print_turn(&session);

    let end = loop {
        tokio::select! {
            line = input.next_line() => {
                let line = line.map_err(|e| format!("Failed to read input: {}", e))?;
                let Some(line) = line else {
                    break PairedEnd::LocalLeave;
                };
                let Some(command) = ui::parse_command(&line) else {
                    println!("Enter a cell number 0-8, r to restart, or q to leave.");
                    continue;
                };
                match command {
                    InputCommand::Move(index) => match session.play_local(index).await {
                        Ok(()) => report_board(&session, &mut scores),
                        Err(reason) => println!("{}", reason),
                    },
                    InputCommand::Restart => {
                        session.restart().await;
                        println!("New round started.");
                        println!("\n{}", ui::render_board(session.game()));
                        print_turn(&session);
                    }
                    InputCommand::Quit => break PairedEnd::LocalLeave,
                }
            }
            event = session.next_event() => match event {
                SessionEvent::PeerMoved { index } => {
                    println!("Opponent plays {}.", index);
                    report_board(&session, &mut scores);
                }
                SessionEvent::PeerRestarted => {
                    println!("Opponent started a new round!");
                    println!("\n{}", ui::render_board(session.game()));
                    print_turn(&session);
                }
                SessionEvent::PeerLeft => break PairedEnd::PeerLeft,
                SessionEvent::ConnectionLost => break PairedEnd::ConnectionLost,
            }
        }
    };

    match end {
        PairedEnd::LocalLeave => {
            session.leave().await;
            println!("Left the game. Returning to menu.");
        }
        PairedEnd::PeerLeft => {
            session.close().await;
            println!("Your opponent has left the game. Returning to menu.");
        }
        PairedEnd::ConnectionLost => {
            session.close().await;
            println!("Connection lost. Returning to menu.");
        }
    }

    Ok(())
}

fn report_board<C: TransportChannel>(session: &GameSession<C>, scores: &mut Scoreboard) {
    println!("\n{}", ui::render_board(session.game()));

    let local = session.local_mark();
    let remote = local.opponent().unwrap_or(Mark::Empty);
    match session.game().outcome() {
        Outcome::Win { mark, .. } => {
            scores.record_win(mark);
            let winner = if mark == local { "You" } else { "Your opponent" };
            println!("{} won!", winner);
            println!(
                "Score: You {} / Opponent {}",
                scores.wins(local),
                scores.wins(remote)
            );
            println!("Press r for a new round or q to leave.");
        }
        Outcome::Draw => {
            println!("It's a draw!");
            println!("Press r for a new round or q to leave.");
        }
        Outcome::InProgress => print_turn(session),
    }
}

fn print_turn<C: TransportChannel>(session: &GameSession<C>) {
    if session.is_local_turn() {
        println!("Your turn.");
    } else if session.game().is_active() {
        println!("Opponent's turn.");
    }
}
