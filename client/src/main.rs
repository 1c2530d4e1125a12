mod bot;
mod config;
mod modes;
mod scores;
mod transport;
mod ui;

use clap::{Parser, Subcommand};
use common::logger;
use tokio::io::{AsyncBufReadExt, BufReader};

use config::ClientConfig;
use modes::StdinLines;
use transport::BrokerTransport;

#[derive(Parser)]
#[command(name = "tictactoe_client")]
struct Args {
    /// Path to the YAML config file
    #[arg(long)]
    config: Option<String>,

    /// Relay address override, host:port
    #[arg(long)]
    relay: Option<String>,

    #[arg(long)]
    use_log_prefix: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Play against the CPU
    Cpu,
    /// Two players sharing this device
    Local,
    /// Host an online game and print the room code
    Host,
    /// Join an online game by room code
    Join { code: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Client".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let config_path = args
        .config
        .unwrap_or_else(|| config::DEFAULT_CONFIG_FILE.to_string());
    let mut client_config = ClientConfig::load(&config_path)?;
    if let Some(relay) = args.relay {
        client_config.relay_address = relay;
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match args.mode {
        Some(Mode::Cpu) => modes::run_vs_cpu(&mut input).await?,
        Some(Mode::Local) => modes::run_local_two_player(&mut input).await?,
        Some(Mode::Host) => {
            let transport = BrokerTransport::new(client_config.relay_address.clone());
            modes::run_host(&transport, &mut input).await?;
        }
        Some(Mode::Join { code }) => {
            let transport = BrokerTransport::new(client_config.relay_address.clone());
            modes::run_join(
                &transport,
                &code,
                client_config.join_timeout(),
                &mut input,
            )
            .await?;
        }
        None => menu_loop(&client_config, &mut input).await?,
    }

    Ok(())
}

async fn menu_loop(client_config: &ClientConfig, input: &mut StdinLines) -> Result<(), String> {
    loop {
        println!();
        println!("=== Tic-Tac-Toe ===");
        println!("1) Play vs CPU");
        println!("2) Two players on this device");
        println!("3) Host online game");
        println!("4) Join online game");
        println!("q) Quit");

        let Some(choice) = read_line(input).await? else {
            return Ok(());
        };
        match choice.trim() {
            "1" => modes::run_vs_cpu(input).await?,
            "2" => modes::run_local_two_player(input).await?,
            "3" => {
                let transport = BrokerTransport::new(client_config.relay_address.clone());
                modes::run_host(&transport, input).await?;
            }
            "4" => {
                println!("Enter room code:");
                let Some(code) = read_line(input).await? else {
                    return Ok(());
                };
                let transport = BrokerTransport::new(client_config.relay_address.clone());
                modes::run_join(&transport, &code, client_config.join_timeout(), input).await?;
            }
            "q" | "Q" => return Ok(()),
            other => println!("Unknown choice: {}", other),
        }
    }
}

async fn read_line(input: &mut StdinLines) -> Result<Option<String>, String> {
    input
        .next_line()
        .await
        .map_err(|e| format!("Failed to read input: {}", e))
}
