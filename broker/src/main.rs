use clap::Parser;
use common::{log, logger};

use tictactoe_broker::Relay;

#[derive(Parser)]
#[command(name = "tictactoe_broker")]
struct Args {
    #[arg(long, default_value_t = 7155)]
    port: u16,

    #[arg(long)]
    use_log_prefix: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Broker".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let relay = Relay::bind(&format!("0.0.0.0:{}", args.port)).await?;
    log!("Relay listening on port {}", args.port);

    tokio::select! {
        _ = relay.run() => {}
        _ = tokio::signal::ctrl_c() => {
            log!("Shutdown signal received");
        }
    }

    log!("Relay shut down");
    Ok(())
}
