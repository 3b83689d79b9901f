use clap::Parser;
use log::info;
use server::config::{GameConfig, ServerConfig};
use server::network::Server;

/// Authoritative petal arena server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, env = "PORT", default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, env = "TICK_RATE", default_value = "20")]
    tick_rate: u32,
    /// Maximum number of concurrent clients
    #[clap(short, long, env = "MAX_CLIENTS", default_value = "64")]
    max_clients: usize,
    /// Seed for the world RNG
    #[clap(short, long, env = "SEED")]
    seed: Option<u64>,
}

/// Parses command-line arguments, then runs the server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        tick_rate: args.tick_rate,
        max_clients: args.max_clients,
        seed: args.seed,
        game: GameConfig::default(),
    };

    info!(
        "Starting server at {}:{} with {}Hz tick rate, max {} clients",
        config.host, config.port, config.tick_rate, config.max_clients
    );

    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
