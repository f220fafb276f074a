mod chat;

use anyhow::Result;
use clap::Parser;
use tracing::{info, info_span, Instrument};

use livecmt_core::{load_config, logging};

/// Join a live room's chat server and keep the session alive
#[derive(Debug, Parser)]
#[command(name = "livecmt", version)]
struct Args {
    /// Room alias or numeric room id
    room: String,

    /// Path to a YAML config file
    #[arg(short, long, env = "LIVECMT_CONFIG_PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("livecmt starting...");

    // 3. Discover the room and run the keepalive session
    let span = info_span!(
        "livecmt",
        trace_id = %logging::generate_trace_id(),
        room = %args.room
    );
    chat::run(&config, &args.room).instrument(span).await
}
