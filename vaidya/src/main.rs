//! Vaidya - an Ayurvedic wellness assistant for the terminal.
//!
//! Reads one message per line from stdin and prints the assistant's reply.
//! Conversation memory persists between runs.
//!
//! ```bash
//! cargo run -p vaidya -- --data-dir ./memory
//! ```

mod repl;

use clap::Parser;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};
use vaidya_core::{ChatConfig, ChatSession};

#[derive(Parser)]
#[command(name = "vaidya")]
#[command(about = "Ayurvedic wellness chat assistant")]
struct Args {
    /// Directory for persisted conversation memory
    #[arg(long, env = "VAIDYA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Model to request
    #[arg(long, env = "VAIDYA_MODEL")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "VAIDYA_BASE_URL")]
    base_url: Option<String>,

    /// Forget the stored conversation before starting
    #[arg(long)]
    clear: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // CLI args > env vars (handled by clap and ChatConfig) > defaults
    let mut config = ChatConfig::from_env();
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }

    if config.api_key.is_none() {
        warn!("no API key configured; set VAIDYA_API_KEY or OPENAI_API_KEY");
        eprintln!("Warning: no API key set. Replies will fail until VAIDYA_API_KEY or OPENAI_API_KEY is provided.");
    }

    let mut session = ChatSession::from_config(&config)?;
    if args.clear {
        session.clear();
    }

    repl::run(&mut session).await?;
    Ok(())
}
