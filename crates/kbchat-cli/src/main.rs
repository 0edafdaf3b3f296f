use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use kbchat::clients::anthropic::{self, ANTHROPIC_BASE_URL_ENV_VAR, DEFAULT_BASE_URL};
use kbchat::console::{paint, Console, Tone};
use kbchat::session::{
    SessionConfigBuilder, DEFAULT_MAX_HISTORY_ITEMS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};
use kbchat::Error;
use tracing_subscriber::EnvFilter;

/// Ask questions about a local knowledge base file.
#[derive(Debug, Parser)]
#[command(name = "kbchat", version)]
struct Args {
    /// Knowledge base file; prompts for one when omitted.
    #[arg(short, long, env = "KBCHAT_KNOWLEDGE_BASE")]
    knowledge_base: Option<PathBuf>,

    #[arg(short, long, env = "KBCHAT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Number of turns kept in the conversation window.
    #[arg(long, env = "KBCHAT_MAX_HISTORY_ITEMS", default_value_t = DEFAULT_MAX_HISTORY_ITEMS)]
    max_history_items: usize,

    #[arg(long, env = "KBCHAT_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    #[arg(long, env = ANTHROPIC_BASE_URL_ENV_VAR, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, default_value_t = 30)]
    connect_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        // already reported by the console
        Err(Error::KnowledgeBase { .. }) => ExitCode::FAILURE,
        Err(e) => {
            println!(
                "{}",
                paint(&format!("An unexpected error occurred: {e}"), Tone::Error)
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> kbchat::Result<()> {
    let client = anthropic::ClientBuilder::default()
        .base_url(args.base_url)
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .build()?;

    let mut config = SessionConfigBuilder::default();
    config
        .model_name(args.model)
        .max_history_items(args.max_history_items)
        .max_tokens(args.max_tokens);

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console
        .run(Box::new(client), config, args.knowledge_base)
        .await
}
