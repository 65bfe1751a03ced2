//! quill - streaming chat CLI with cost tracking

mod config;
mod repl;

use clap::Parser;
use quill_ai::{pricing, providers::AnthropicClient};
use quill_engine::{ProviderTransport, SessionEngine, TranscriptStore};
use std::sync::Arc;

/// quill - chat with Claude from the terminal
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: claude-sonnet-4-5-20250929)
    #[arg(short, long)]
    model: Option<String>,

    /// Resume a previous session by ID
    #[arg(long)]
    resume: Option<String>,

    /// List saved sessions
    #[arg(long)]
    sessions: bool,

    /// Delete a saved session by ID
    #[arg(long)]
    delete: Option<String>,

    /// List available models and their pricing
    #[arg(long)]
    models: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("quill=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // List models and exit
    if args.models {
        println!("Available models ($ per million tokens, in/out):");
        for rate in pricing::all() {
            println!(
                "  {:<30} {} (${}/{})",
                rate.id, rate.name, rate.input_per_mtok, rate.output_per_mtok
            );
        }
        return Ok(());
    }

    let store = TranscriptStore::new(TranscriptStore::default_dir());

    // List sessions and exit
    if args.sessions {
        return list_sessions(&store);
    }

    // Delete a session and exit
    if let Some(ref id) = args.delete {
        match store.delete(id) {
            Ok(()) => println!("Deleted session {}", id),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| pricing::default_model().id.to_string());

    if let Err(e) = pricing::rate_for(&model) {
        eprintln!("Error: {}", e);
        eprintln!("Run 'quill --models' to see available models.");
        std::process::exit(1);
    }

    // A missing credential is fatal before any engine operation.
    let Some(api_key) = cfg.get_api_key() else {
        eprintln!("Error: no API key found.");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  1. Set it in the environment: export ANTHROPIC_API_KEY=your-key");
        eprintln!("  2. Add it to the config file: quill --init-config");
        std::process::exit(1);
    };

    let transport = Arc::new(ProviderTransport::new(AnthropicClient::new(api_key)));
    let engine = SessionEngine::new(transport, store);

    // Resume or start a session
    let session = if let Some(ref id) = args.resume {
        match engine.resume(id) {
            Ok(session) => {
                println!(
                    "Resuming session {} ({} messages, ${:.4} spent)",
                    id,
                    session.messages.len(),
                    session.total_cost
                );
                session
            }
            Err(e) => {
                eprintln!("Error loading session: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        engine.create(&model)?
    };

    repl::run(&engine, session).await
}

fn list_sessions(store: &TranscriptStore) -> anyhow::Result<()> {
    let summaries = store.list()?;
    if summaries.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }

    println!("Saved sessions ({}):", summaries.len());
    let mut total = 0.0;
    for summary in &summaries {
        println!(
            "  {}  [{}] {} (${:.4})",
            summary.id,
            summary.created_at_display(),
            summary.model,
            summary.total_cost
        );
        println!("      {}", summary.preview);
        total += summary.total_cost;
    }
    println!();
    println!("Total spend: ${:.4}", total);
    Ok(())
}
