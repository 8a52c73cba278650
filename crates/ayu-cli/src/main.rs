//! ayu — patient intake assistant client

mod audio;
mod config;
mod report;
mod runner;
mod store;
mod ui;

use clap::Parser;
use std::sync::Arc;

use ayu_api::IntakeClient;
use ayu_intake::{Language, NullPlayer, SpeechPlayer, builtin_scenarios};

/// ayu — patient intake assistant
#[derive(Parser, Debug)]
#[command(name = "ayu")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (default: http://localhost:8000)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Conversation language (english, hindi, kannada); skips the picker
    #[arg(short, long)]
    language: Option<String>,

    /// Disable speech playback
    #[arg(long)]
    mute: bool,

    /// Open the saved report review instead of starting a conversation
    #[arg(long)]
    report: bool,

    /// List demo scenarios and exit
    #[arg(long)]
    scenarios: bool,

    /// Initialize config file and exit
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
            .with_env_filter("ayu=debug")
            .with_writer(std::io::stderr)
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

    // List demo scenarios and exit
    if args.scenarios {
        for scenario in builtin_scenarios() {
            println!(
                "{:<14} {} — {} • {}",
                scenario.id, scenario.label, scenario.doctor, scenario.specialist
            );
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let backend_url = args
        .backend_url
        .or(cfg.backend_url.clone())
        .unwrap_or_else(|| ayu_api::client::DEFAULT_BASE_URL.to_string());

    let preset_language = match &args.language {
        Some(name) => match Language::parse(name) {
            Some(language) => Some(language),
            None => {
                eprintln!("Error: unknown language {:?} (english, hindi, kannada)", name);
                std::process::exit(1);
            }
        },
        None => None,
    };
    let default_language = cfg
        .language
        .as_deref()
        .and_then(Language::parse)
        .unwrap_or_default();

    let mute = args.mute || cfg.mute.unwrap_or(false);
    let player: Arc<dyn SpeechPlayer> = if mute {
        Arc::new(NullPlayer)
    } else {
        Arc::new(audio::RodioPlayer::new())
    };

    let client = IntakeClient::new(backend_url)?;

    ui::run(ui::RunOptions {
        client,
        player,
        preset_language,
        default_language,
        open_report: args.report,
    })
    .await
}
