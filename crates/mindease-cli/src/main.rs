use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mindease_core::{Language, Surface};
use tracing_subscriber::EnvFilter;

mod commands;
mod console;
mod helper;
mod render;

#[derive(Parser)]
#[command(name = "mindease")]
#[command(about = "MindEase - conversational mental-wellness assistant", long_about = None)]
struct Cli {
    /// Use this directory for config and data instead of the platform defaults
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Keep analyses in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Text chat with MindfulChat
    Chat,
    /// Voice assistant backed by the console
    Audio {
        #[arg(long, default_value = "english")]
        language: Language,
        /// Do not speak replies
        #[arg(long)]
        no_auto_speak: bool,
    },
    /// Simulated video session with Dr. Sarah
    Video,
    /// Show the stored analysis for a surface
    Analysis {
        #[arg(long, default_value = "chat")]
        surface: Surface,
    },
    /// Create the secret.json template
    Init,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mindease=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let home = cli.home.as_deref();

    match cli.command {
        Commands::Chat => commands::chat::run(home, cli.ephemeral).await?,
        Commands::Audio {
            language,
            no_auto_speak,
        } => commands::audio::run(home, cli.ephemeral, language, !no_auto_speak).await?,
        Commands::Video => commands::video::run(home, cli.ephemeral).await?,
        Commands::Analysis { surface } => commands::analysis::run(home, surface).await?,
        Commands::Init => commands::init::run(home)?,
    }

    Ok(())
}
