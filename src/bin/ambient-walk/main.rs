//! ambient-walk - endless ambient music from a random walk over chords
//!
//! Run with: cargo run -- play

mod app;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ambient-walk")]
#[command(about = "Generative ambient music from random walks over pitch-class-set graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play live on the default output device
    Play {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds (plays until interrupted otherwise)
        #[arg(long)]
        seconds: Option<f64>,
    },

    /// Render a piece offline to a 16-bit stereo WAV file
    ExportWav(ExportArgs),

    /// Write the notes of a piece to a Standard MIDI File
    ExportMidi(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Length in 8-bar blocks
    #[arg(long)]
    hyperbars: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,
}

impl From<ExportArgs> for app::Export {
    fn from(args: ExportArgs) -> Self {
        app::Export {
            out: args.out,
            config: args.config,
            hyperbars: args.hyperbars,
            seed: args.seed,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Play { config, seconds } => app::play(config.as_deref(), seconds),
        Commands::ExportWav(args) => app::export_wav(args.into()),
        Commands::ExportMidi(args) => app::export_midi(args.into()),
    }
}
