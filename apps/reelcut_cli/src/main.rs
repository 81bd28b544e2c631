//! reelcut CLI: build a two-track timeline and export it with ffmpeg.
//!
//! Usage:
//!   reelcut init <PROJECT>                 Create an empty project file
//!   reelcut import <PROJECT> <FILES>...    Probe media and add it to the library
//!   reelcut add <PROJECT> <MEDIA>          Place media on a track
//!   reelcut trim|split|move|remove ...     Edit clips
//!   reelcut info <PROJECT>                 Show media and timeline
//!   reelcut plan <PROJECT>                 Print the compiled filter graph
//!   reelcut export <PROJECT>               Render to MP4

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelcut_core::project::{ExportProfile, Resolution};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "reelcut", about = "Two-track timeline editor and exporter", version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Export overrides shared by `plan` and `export`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Encode profile: draft (720p, fast) or final (1080p, slow).
    /// Individual flags below take precedence.
    #[arg(long)]
    profile: Option<ExportProfile>,

    /// Output resolution: 1080p, 720p or source
    #[arg(long)]
    resolution: Option<Resolution>,

    /// x264 constant rate factor
    #[arg(long)]
    crf: Option<u8>,

    /// x264 preset
    #[arg(long)]
    preset: Option<String>,

    /// AAC bitrate, e.g. 192k
    #[arg(long)]
    audio_bitrate: Option<String>,

    /// Gap between the overlay and the frame corner, in pixels
    #[arg(long)]
    overlay_margin: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project file (".reelcut" is appended if missing)
        path: PathBuf,

        /// Project name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Probe media files and add them to the project library
    Import {
        path: PathBuf,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Place a media item on a track
    Add {
        path: PathBuf,

        /// Media id or unique id prefix
        media: String,

        /// Track number: 1 = base, 2 = overlay
        #[arg(short, long, default_value = "1")]
        track: u32,

        /// Timeline start in seconds (appends after the last clip if omitted)
        #[arg(long)]
        at: Option<f64>,
    },

    /// Trim a clip's source window
    Trim {
        path: PathBuf,

        /// Clip id or unique id prefix
        clip: String,

        /// New source in-point, seconds
        #[arg(long)]
        start: Option<f64>,

        /// New source out-point, seconds
        #[arg(long)]
        end: Option<f64>,
    },

    /// Split a clip at a timeline position
    Split {
        path: PathBuf,
        clip: String,
        /// Timeline position in seconds
        at: f64,
    },

    /// Move a clip to a new timeline start
    Move {
        path: PathBuf,
        clip: String,
        /// New start in seconds
        to: f64,
    },

    /// Remove a clip from the timeline
    Remove { path: PathBuf, clip: String },

    /// Close gaps on a track
    Reflow {
        path: PathBuf,

        #[arg(short, long, default_value = "1")]
        track: u32,

        /// First clip to reflow from (defaults to the start of the track)
        #[arg(long)]
        from: Option<String>,
    },

    /// Show project information
    Info { path: PathBuf },

    /// Print the compiled render graph
    Plan {
        path: PathBuf,

        /// Print the structured graph as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Render the timeline to a video file
    Export {
        path: PathBuf,

        /// Output file path (defaults to the project path with .mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        export: ExportArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path, name } => commands::init::run(path, name),
        Commands::Import { path, files } => commands::import::run(path, files),
        Commands::Add {
            path,
            media,
            track,
            at,
        } => commands::edit::add(path, media, track, at),
        Commands::Trim {
            path,
            clip,
            start,
            end,
        } => commands::edit::trim(path, clip, start, end),
        Commands::Split { path, clip, at } => commands::edit::split(path, clip, at),
        Commands::Move { path, clip, to } => commands::edit::move_clip(path, clip, to),
        Commands::Remove { path, clip } => commands::edit::remove(path, clip),
        Commands::Reflow { path, track, from } => commands::edit::reflow(path, track, from),
        Commands::Info { path } => commands::info::run(path),
        Commands::Plan { path, json, export } => commands::plan::run(path, json, export),
        Commands::Export {
            path,
            output,
            export,
        } => commands::export::run(path, output, export).await,
    }
}
