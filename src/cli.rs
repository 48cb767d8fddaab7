use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "watchparty")]
#[command(author, version, about = "Shared per-room video playlists for watch parties")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Add a video to a room's playlist by URL
    Add {
        /// Page URL of the video
        #[arg(required = true)]
        url: String,

        /// Room to add to (defaults to the configured default room)
        #[arg(short, long)]
        room: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a room's playlist, newest first
    List {
        /// Room to list (defaults to the configured default room)
        #[arg(short, long)]
        room: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List rooms that have videos
    Rooms,

    /// Check that yt-dlp is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Generate a random secret for token verification
    GenerateSecret,
}
