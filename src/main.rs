mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use wp_core::config::Config;
use wp_core::events::EventBus;
use wp_db::{PlaylistStore, SqlitePlaylistStore, Video};
use wp_server::ingest::IngestService;

/// Load the config file (or defaults) and apply environment overrides.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load default config".to_string(),
    })?;
    config.apply_env();
    Ok(config)
}

fn open_store(config: &Config) -> Result<SqlitePlaylistStore> {
    let pool = wp_db::pool::init_pool(&config.server.db_path).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.server.db_path.display()
        )
    })?;
    Ok(SqlitePlaylistStore::new(pool))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    // CLI flags win over file and environment.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting watchparty server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    wp_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "watchparty=trace,wp_server=trace,wp_extract=trace,wp_db=debug,wp_core=debug,tower_http=debug"
                .to_string()
        } else {
            "watchparty=debug,wp_server=debug,wp_extract=debug,wp_db=info,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Add { url, room, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(add_video(&url, room.as_deref(), json, cli.config.as_deref()))
        }
        Commands::List { room, json } => list_videos(room.as_deref(), json, cli.config.as_deref()),
        Commands::Rooms => list_rooms(cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("watchparty {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::GenerateSecret => {
            println!("{}", wp_server::middleware::auth::generate_secret());
            Ok(())
        }
    }
}

fn print_video(video: &Video) {
    println!("{}  [{}] {}", video.created_at, video.room, video.title);
    println!("    {}", video.video_url);
    if let Some(ref thumb) = video.thumbnail_url {
        println!("    thumbnail: {thumb}");
    }
}

async fn add_video(
    url: &str,
    room: Option<&str>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let store = Arc::new(open_store(&config)?);
    let extractor = wp_server::build_extractor(&config);

    let service = IngestService::new(
        store,
        extractor,
        Arc::new(EventBus::default()),
        config.playlist.clone(),
    );
    let video = service
        .add_video(Some(url), room)
        .await
        .context("Failed to add video")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&video)?);
    } else {
        println!("Added:");
        print_video(&video);
    }
    Ok(())
}

fn list_videos(room: Option<&str>, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let room = room
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(config.playlist.default_room.as_str());

    let videos = store.list_by_room(room)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&videos)?);
        return Ok(());
    }

    if videos.is_empty() {
        println!("Room '{room}' has no videos.");
        return Ok(());
    }
    println!("Room '{room}' ({} videos):\n", videos.len());
    for video in &videos {
        print_video(video);
    }
    Ok(())
}

fn list_rooms(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let rooms = store.list_rooms()?;

    if rooms.is_empty() {
        println!("No rooms yet.");
    }
    for room in rooms {
        println!("{:>5}  {}", room.count, room.name);
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = load_config(config_path)?;
    let tool = wp_extract::tools::check_ytdlp(&config.extractor);

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({version})");
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!("\n");

    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("yt-dlp is missing. Install it to enable adding videos.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration parses");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Auth enabled: {}", config.auth.enabled);
    println!("  Default room: {}", config.playlist.default_room);
    println!(
        "  Extractor timeout: {}s (force IPv4: {})",
        config.extractor.timeout_secs, config.extractor.force_ipv4
    );

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ No warnings");
    } else {
        println!("\nWarnings:");
        for w in warnings {
            println!("  - {w}");
        }
    }
    Ok(())
}
