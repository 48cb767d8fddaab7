//! External tool detection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wp_core::config::ExtractorConfig;

/// Executable name of the extractor.
pub const YTDLP: &str = "yt-dlp";

/// Availability information for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `--version` output, if available.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolve the yt-dlp executable.
///
/// A configured path is used when it exists; otherwise `PATH` is searched.
pub fn locate_ytdlp(cfg: &ExtractorConfig) -> Option<PathBuf> {
    if let Some(p) = cfg.ytdlp_path.as_deref() {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        tracing::warn!(path = %p.display(), "Configured yt-dlp path does not exist; searching PATH");
    }
    which::which(YTDLP).ok()
}

/// Report whether yt-dlp is available and which version it is.
pub fn check_ytdlp(cfg: &ExtractorConfig) -> ToolInfo {
    match locate_ytdlp(cfg) {
        Some(path) => ToolInfo {
            name: YTDLP.to_string(),
            available: true,
            version: detect_version(&path),
            path: Some(path),
        },
        None => ToolInfo {
            name: YTDLP.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Run `<tool> --version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("--version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.trim().to_string())
}
