//! The extractor seam and its yt-dlp implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use wp_core::config::ExtractorConfig;
use wp_core::{Error, Result};

use crate::command::ToolCommand;
use crate::metadata::{parse_info_json, VideoMetadata};
use crate::tools;

/// Message reported when the extractor ran but produced nothing usable.
pub const EMPTY_RESULT_MESSAGE: &str = "Failed to extract video info";

/// Something that can turn a page URL into video metadata.
///
/// Every failure is reported as [`Error::ExtractionFailed`] carrying the
/// extractor's own message.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &str) -> Result<VideoMetadata>;
}

/// Options passed to yt-dlp on every call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub user_agent: String,
    pub force_ipv4: bool,
    pub timeout: Duration,
}

impl From<&ExtractorConfig> for ExtractOptions {
    fn from(cfg: &ExtractorConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            force_ipv4: cfg.force_ipv4,
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ExtractorConfig::default())
    }
}

/// An [`Extractor`] backed by the `yt-dlp` CLI.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    options: ExtractOptions,
}

impl YtDlpExtractor {
    pub fn new(ytdlp_path: PathBuf, options: ExtractOptions) -> Self {
        Self {
            ytdlp_path,
            options,
        }
    }

    /// Build from configuration, honouring an explicit `ytdlp_path`.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] when yt-dlp cannot be located.
    pub fn from_config(cfg: &ExtractorConfig) -> Result<Self> {
        let path = tools::locate_ytdlp(cfg).ok_or_else(|| {
            Error::tool(
                tools::YTDLP,
                "yt-dlp not found; is it installed and in PATH?",
            )
        })?;
        Ok(Self::new(path, ExtractOptions::from(cfg)))
    }

    pub fn path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Arguments for a metadata-only lookup of `url`.
    pub fn build_args(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "--dump-single-json",
            "--skip-download",
            "--no-warnings",
            "--playlist-items",
            "1",
            "--user-agent",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(self.options.user_agent.clone());
        if self.options.force_ipv4 {
            args.push("--force-ipv4".into());
        }
        // Keep a URL starting with '-' from being read as an option.
        args.push("--".into());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        tools::YTDLP
    }

    async fn extract(&self, url: &str) -> Result<VideoMetadata> {
        let mut cmd = ToolCommand::new(self.ytdlp_path.clone());
        cmd.args(self.build_args(url)).timeout(self.options.timeout);

        let output = cmd.output().await.map_err(|e| match e {
            Error::Tool { message, .. } => Error::ExtractionFailed(message),
            other => Error::ExtractionFailed(other.to_string()),
        })?;

        if !output.success() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!("yt-dlp exited with status {}", output.status)
            } else {
                stderr.to_string()
            };
            return Err(Error::ExtractionFailed(message));
        }

        parse_info_json(&output.stdout)?
            .ok_or_else(|| Error::ExtractionFailed(EMPTY_RESULT_MESSAGE.into()))
    }
}
