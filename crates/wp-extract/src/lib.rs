//! # wp-extract
//!
//! Video metadata extraction for watchparty.
//!
//! - **Command execution** ([`ToolCommand`]): async builder with timeout
//!   support for running external processes.
//! - **Extractor seam** ([`Extractor`]): the trait the ingestion flow calls,
//!   with [`YtDlpExtractor`] shelling out to `yt-dlp`.
//! - **Metadata parsing** ([`metadata`]): reduces yt-dlp's JSON (single
//!   record or collection) to one [`VideoMetadata`].
//! - **Tool checks** ([`tools`]): locate `yt-dlp` and report its version.

pub mod command;
pub mod extractor;
pub mod metadata;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use extractor::{ExtractOptions, Extractor, YtDlpExtractor, EMPTY_RESULT_MESSAGE};
pub use metadata::VideoMetadata;
pub use tools::ToolInfo;
