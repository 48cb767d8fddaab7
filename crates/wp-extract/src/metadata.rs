//! yt-dlp JSON output and its reduction to a single [`VideoMetadata`].
//!
//! `--dump-single-json` prints either one info record, a collection record
//! (`_type` of `playlist` or `multi_video`) whose `entries` hold the
//! individual records, or the literal `null`.

use serde::{Deserialize, Serialize};
use wp_core::{Error, Result};

/// The fields ingestion cares about, taken from one info record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Host-specific video id (e.g. the YouTube `v=` value).
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    title: Option<String>,
    thumbnail: Option<String>,
    entries: Option<Vec<Option<RawInfo>>>,
}

/// Accept ids given as strings or numbers.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl RawInfo {
    fn is_collection(&self) -> bool {
        self.entries.is_some()
            || matches!(self.kind.as_deref(), Some("playlist" | "multi_video"))
    }

    /// Resolve to the effective single record: the record itself, or the
    /// first element of a collection. `None` means an empty result.
    fn into_effective(self) -> Option<VideoMetadata> {
        if self.is_collection() {
            return self
                .entries
                .and_then(|entries| entries.into_iter().next())
                .flatten()
                .and_then(RawInfo::into_effective);
        }

        Some(VideoMetadata {
            id: self.id,
            title: self.title,
            thumbnail: self.thumbnail,
        })
    }
}

/// Parse yt-dlp's stdout.
///
/// Returns `Ok(None)` for an empty result (blank output, `null`, an empty
/// collection, or a collection whose first element is `null`).
///
/// # Errors
///
/// [`Error::ExtractionFailed`] when the output is not valid JSON of the
/// expected shape.
pub fn parse_info_json(stdout: &str) -> Result<Option<VideoMetadata>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let raw: Option<RawInfo> = serde_json::from_str(trimmed)
        .map_err(|e| Error::ExtractionFailed(format!("Could not parse extractor output: {e}")))?;

    Ok(raw.and_then(RawInfo::into_effective))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_record() {
        let meta = parse_info_json(
            r#"{"id": "dQw4w9WgXcQ", "title": "Never Gonna", "thumbnail": "https://i.ytimg.com/x.jpg", "duration": 212}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(meta.id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(meta.title.as_deref(), Some("Never Gonna"));
        assert_eq!(meta.thumbnail.as_deref(), Some("https://i.ytimg.com/x.jpg"));
    }

    #[test]
    fn null_and_blank_are_empty() {
        assert_eq!(parse_info_json("null").unwrap(), None);
        assert_eq!(parse_info_json("  \n").unwrap(), None);
    }

    #[test]
    fn collection_uses_first_entry() {
        let meta = parse_info_json(
            r#"{"_type": "playlist", "id": "PL1", "title": "The List",
                "entries": [{"id": "A", "title": "First"}, {"id": "B", "title": "Second"}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(meta.id.as_deref(), Some("A"));
        assert_eq!(meta.title.as_deref(), Some("First"));
        assert_eq!(meta.thumbnail, None);
    }

    #[test]
    fn empty_collection_is_empty() {
        let out = parse_info_json(r#"{"_type": "playlist", "entries": []}"#).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn null_first_entry_is_empty() {
        let out =
            parse_info_json(r#"{"_type": "playlist", "entries": [null, {"id": "B"}]}"#).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn playlist_without_entries_is_empty() {
        let out = parse_info_json(r#"{"_type": "playlist", "title": "Nothing"}"#).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn numeric_id_is_stringified() {
        let meta = parse_info_json(r#"{"id": 12345, "title": "Vimeo clip"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(meta.id.as_deref(), Some("12345"));
    }

    #[test]
    fn garbage_is_extraction_failure() {
        let err = parse_info_json("WARNING: not json").unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }
}
