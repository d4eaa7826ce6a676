// Common data models for downloader

use serde::Deserialize;
use std::collections::HashMap;

/// Title used when a failure happens before the video could be resolved
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// A URL handed to the downloader. Not validated here; the extractor decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    Single(String),
    CollectionMember(String),
}

impl DownloadTarget {
    pub fn url(&self) -> &str {
        match self {
            Self::Single(url) | Self::CollectionMember(url) => url,
        }
    }
}

/// One encoded rendition of a video, as listed in yt-dlp's `formats` array
#[derive(Debug, Clone, Deserialize)]
pub struct StreamInfo {
    /// Format ID (e.g., "18", "22")
    #[serde(default)]
    pub format_id: String,
    /// Container subtype used as file extension (mp4, webm)
    #[serde(default = "default_ext")]
    pub ext: String,
    /// Video height in pixels
    pub height: Option<u32>,
    /// Video width in pixels
    pub width: Option<u32>,
    /// Video codec (avc1, vp9, none)
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    pub acodec: Option<String>,
    /// Total bitrate in kbps
    pub tbr: Option<f32>,
    /// Transfer protocol reported by the extractor (https, m3u8_native, ...)
    pub protocol: Option<String>,
    /// Direct byte source
    pub url: Option<String>,
    /// Request headers the source expects (User-Agent, Referer, ...)
    #[serde(default, rename = "http_headers")]
    pub headers: HashMap<String, String>,
}

fn default_ext() -> String {
    "mp4".to_string()
}

impl StreamInfo {
    pub fn has_video(&self) -> bool {
        self.vcodec
            .as_deref()
            .map_or(false, |v| v != "none" && !v.is_empty())
    }

    pub fn has_audio(&self) -> bool {
        self.acodec
            .as_deref()
            .map_or(false, |a| a != "none" && !a.is_empty())
    }

    /// Progressive stream: audio and video muxed in one file
    pub fn is_progressive(&self) -> bool {
        self.has_video() && self.has_audio()
    }

    /// Whether the byte source can be fetched with a single HTTP GET
    pub fn is_direct(&self) -> bool {
        let plain_http = self
            .protocol
            .as_deref()
            .map_or(true, |p| p == "https" || p == "http");
        plain_http && self.url.is_some()
    }
}

/// Video descriptor resolved by the extractor
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    pub streams: Vec<StreamInfo>,
}

/// Collection (playlist) descriptor
#[derive(Debug, Clone)]
pub struct PlaylistInfo {
    pub title: String,
    pub video_urls: Vec<String>,
}

/// Structured note of one item-level download failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub title: String,
    pub translated_title: String,
    pub link: String,
    pub error: String,
}

impl FailureRecord {
    pub fn new(
        title: impl Into<String>,
        translated_title: impl Into<String>,
        link: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            translated_title: translated_title.into(),
            link: link.into(),
            error: error.into(),
        }
    }

    /// Record for a URL whose failure carried no video details
    pub fn unknown(link: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(UNKNOWN_TITLE, "", link, error)
    }
}

/// What a single-item download ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// File written at this path
    Downloaded(std::path::PathBuf),
    /// Failed, and a failure record was already appended
    Recorded,
    /// Failed without a record; the caller must add a generic one
    Unrecorded(String),
}
