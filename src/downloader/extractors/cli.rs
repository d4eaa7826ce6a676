// CLI InfoExtractor - uses native `yt-dlp` binary
//
// Single videos are resolved with `--dump-json --no-playlist`, playlists with
// `--flat-playlist --dump-single-json` so member pages are not fetched up front.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Settings;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{PlaylistInfo, StreamInfo, VideoInfo};
use crate::downloader::traits::InfoExtractor;
use crate::downloader::utils::{network_args, run_output_with_timeout};

/// Child process budget as a multiple of the socket timeout
const PROCESS_TIMEOUT_FACTOR: u64 = 4;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
    settings: Settings,
}

impl CliInfoExtractor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ytdlp_path: settings.ytdlp_path.clone(),
            settings: settings.clone(),
        }
    }

    fn build_video_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];
        args.extend(network_args(&self.settings));
        args.push(url.to_string());
        args
    }

    fn build_playlist_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(network_args(&self.settings));
        args.push(url.to_string());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>, DownloadError> {
        tracing::debug!("{} {}", self.ytdlp_path, args.join(" "));

        let budget = self.settings.timeout_seconds * PROCESS_TIMEOUT_FACTOR;
        let out = run_output_with_timeout(&self.ytdlp_path, &args, budget).await?;

        if out.status.success() {
            Ok(out.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            tracing::debug!(%stderr, "yt-dlp failed");
            Err(DownloadError::from(stderr))
        }
    }

    /// Parse `--dump-json` output into a video descriptor
    pub fn parse_video_json(stdout: &[u8]) -> Result<VideoInfo, DownloadError> {
        let raw: RawVideo = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let streams = raw
            .formats
            .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

        Ok(VideoInfo {
            id: raw.id.unwrap_or_else(|| "unknown".to_string()),
            title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
            author: raw
                .channel
                .or(raw.uploader)
                .unwrap_or_else(|| "Unknown".to_string()),
            streams,
        })
    }

    /// Parse `--flat-playlist --dump-single-json` output
    pub fn parse_playlist_json(stdout: &[u8]) -> Result<PlaylistInfo, DownloadError> {
        let raw: RawPlaylist = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let entries = raw
            .entries
            .ok_or_else(|| DownloadError::ParseError("No entries array in JSON".to_string()))?;

        let video_urls = entries
            .into_iter()
            .filter_map(|entry| match entry.url {
                Some(url) if url.starts_with("http") => Some(url),
                _ => entry
                    .id
                    .filter(|id| !id.is_empty())
                    .map(|id| format!("{}{}", WATCH_URL_PREFIX, id)),
            })
            .collect();

        Ok(PlaylistInfo {
            title: raw.title.unwrap_or_else(|| "Playlist".to_string()),
            video_urls,
        })
    }
}

/// The parts of yt-dlp's per-video JSON the downloader reads
#[derive(Debug, Deserialize)]
struct RawVideo {
    id: Option<String>,
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    formats: Option<Vec<StreamInfo>>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    title: Option<String>,
    entries: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    url: Option<String>,
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    async fn extract(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let stdout = self.run(self.build_video_args(url)).await?;
        Self::parse_video_json(&stdout)
    }

    async fn extract_playlist(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        let stdout = self.run(self.build_playlist_args(url)).await?;
        Self::parse_playlist_json(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_json() {
        let json = br#"{
            "id": "abc",
            "title": "Hello World",
            "uploader": "Chan Uploads",
            "channel": "Chan",
            "formats": [
                {"format_id": "18", "ext": "mp4", "height": 360, "width": 640,
                 "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "tbr": 600.5,
                 "protocol": "https", "url": "https://cdn.example.com/18",
                 "http_headers": {"User-Agent": "Mozilla/5.0", "Accept-Language": "en-us"}},
                {"format_id": "140", "ext": "m4a", "vcodec": "none",
                 "acodec": "mp4a.40.2", "protocol": "https"}
            ]
        }"#;

        let info = CliInfoExtractor::parse_video_json(json).unwrap();
        assert_eq!(info.id, "abc");
        assert_eq!(info.title, "Hello World");
        assert_eq!(info.author, "Chan");
        assert_eq!(info.streams.len(), 2);
        assert_eq!(info.streams[0].height, Some(360));
        assert!(info.streams[0].is_progressive());
        assert_eq!(
            info.streams[0].headers.get("User-Agent").map(String::as_str),
            Some("Mozilla/5.0")
        );
        assert!(info.streams[1].url.is_none());
        assert!(info.streams[1].headers.is_empty());
        assert_eq!(info.streams[1].height, None);
    }

    #[test]
    fn test_parse_video_json_uses_uploader_without_channel() {
        let json = br#"{"id": "x", "title": "T", "uploader": "Up", "formats": []}"#;
        let info = CliInfoExtractor::parse_video_json(json).unwrap();
        assert_eq!(info.author, "Up");
    }

    #[test]
    fn test_parse_video_json_rejects_garbage() {
        let err = CliInfoExtractor::parse_video_json(b"not json").unwrap_err();
        assert!(matches!(err, DownloadError::ParseError(_)));

        let err = CliInfoExtractor::parse_video_json(br#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, DownloadError::ParseError(_)));
    }

    #[test]
    fn test_parse_playlist_json() {
        let json = br#"{
            "title": "My Mix",
            "entries": [
                {"id": "a1", "url": "https://www.youtube.com/watch?v=a1"},
                {"id": "b2", "url": "b2"},
                {"id": "", "url": null},
                {"id": "c3"}
            ]
        }"#;

        let playlist = CliInfoExtractor::parse_playlist_json(json).unwrap();
        assert_eq!(playlist.title, "My Mix");
        assert_eq!(
            playlist.video_urls,
            vec![
                "https://www.youtube.com/watch?v=a1",
                "https://www.youtube.com/watch?v=b2",
                "https://www.youtube.com/watch?v=c3",
            ]
        );
    }

    #[test]
    fn test_playlist_args_include_network_settings() {
        let mut settings = Settings::default();
        settings.proxy = Some("socks5://127.0.0.1:1080".to_string());
        let extractor = CliInfoExtractor::new(&settings);

        let args = extractor.build_playlist_args("https://example.com/playlist?list=xyz");
        assert_eq!(args[0], "--flat-playlist");
        assert!(args.contains(&"--proxy".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/playlist?list=xyz");
    }
}
