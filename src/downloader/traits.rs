// Collaborator traits: extraction, stream transfer, translation

use async_trait::async_trait;
use std::path::Path;

use super::errors::DownloadError;
use super::models::{PlaylistInfo, StreamInfo, VideoInfo};

/// Resolves URLs into video and playlist descriptors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Resolve a single video with its stream list.
    /// Fails with `Unavailable` or `UnrecognizedUrl` for dead or malformed links.
    async fn extract(&self, url: &str) -> Result<VideoInfo, DownloadError>;

    /// Resolve a playlist into its title and ordered member URLs
    async fn extract_playlist(&self, url: &str) -> Result<PlaylistInfo, DownloadError>;
}

/// Moves the bytes of one stream into a file
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// Returns the number of bytes written
    async fn fetch(&self, stream: &StreamInfo, dest: &Path) -> Result<u64, DownloadError>;
}

/// Text translation service
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, DownloadError>;
}
