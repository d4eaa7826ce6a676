// In-memory collaborators for tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use super::errors::DownloadError;
use super::models::{PlaylistInfo, StreamInfo, VideoInfo};
use super::traits::{InfoExtractor, StreamFetcher, Translator};

/// Video descriptor with a single progressive stream
pub fn video(title: &str, author: &str, ext: &str) -> VideoInfo {
    let id = title.replace(' ', "-");
    VideoInfo {
        id: id.clone(),
        title: title.to_string(),
        author: author.to_string(),
        streams: vec![StreamInfo {
            format_id: "18".to_string(),
            ext: ext.to_string(),
            height: Some(360),
            width: Some(640),
            vcodec: Some("avc1.42001E".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            tbr: Some(600.0),
            protocol: Some("https".to_string()),
            url: Some(format!("https://cdn.test/{}", id)),
            headers: HashMap::new(),
        }],
    }
}

#[derive(Default)]
pub struct MockExtractor {
    videos: HashMap<String, Result<VideoInfo, DownloadError>>,
    playlists: HashMap<String, Result<PlaylistInfo, DownloadError>>,
    panics: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    playlist_calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, url: &str, info: VideoInfo) -> Self {
        self.videos.insert(url.to_string(), Ok(info));
        self
    }

    pub fn with_video_error(mut self, url: &str, err: DownloadError) -> Self {
        self.videos.insert(url.to_string(), Err(err));
        self
    }

    pub fn with_playlist(mut self, url: &str, title: &str, members: &[&str]) -> Self {
        let info = PlaylistInfo {
            title: title.to_string(),
            video_urls: members.iter().map(|m| m.to_string()).collect(),
        };
        self.playlists.insert(url.to_string(), Ok(info));
        self
    }

    pub fn with_playlist_error(mut self, url: &str, err: DownloadError) -> Self {
        self.playlists.insert(url.to_string(), Err(err));
        self
    }

    pub fn panicking_for(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    /// Every `extract` call waits for a permit from this semaphore
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn playlist_calls(&self) -> usize {
        self.playlist_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InfoExtractor for MockExtractor {
    async fn extract(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.panics.contains(url) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            panic!("extractor blew up on {}", url);
        }

        let result = self
            .videos
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(DownloadError::UnrecognizedUrl(url.to_string())));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn extract_playlist(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        self.playlists
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(DownloadError::UnrecognizedUrl(url.to_string())))
    }
}

/// Writes fixed bytes, or fails once for selected stream URLs
#[derive(Default)]
pub struct MockFetcher {
    fail_once: Mutex<HashMap<String, DownloadError>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub const BYTES: &'static [u8] = b"not really a video";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_once_for(self, stream_url: &str, err: DownloadError) -> Self {
        if let Ok(mut once) = self.fail_once.lock() {
            once.insert(stream_url.to_string(), err);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamFetcher for MockFetcher {
    async fn fetch(&self, stream: &StreamInfo, dest: &Path) -> Result<u64, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = stream.url.clone().unwrap_or_default();

        let once = self.fail_once.lock().ok().and_then(|mut m| m.remove(&url));
        if let Some(err) = once {
            return Err(err);
        }

        tokio::fs::write(dest, Self::BYTES).await?;
        Ok(Self::BYTES.len() as u64)
    }
}

/// Echoes its input unless a canned answer exists; counts calls
#[derive(Default)]
pub struct CountingTranslator {
    answers: HashMap<String, String>,
    /// Calls that succeed before the service starts failing
    succeed_first: Option<usize>,
    calls: AtomicUsize,
}

impl CountingTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self::new().failing_after(0)
    }

    pub fn failing_after(mut self, successes: usize) -> Self {
        self.succeed_first = Some(successes);
        self
    }

    pub fn with(mut self, text: &str, translated: &str) -> Self {
        self.answers.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for CountingTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> Result<String, DownloadError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed_first.map_or(false, |n| previous >= n) {
            return Err(DownloadError::Translation("service down".to_string()));
        }
        Ok(self
            .answers
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}
