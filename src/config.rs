//! Run settings: defaults plus optional environment overrides.

use std::path::PathBuf;
use std::process::Command;

/// Default worker-pool size for playlist downloads
pub const DEFAULT_WORKERS: usize = 6;

/// Folder used for single-video downloads
pub const DEFAULT_FOLDER: &str = "Favourites";

/// Name of both the running failure log and the final summary
pub const FAILURE_LOG_NAME: &str = "failed_downloads.txt";

const ENV_WORKERS: &str = "PLAYLIST_DL_WORKERS";
const ENV_OUTPUT: &str = "PLAYLIST_DL_OUTPUT";
const ENV_YTDLP: &str = "PLAYLIST_DL_YTDLP";
const ENV_PROXY: &str = "PLAYLIST_DL_PROXY";
const ENV_TIMEOUT: &str = "PLAYLIST_DL_TIMEOUT";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Concurrent downloads for a playlist
    pub workers: usize,
    /// Directory the destination folder is created in
    pub output_root: PathBuf,
    /// Destination folder name for single videos
    pub default_folder: String,
    /// Language titles are translated into
    pub target_language: String,
    /// yt-dlp binary
    pub ytdlp_path: String,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Socket and process timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_root: PathBuf::from("."),
            default_folder: DEFAULT_FOLDER.to_string(),
            target_language: "en".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            proxy: None,
            timeout_seconds: 30,
        }
    }
}

impl Settings {
    /// Defaults, with the yt-dlp binary located and env overrides applied
    pub fn from_env() -> Self {
        let mut settings = Self {
            ytdlp_path: find_ytdlp(),
            ..Self::default()
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_WORKERS) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_WORKERS),
            }
        }

        if let Some(raw) = lookup(ENV_OUTPUT) {
            if !raw.trim().is_empty() {
                self.output_root = PathBuf::from(raw.trim());
            }
        }

        if let Some(raw) = lookup(ENV_YTDLP) {
            if !raw.trim().is_empty() {
                self.ytdlp_path = raw.trim().to_string();
            }
        }

        if let Some(raw) = lookup(ENV_PROXY) {
            let raw = raw.trim();
            self.proxy = (!raw.is_empty()).then(|| raw.to_string());
        }

        if let Some(raw) = lookup(ENV_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(n) if n > 0 => self.timeout_seconds = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_TIMEOUT),
            }
        }
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }
}

/// Find yt-dlp binary
fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = Command::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return path;
            }
        }
    }

    "yt-dlp".to_string()
}
