// Error types for extraction, translation and transfer

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// Video is private, removed, region locked or otherwise not served
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// The extractor could not find a video id in the URL
    #[error("Unrecognized URL: {0}")]
    UnrecognizedUrl(String),

    /// Network timeout while talking to the platform
    #[error("Network timeout: the platform is not responding")]
    NetworkTimeout,

    /// HTTP failure during transfer or translation
    #[error("Network error: {0}")]
    Network(String),

    /// yt-dlp not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Translation service failed or returned nothing usable
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Descriptor resolved but offers no stream we can fetch
    #[error("No downloadable stream: {0}")]
    NoStream(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Unknown error with details
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DownloadError {
    /// Errors the single-item downloader handles itself (degraded retry + record).
    /// Everything else is left to the batch boundary.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::UnrecognizedUrl(_))
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::NetworkTimeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

// Classify raw yt-dlp stderr
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("video unavailable")
            || lower.contains("is not available")
            || lower.contains("private video")
            || lower.contains("has been removed")
            || lower.contains("account associated with this video has been terminated")
            || lower.contains("members-only")
            || lower.contains("http error 403")
            || lower.contains("http error 404")
            || lower.contains("http error 410")
        {
            return Self::Unavailable(s);
        }

        if lower.contains("is not a valid url")
            || lower.contains("unsupported url")
            || lower.contains("incomplete youtube id")
            || lower.contains("invalid url")
        {
            return Self::UnrecognizedUrl(s);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("json") {
            return Self::ParseError(s);
        }

        Self::Unknown(s)
    }
}
