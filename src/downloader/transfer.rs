// HTTP stream fetcher

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::errors::DownloadError;
use super::models::StreamInfo;
use super::traits::StreamFetcher;
use crate::config::Settings;

/// Streams the response body straight into the destination file
pub struct HttpStreamFetcher {
    client: Client,
}

impl HttpStreamFetcher {
    pub fn new(settings: &Settings) -> Result<Self, DownloadError> {
        let mut builder =
            Client::builder().connect_timeout(Duration::from_secs(settings.timeout_seconds));

        if let Some(proxy_url) = settings.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                DownloadError::Network(format!("invalid proxy {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

/// Turn the stream's header list into a request header map.
/// Names or values reqwest rejects are skipped.
pub fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::debug!(header = %name, "skipping invalid stream header"),
        }
    }
    map
}

/// Map an HTTP status to the error class the downloader understands
pub fn classify_status(status: StatusCode, url: &str) -> Option<DownloadError> {
    if status.is_success() {
        return None;
    }

    match status {
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE => Some(
            DownloadError::Unavailable(format!("HTTP {} for {}", status.as_u16(), url)),
        ),
        _ => Some(DownloadError::Network(format!(
            "HTTP {} for {}",
            status.as_u16(),
            url
        ))),
    }
}

#[async_trait]
impl StreamFetcher for HttpStreamFetcher {
    async fn fetch(&self, stream: &StreamInfo, dest: &Path) -> Result<u64, DownloadError> {
        let url = stream.url.as_deref().ok_or_else(|| {
            DownloadError::NoStream(format!("format {} has no URL", stream.format_id))
        })?;

        let response = self
            .client
            .get(url)
            .headers(header_map(&stream.headers))
            .send()
            .await?;
        if let Some(err) = classify_status(response.status(), &stream.format_id) {
            return Err(err);
        }

        let mut file = File::create(dest).await?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        tracing::debug!(path = %dest.display(), bytes = written, "stream written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK, "18").is_none());
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "18"),
            Some(DownloadError::Unavailable(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::GONE, "18"),
            Some(DownloadError::Unavailable(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "18"),
            Some(DownloadError::Network(_))
        ));
    }

    #[test]
    fn test_header_map_carries_stream_headers() {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), "Mozilla/5.0".to_string());
        headers.insert("Referer".to_string(), "https://www.youtube.com/".to_string());
        headers.insert("Bad Name".to_string(), "x".to_string());
        headers.insert("X-Broken".to_string(), "line\nbreak".to_string());

        let map = header_map(&headers);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("user-agent").unwrap(), "Mozilla/5.0");
        assert_eq!(map.get("referer").unwrap(), "https://www.youtube.com/");
    }
}
