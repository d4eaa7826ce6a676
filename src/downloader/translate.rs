// Google web translator

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::errors::DownloadError;
use super::traits::Translator;
use crate::config::Settings;

const TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translator backed by the public Google translate endpoint (source language auto-detected)
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(settings: &Settings) -> Result<Self, DownloadError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(settings.timeout_seconds));

        if let Some(proxy_url) = settings.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                DownloadError::Network(format!("invalid proxy {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: TRANSLATE_ENDPOINT.to_string(),
        })
    }

    /// Join the translated segments of a `translate_a/single` response
    pub fn parse_response(json: &serde_json::Value) -> Result<String, DownloadError> {
        let segments = json[0]
            .as_array()
            .ok_or_else(|| DownloadError::Translation("unexpected response shape".to_string()))?;

        let text: String = segments
            .iter()
            .filter_map(|segment| segment[0].as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(DownloadError::Translation("empty translation".to_string()));
        }

        Ok(text)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| DownloadError::Translation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::Translation(format!(
                "translate service returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DownloadError::Translation(format!("invalid response: {}", e)))?;

        let translated = Self::parse_response(&json)?;
        tracing::debug!(original = text, %translated, "title translated");
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_joins_segments() {
        let body = json!([
            [["Japanese ", "日本語 ", null, null, 10], ["Video", "Video", null, null, 10]],
            null,
            "ja"
        ]);
        assert_eq!(GoogleTranslator::parse_response(&body).unwrap(), "Japanese Video");
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        let err = GoogleTranslator::parse_response(&json!({"error": "quota"})).unwrap_err();
        assert!(matches!(err, DownloadError::Translation(_)));

        let err = GoogleTranslator::parse_response(&json!([[]])).unwrap_err();
        assert!(matches!(err, DownloadError::Translation(_)));
    }
}
