// Orchestrator: URL routing, single-item download, bounded batch runner

use futures_util::FutureExt;
use lazy_static::lazy_static;
use regex::Regex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::errors::DownloadError;
use super::extractors::CliInfoExtractor;
use super::format_selector::FormatSelector;
use super::models::{
    DownloadTarget, FailureRecord, ItemOutcome, PlaylistInfo, VideoInfo, UNKNOWN_TITLE,
};
use super::report::{self, FailureSink};
use super::sanitize::{filter_chars, normalize_separators, sanitize_filename, translate_to_english};
use super::traits::{InfoExtractor, StreamFetcher, Translator};
use super::transfer::HttpStreamFetcher;
use super::translate::GoogleTranslator;
use crate::config::Settings;

lazy_static! {
    static ref PLAYLIST_MARKER: Regex = Regex::new(r"(?:^|[?&#])list=[\w-]+").unwrap();
}

/// How an input URL will be handled
#[derive(Debug, Clone)]
pub enum Route {
    Single,
    Collection(PlaylistInfo),
}

/// Per-run state threaded through routing, the batch runner and the reporter
#[derive(Clone)]
pub struct RunContext {
    pub folder: PathBuf,
    pub failures: FailureSink,
}

impl RunContext {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        Self {
            failures: FailureSink::new(folder.clone()),
            folder,
        }
    }
}

/// Result of a whole run
#[derive(Debug)]
pub struct RunSummary {
    pub folder: PathBuf,
    pub failures: Vec<FailureRecord>,
    /// Summary file, when any failure was recorded
    pub report: Option<PathBuf>,
}

type TaskResult = std::thread::Result<Result<ItemOutcome, DownloadError>>;

/// Ties the extractor, fetcher and translator together.
/// Cheap to clone; batch workers each hold a clone.
#[derive(Clone)]
pub struct Downloader {
    extractor: Arc<dyn InfoExtractor>,
    fetcher: Arc<dyn StreamFetcher>,
    translator: Arc<dyn Translator>,
    settings: Settings,
}

impl Downloader {
    pub fn new(
        extractor: Arc<dyn InfoExtractor>,
        fetcher: Arc<dyn StreamFetcher>,
        translator: Arc<dyn Translator>,
        settings: Settings,
    ) -> Self {
        Self {
            extractor,
            fetcher,
            translator,
            settings,
        }
    }

    /// yt-dlp extraction, HTTP transfer, Google translation
    pub fn from_settings(settings: Settings) -> Result<Self, DownloadError> {
        Ok(Self::new(
            Arc::new(CliInfoExtractor::new(&settings)),
            Arc::new(HttpStreamFetcher::new(&settings)?),
            Arc::new(GoogleTranslator::new(&settings)?),
            settings,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_playlist_url(url: &str) -> bool {
        PLAYLIST_MARKER.is_match(url)
    }

    /// Playlist URLs that resolve become collections; everything else,
    /// including playlists that fail to resolve, is a single video.
    pub async fn classify(&self, url: &str) -> Route {
        if !Self::is_playlist_url(url) {
            return Route::Single;
        }

        match self.extractor.extract_playlist(url).await {
            Ok(playlist) => {
                tracing::info!(
                    title = %playlist.title,
                    videos = playlist.video_urls.len(),
                    "resolved playlist"
                );
                Route::Collection(playlist)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "playlist resolution failed, treating as single video");
                Route::Single
            }
        }
    }

    pub async fn sanitize(&self, title: &str) -> Result<String, DownloadError> {
        sanitize_filename(title, self.translator.as_ref(), &self.settings.target_language).await
    }

    /// Download one video into the context folder.
    ///
    /// `Unavailable`/`UnrecognizedUrl` are handled here: a degraded retry is
    /// attempted when the descriptor is known, a record is appended and
    /// `Recorded` is returned. Any other error is returned to the caller.
    pub async fn download_one(
        &self,
        target: &DownloadTarget,
        ctx: &RunContext,
    ) -> Result<ItemOutcome, DownloadError> {
        let url = target.url();

        let info = match self.extractor.extract(url).await {
            Ok(info) => info,
            Err(e) if e.is_recoverable() => return self.record_failure(url, None, &e, ctx).await,
            Err(e) => return Err(e),
        };

        match self.fetch_named(&info, ctx).await {
            Ok(Some(path)) => Ok(ItemOutcome::Downloaded(path)),
            Ok(None) => Ok(ItemOutcome::Unrecorded(
                DownloadError::NoStream(info.id.clone()).to_string(),
            )),
            Err(e) if e.is_recoverable() => self.record_failure(url, Some(&info), &e, ctx).await,
            Err(e) => Err(e),
        }
    }

    /// `"{title} - {author}.{ext}"` in the context folder. `None` when no stream fits.
    async fn fetch_named(
        &self,
        info: &VideoInfo,
        ctx: &RunContext,
    ) -> Result<Option<PathBuf>, DownloadError> {
        let name = self.sanitize(&info.title).await?;
        let author = self.sanitize(&info.author).await?;

        let Some(stream) = FormatSelector::highest_resolution(&info.streams) else {
            tracing::warn!(id = %info.id, "no downloadable stream");
            return Ok(None);
        };

        let filename = format!("{} - {}.{}", name, author, stream.ext);
        tokio::fs::create_dir_all(&ctx.folder).await?;
        let path = ctx.folder.join(&filename);

        self.fetcher.fetch(stream, &path).await?;
        println!("{}", filename);
        Ok(Some(path))
    }

    async fn record_failure(
        &self,
        url: &str,
        info: Option<&VideoInfo>,
        err: &DownloadError,
        ctx: &RunContext,
    ) -> Result<ItemOutcome, DownloadError> {
        tracing::warn!(url, error = %err, "download failed");

        let record = match info {
            None => FailureRecord::new(UNKNOWN_TITLE, "", url, err.to_string()),
            Some(info) => {
                let translated = self.translated_title(&info.title).await;
                self.degraded_retry(info, &translated, ctx).await;
                FailureRecord::new(info.title.clone(), translated, url, err.to_string())
            }
        };

        ctx.failures.record(record).await;
        Ok(ItemOutcome::Recorded)
    }

    /// Translation for the failure record; empty when the service fails
    async fn translated_title(&self, title: &str) -> String {
        let target = &self.settings.target_language;
        match translate_to_english(title, self.translator.as_ref(), target).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(title, error = %e, "could not translate title for failure record");
                String::new()
            }
        }
    }

    /// One more attempt named after the title alone. Best effort.
    async fn degraded_retry(&self, info: &VideoInfo, translated: &str, ctx: &RunContext) {
        let Some(stream) = FormatSelector::highest_resolution(&info.streams) else {
            return;
        };

        let base = if translated.is_empty() {
            info.title.as_str()
        } else {
            translated
        };
        let filename = format!("{}.{}", filter_chars(&normalize_separators(base)), stream.ext);
        let path = ctx.folder.join(&filename);

        let attempt = match tokio::fs::create_dir_all(&ctx.folder).await {
            Ok(()) => self.fetcher.fetch(stream, &path).await,
            Err(e) => Err(e.into()),
        };

        match attempt {
            Ok(bytes) => tracing::info!(file = %filename, bytes, "degraded retry succeeded"),
            Err(e) => tracing::debug!(file = %filename, error = %e, "degraded retry failed"),
        }
    }

    /// Run `download_one` over `urls` with at most `settings.workers` in flight.
    /// Unexpected errors and panics stay inside their task and become generic
    /// records. Returned records are in completion order.
    pub async fn run_all(&self, urls: Vec<String>, ctx: &RunContext) -> Vec<FailureRecord> {
        let semaphore = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let mut tasks = JoinSet::new();

        for url in urls {
            let this = self.clone();
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let err = DownloadError::Unknown("worker pool closed".to_string());
                        return (url, Ok(Err(err)));
                    }
                };

                let target = DownloadTarget::CollectionMember(url.clone());
                let result = AssertUnwindSafe(this.download_one(&target, &ctx))
                    .catch_unwind()
                    .await;
                (url, result)
            });
        }

        let mut downloaded = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, result)) => {
                    if self.settle(&url, result, ctx).await {
                        downloaded += 1;
                    }
                }
                Err(e) => tracing::error!(error = %e, "download task could not be joined"),
            }
        }

        tracing::info!(downloaded, folder = %ctx.folder.display(), "batch finished");
        ctx.failures.records().await
    }

    /// Map one task's result onto the failure sink. Returns true on success.
    async fn settle(&self, url: &str, result: TaskResult, ctx: &RunContext) -> bool {
        let reason = match result {
            Ok(Ok(ItemOutcome::Downloaded(path))) => {
                tracing::debug!(url, path = %path.display(), "downloaded");
                return true;
            }
            Ok(Ok(ItemOutcome::Recorded)) => return false,
            Ok(Ok(ItemOutcome::Unrecorded(reason))) => reason,
            Ok(Err(e)) => {
                println!("Download for {} generated an exception: {}", url, e);
                tracing::error!(url, error = %e, "unexpected download error");
                e.to_string()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                println!("Download for {} generated an exception: {}", url, message);
                tracing::error!(url, %message, "download task panicked");
                message
            }
        };

        ctx.failures.record(FailureRecord::unknown(url, reason)).await;
        false
    }

    /// Sanitized playlist title. Falls back to the untranslated title when
    /// translation fails so the batch still runs.
    async fn folder_name(&self, title: &str) -> String {
        match self.sanitize(title).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(title, error = %e, "could not translate playlist title");
                filter_chars(&normalize_separators(title))
            }
        }
    }

    /// Route, download, then write the failure summary
    pub async fn run(&self, url: &str) -> Result<RunSummary, DownloadError> {
        let ctx = match self.classify(url).await {
            Route::Single => {
                let folder = self.settings.output_root.join(&self.settings.default_folder);
                let ctx = RunContext::new(folder);
                let target = DownloadTarget::Single(url.to_string());
                let result = AssertUnwindSafe(self.download_one(&target, &ctx))
                    .catch_unwind()
                    .await;
                self.settle(url, result, &ctx).await;
                ctx
            }
            Route::Collection(playlist) => {
                let folder_name = self.folder_name(&playlist.title).await;
                let ctx = RunContext::new(self.settings.output_root.join(folder_name));
                self.run_all(playlist.video_urls, &ctx).await;
                ctx
            }
        };

        let failures = ctx.failures.records().await;
        let report = report::persist(&failures, &ctx.folder).await?;

        Ok(RunSummary {
            folder: ctx.folder,
            failures,
            report,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
