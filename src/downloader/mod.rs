// Downloader module - routing, naming, concurrent fetch and failure bookkeeping

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod sanitize;
pub mod traits;
pub mod transfer;
pub mod translate;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::DownloadError;
pub use models::{DownloadTarget, FailureRecord, ItemOutcome, PlaylistInfo, StreamInfo, VideoInfo};
pub use orchestrator::{Downloader, Route, RunContext, RunSummary};
pub use traits::{InfoExtractor, StreamFetcher, Translator};
