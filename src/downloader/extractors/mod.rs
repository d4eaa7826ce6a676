// Extractor implementations
//
// Only the yt-dlp binary is supported. Tests substitute their own
// `InfoExtractor` through the orchestrator.

mod cli;

pub use cli::CliInfoExtractor;
