// FormatSelector - picks the stream to download
//
// Prefers progressive streams (audio + video in one file) that can be
// fetched with a plain HTTP GET, highest resolution first. Falls back to
// the best direct video stream when no progressive one is offered.

use super::models::StreamInfo;

pub struct FormatSelector;

impl FormatSelector {
    /// Highest-resolution downloadable stream, if any
    pub fn highest_resolution(streams: &[StreamInfo]) -> Option<&StreamInfo> {
        let direct: Vec<&StreamInfo> = streams.iter().filter(|s| s.is_direct()).collect();

        let progressive = direct
            .iter()
            .filter(|s| s.is_progressive())
            .max_by(|a, b| Self::rank(a).cmp(&Self::rank(b)))
            .copied();

        if let Some(best) = progressive {
            return Some(best);
        }

        direct
            .iter()
            .filter(|s| s.has_video())
            .max_by(|a, b| Self::rank(a).cmp(&Self::rank(b)))
            .copied()
    }

    /// Sort key: height, then bitrate
    fn rank(stream: &StreamInfo) -> (u32, u32) {
        let height = stream.height.unwrap_or(0);
        let bitrate = stream.tbr.map(|t| (t * 100.0) as u32).unwrap_or(0);
        (height, bitrate)
    }
}
