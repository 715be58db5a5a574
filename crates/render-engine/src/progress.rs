//! Encoder progress tracking.
//!
//! The encoder reports progress as free text. The only token consumed is
//! `frame=<N>` (any case, optional whitespace around `=`), e.g. the ffmpeg
//! stats line `frame=  150 fps= 48 q=28.0 size=     512kB time=00:00:06.00`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use regex::Regex;

fn frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)frame\s*=\s*([0-9]+)").expect("frame pattern is a valid regex")
    })
}

/// Extract the processed-frame count from one line of encoder output.
///
/// Returns `None` for blank lines, lines without the token, and captures
/// that do not fit in a `u64`. The value is not checked against the
/// expected total.
pub fn parse_frame_line(line: &str) -> Option<u64> {
    if line.trim().is_empty() {
        return None;
    }
    let captures = frame_pattern().captures(line)?;
    captures.get(1)?.as_str().parse::<u64>().ok()
}

/// Shared processed-frame counter.
///
/// Written by the output-line handler, read by the tick. Reports are stored
/// as they arrive: the last value wins, even if it is lower than the one
/// before it.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    frames: Arc<AtomicU64>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one output line; returns the parsed frame count if the line
    /// carried one.
    pub fn observe_line(&self, line: &str) -> Option<u64> {
        let frames = parse_frame_line(line)?;
        self.frames.store(frames, Ordering::Relaxed);
        Some(frames)
    }

    /// Most recently reported frame count.
    pub fn get(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

/// Progress snapshot pushed to the caller on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProgress {
    /// Frames the encoder has reported as processed.
    pub processed_frames: u64,

    /// Frames expected in total (probed from the source).
    pub total_frames: u64,

    /// Milliseconds since the encoder was launched.
    pub elapsed_ms: u64,

    /// Estimated time remaining, when one can be computed.
    pub eta: Option<crate::eta::Eta>,
}

impl RenderProgress {
    /// Completion ratio in `[0.0, 1.0]`, clamped for display.
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (self.processed_frames as f64 / self.total_frames as f64).clamp(0.0, 1.0)
    }

    /// Processed frames clamped to the total, for progress bars.
    pub fn display_frames(&self) -> u64 {
        if self.total_frames == 0 {
            self.processed_frames
        } else {
            self.processed_frames.min(self.total_frames)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parses_ffmpeg_stats_line() {
        let line = "frame=  150 fps= 48 q=28.0 size=     512kB time=00:00:06.00 bitrate= 699.1kbits/s speed=1.9x";
        assert_eq!(parse_frame_line(line), Some(150));
    }

    #[test]
    fn test_parses_progress_key_value_line() {
        assert_eq!(parse_frame_line("frame=42"), Some(42));
        assert_eq!(parse_frame_line("FRAME = 7"), Some(7));
        assert_eq!(parse_frame_line("Frame=\t9"), Some(9));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse_frame_line(""), None);
        assert_eq!(parse_frame_line("   \t "), None);
        assert_eq!(parse_frame_line("Input #0, matroska,webm, from 'in.mkv':"), None);
        assert_eq!(parse_frame_line("frame=N/A"), None);
        assert_eq!(parse_frame_line("frame=-3"), None);
    }

    #[test]
    fn test_overflowing_capture_is_dropped() {
        assert_eq!(parse_frame_line("frame=99999999999999999999999"), None);
    }

    #[test]
    fn test_value_above_total_passes_through() {
        assert_eq!(parse_frame_line("frame=100000"), Some(100_000));
    }

    #[test]
    fn test_counter_last_value_wins() {
        let counter = FrameCounter::new();
        assert_eq!(counter.observe_line("frame=50"), Some(50));
        assert_eq!(counter.observe_line("size=10kB"), None);
        assert_eq!(counter.get(), 50);
        counter.observe_line("frame=40");
        assert_eq!(counter.get(), 40);

        let reader = counter.clone();
        counter.observe_line("frame=60");
        assert_eq!(reader.get(), 60);
    }

    #[test]
    fn test_progress_fraction_clamps() {
        let progress = RenderProgress {
            processed_frames: 450,
            total_frames: 300,
            elapsed_ms: 1_000,
            eta: None,
        };
        assert_eq!(progress.fraction(), 1.0);
        assert_eq!(progress.display_frames(), 300);
    }

    proptest! {
        #[test]
        fn prop_recovers_embedded_frame(
            n in any::<u64>(),
            prefix in "[a-z0-9 :.,]{0,20}",
            suffix in "( [a-z0-9 :.,]{0,20})?",
            key in "(frame|FRAME|Frame|fRaMe)",
            before in "[ \t]{0,3}",
            after in "[ \t]{0,3}",
        ) {
            let line = format!("{prefix}{key}{before}={after}{n}{suffix}");
            prop_assert_eq!(parse_frame_line(&line), Some(n));
        }

        #[test]
        fn prop_lines_without_token_do_not_match(line in "[a-eg-z0-9 =:.,]{0,60}") {
            prop_assert_eq!(parse_frame_line(&line), None);
        }

        #[test]
        fn prop_non_numeric_capture_does_not_match(value in "[a-zA-Z/]{1,8}") {
            let line = format!("frame={value}");
            prop_assert_eq!(parse_frame_line(&line), None);
        }
    }
}
