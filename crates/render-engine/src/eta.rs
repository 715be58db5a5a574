//! Remaining-time estimation.
//!
//! The estimate is recomputed from cumulative totals on every tick:
//! average milliseconds per frame so far, times the expected frame count,
//! minus the time already spent. There is no smoothing, so a burst or a
//! stall in frame reports shows up as jitter for one tick and corrects
//! itself on the next.

use std::fmt;

/// Estimated time remaining for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Eta {
    /// Remaining wall-clock time in milliseconds, never negative.
    pub remaining_ms: u64,
}

/// How an [`Eta`] is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaDisplay {
    /// Under a minute: whole seconds, rounded to nearest.
    Seconds(u64),
    /// A minute or more: hours are folded into minutes.
    MinutesAndSeconds { minutes: u64, seconds: u64 },
}

impl Eta {
    pub fn remaining_secs(&self) -> f64 {
        self.remaining_ms as f64 / 1000.0
    }

    pub fn display_form(&self) -> EtaDisplay {
        let total_secs = self.remaining_secs();
        if total_secs < 60.0 {
            return EtaDisplay::Seconds(total_secs.round() as u64);
        }
        let whole_secs = self.remaining_ms / 1000;
        EtaDisplay::MinutesAndSeconds {
            minutes: whole_secs / 60,
            seconds: whole_secs % 60,
        }
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_form() {
            EtaDisplay::Seconds(secs) => write!(f, "{secs} seconds"),
            EtaDisplay::MinutesAndSeconds { minutes, seconds } => {
                write!(f, "{minutes} minutes and {seconds} seconds")
            }
        }
    }
}

/// Estimate the time remaining from elapsed time and processed frames.
///
/// Returns `None` when nothing has been processed yet or the total is
/// unknown; the caller should then show no estimate at all.
pub fn estimate_remaining(elapsed_ms: u64, processed_frames: u64, total_frames: u64) -> Option<Eta> {
    if processed_frames == 0 || total_frames == 0 {
        return None;
    }

    let ms_per_frame = elapsed_ms as f64 / processed_frames as f64;
    let estimated_total_ms = ms_per_frame * total_frames as f64;
    let remaining_ms = (estimated_total_ms - elapsed_ms as f64).max(0.0);

    Some(Eta {
        remaining_ms: remaining_ms.round() as u64,
    })
}
