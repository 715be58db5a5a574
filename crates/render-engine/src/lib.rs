//! burnsub Render Engine
//!
//! Drives an external encoder that burns a styled subtitle script into a
//! video, while tracking progress and supporting cancellation.
//!
//! # Data Flow
//!
//! ```text
//! RenderRequest ──► Preparing ──► scratch .ass file
//!                                      │
//!                                      ▼
//!                              EncoderProcess (ffmpeg)
//!                                      │ stdout/stderr lines
//!                                      ▼
//!                              FrameCounter (frame=<N>)
//!                                      │ every tick
//!                                      ▼
//!                              ETA estimate ──► ProgressObserver
//!                                      │
//!                               process exit
//!                                      ▼
//!                     cleanup ──► RenderOutcome
//! ```

pub mod command;
pub mod controller;
pub mod eta;
pub mod orchestrator;
pub mod probe;
pub mod progress;
pub mod request;

pub use command::{EncoderCommand, EncoderInvocation, FfmpegCommand};
pub use controller::{EncoderProcess, LineHandler, ProcessExit};
pub use eta::{estimate_remaining, Eta, EtaDisplay};
pub use orchestrator::*;
pub use probe::{probe_video, VideoInfo};
pub use progress::{parse_frame_line, FrameCounter, RenderProgress};
pub use request::{even_dimension, RenderRequest};
