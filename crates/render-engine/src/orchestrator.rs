//! End-to-end render orchestration.
//!
//! ```text
//! Idle → Preparing → Running ┬→ Finalizing → Completed
//!                            ├→ Cancelling → Cancelled
//!                            └→ Failed
//! ```
//!
//! Every invocation resolves into exactly one [`RenderOutcome`]; errors never
//! escape [`RenderOrchestrator::render`]. The scratch subtitle file is a
//! [`tempfile::TempPath`], so it is removed on every exit path, including
//! early returns from the preparation phase.

use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempPath;

use burnsub_common::clock::{RenderClock, TickTimer};
use burnsub_common::config::RenderDefaults;
use burnsub_common::error::{BurnsubError, BurnsubResult, FailureKind};
use burnsub_subtitle_model::rtl;

use crate::command::{EncoderCommand, EncoderInvocation};
use crate::controller::{EncoderProcess, LineHandler, ProcessExit};
use crate::eta::estimate_remaining;
use crate::progress::{FrameCounter, RenderProgress};
use crate::request::RenderRequest;

/// Style whose font size a request may override.
pub const DEFAULT_STYLE_NAME: &str = "Default";

/// Output lines kept for failure messages.
const OUTPUT_TAIL_LINES: usize = 20;

/// Cooperative cancellation signal shared between the caller and a render.
///
/// Observed once per poll interval; the render then kills the encoder.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    flag: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Render loop tuning.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Sleep between liveness/cancellation checks.
    pub poll_interval: Duration,

    /// Interval between progress presentations.
    pub tick_interval: Duration,

    /// Kill the encoder and fail once this much time has passed.
    pub deadline: Option<Duration>,

    /// Apply the right-to-left transform to scripts that look right-to-left.
    pub right_to_left_mode: bool,

    /// Delete what the encoder wrote when the render is cancelled.
    pub remove_partial_output_on_cancel: bool,

    /// Where the scratch subtitle is written. System temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

impl From<&RenderDefaults> for RenderOptions {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults.poll_interval_ms.max(1)),
            tick_interval: Duration::from_millis(defaults.tick_interval_ms.max(1)),
            deadline: defaults.deadline_secs.map(Duration::from_secs),
            right_to_left_mode: defaults.right_to_left_mode,
            remove_partial_output_on_cancel: defaults.remove_partial_output_on_cancel,
            temp_dir: None,
        }
    }
}

/// Lifecycle stage of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Idle,
    Preparing,
    Running,
    Finalizing,
    Cancelling,
    Completed,
    Cancelled,
    Failed,
}

/// Why a render failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<BurnsubError> for RenderFailure {
    fn from(err: BurnsubError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Terminal result of one render invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The encoder finished and the output file exists.
    Completed(PathBuf),
    /// The caller cancelled. Any output file is not a valid result.
    Cancelled,
    Failed(RenderFailure),
}

impl RenderOutcome {
    fn stage(&self) -> RenderStage {
        match self {
            Self::Completed(_) => RenderStage::Completed,
            Self::Cancelled => RenderStage::Cancelled,
            Self::Failed(_) => RenderStage::Failed,
        }
    }
}

impl fmt::Display for RenderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(path) => write!(f, "completed: {}", path.display()),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed(failure) => write!(f, "failed: {failure}"),
        }
    }
}

/// Receives progress while the encoder runs.
///
/// `on_progress` is called on the orchestrating thread once per tick, only
/// while the encoder is alive. `on_cleared` is called once after it exits so
/// the presenter can remove its progress text.
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: &RenderProgress);

    fn on_cleared(&mut self) {}
}

impl<F> ProgressObserver for F
where
    F: FnMut(&RenderProgress),
{
    fn on_progress(&mut self, progress: &RenderProgress) {
        self(progress)
    }
}

/// Inputs ready for the encoder.
struct PreparedRender {
    subtitle_file: TempPath,
    invocation: EncoderInvocation,
}

/// Drives one encoder run from preparation to cleanup.
pub struct RenderOrchestrator {
    command: Box<dyn EncoderCommand>,
    options: RenderOptions,
    stage: RenderStage,
}

impl RenderOrchestrator {
    pub fn new(command: impl EncoderCommand + 'static, options: RenderOptions) -> Self {
        Self {
            command: Box::new(command),
            options,
            stage: RenderStage::Idle,
        }
    }

    /// Stage the last (or current) render reached.
    pub fn stage(&self) -> RenderStage {
        self.stage
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Run a render to completion, cancellation, or failure.
    pub fn render(
        &mut self,
        request: &RenderRequest,
        cancel: &CancellationFlag,
        observer: &mut dyn ProgressObserver,
    ) -> RenderOutcome {
        tracing::info!(
            source = %request.source_path().display(),
            output = %request.output_path().display(),
            width = request.width(),
            height = request.height(),
            total_frames = request.total_frames(),
            "Starting render"
        );

        let outcome = self.run(request, cancel, observer);
        self.transition(outcome.stage());

        match &outcome {
            RenderOutcome::Completed(path) => {
                tracing::info!(output = %path.display(), "Render completed")
            }
            RenderOutcome::Cancelled => tracing::info!("Render cancelled"),
            RenderOutcome::Failed(failure) => {
                tracing::error!(kind = ?failure.kind, error = %failure.message, "Render failed")
            }
        }
        outcome
    }

    fn run(
        &mut self,
        request: &RenderRequest,
        cancel: &CancellationFlag,
        observer: &mut dyn ProgressObserver,
    ) -> RenderOutcome {
        self.transition(RenderStage::Preparing);
        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => return RenderOutcome::Failed(e.into()),
        };

        if cancel.is_cancelled() {
            tracing::info!("Cancellation requested before launch");
            self.transition(RenderStage::Cancelling);
            remove_temp_artifact(prepared.subtitle_file);
            return RenderOutcome::Cancelled;
        }

        self.transition(RenderStage::Running);
        let frames = FrameCounter::new();
        let output_tail = Arc::new(Mutex::new(VecDeque::with_capacity(OUTPUT_TAIL_LINES)));
        let on_line = line_handler(frames.clone(), Arc::clone(&output_tail));

        let mut process =
            match EncoderProcess::launch(self.command.as_ref(), &prepared.invocation, on_line) {
                Ok(process) => process,
                Err(e) => {
                    remove_temp_artifact(prepared.subtitle_file);
                    return RenderOutcome::Failed(e.into());
                }
            };

        let clock = RenderClock::start();
        let tick_ms = u64::try_from(self.options.tick_interval.as_millis()).unwrap_or(u64::MAX);
        let mut ticker = TickTimer::new(tick_ms);
        let mut deadline_hit = false;

        while process.is_running() {
            std::thread::sleep(self.options.poll_interval);

            if cancel.is_cancelled() {
                if !process.stop_requested() {
                    self.transition(RenderStage::Cancelling);
                }
                process.request_stop();
            } else if let Some(deadline) = self.options.deadline {
                if !deadline_hit && clock.epoch().elapsed() >= deadline {
                    process.request_stop();
                    // A process that already exited on its own is not a deadline failure.
                    deadline_hit = process.stop_requested();
                    if deadline_hit {
                        tracing::warn!(deadline_secs = deadline.as_secs_f64(), "Render deadline exceeded");
                    }
                }
            }

            let elapsed_ms = clock.elapsed_ms();
            if ticker.should_tick(elapsed_ms) && !process.stop_requested() && process.is_running() {
                let processed_frames = frames.get();
                observer.on_progress(&RenderProgress {
                    processed_frames,
                    total_frames: request.total_frames(),
                    elapsed_ms,
                    eta: estimate_remaining(elapsed_ms, processed_frames, request.total_frames()),
                });
            }
        }

        let exit = process.wait();
        drop(process);

        if !cancel.is_cancelled() {
            self.transition(RenderStage::Finalizing);
        }
        observer.on_cleared();
        remove_temp_artifact(prepared.subtitle_file);

        tracing::info!(
            elapsed_secs = clock.elapsed_secs(),
            frames = frames.get(),
            "Encoder finished"
        );

        if cancel.is_cancelled() {
            if self.options.remove_partial_output_on_cancel {
                remove_partial_output(request.output_path());
            }
            return RenderOutcome::Cancelled;
        }

        let exit = match exit {
            Ok(exit) => exit,
            Err(e) => return RenderOutcome::Failed(e.into()),
        };

        if deadline_hit && exit == ProcessExit::Terminated {
            let deadline = self.options.deadline.unwrap_or_default();
            return RenderOutcome::Failed(
                BurnsubError::runtime(format!(
                    "Encoder stopped after exceeding the {}s deadline",
                    deadline.as_secs_f64()
                ))
                .into(),
            );
        }

        match exit {
            ProcessExit::Exited { success: true, .. } if request.output_path().exists() => {
                RenderOutcome::Completed(request.output_path().to_path_buf())
            }
            ProcessExit::Exited { success: true, .. } => RenderOutcome::Failed(
                BurnsubError::runtime(format!(
                    "{} exited successfully but wrote no file at {}",
                    self.command.program(),
                    request.output_path().display()
                ))
                .into(),
            ),
            exit => {
                let tail = output_tail
                    .lock()
                    .map(|lines| lines.iter().cloned().collect::<Vec<_>>().join("\n"))
                    .unwrap_or_default();
                RenderOutcome::Failed(
                    BurnsubError::runtime(format!(
                        "{} failed ({exit}): {}",
                        self.command.program(),
                        tail.trim()
                    ))
                    .into(),
                )
            }
        }
    }

    /// Build the encoder inputs: apply style and text transforms, write the
    /// scratch subtitle file, and clear any stale output.
    fn prepare(&self, request: &RenderRequest) -> BurnsubResult<PreparedRender> {
        if request.width() == 0 || request.height() == 0 {
            return Err(BurnsubError::preparation(format!(
                "Invalid target size {}x{}",
                request.width(),
                request.height()
            )));
        }
        if !request.source_path().exists() {
            return Err(BurnsubError::FileNotFound {
                path: request.source_path().to_path_buf(),
            });
        }

        let mut subtitle = request.subtitle().clone();
        if let Some(font_size) = request.font_size() {
            subtitle.set_style_font_size(DEFAULT_STYLE_NAME, font_size)?;
            tracing::debug!(font_size, "Applied font size to default style");
        }

        if self.options.right_to_left_mode && rtl::could_be_right_to_left(&subtitle) {
            let changed = rtl::apply_right_to_left(&mut subtitle);
            tracing::debug!(captions = changed, "Applied right-to-left transform");
        }

        let subtitle_file = write_temp_subtitle(&subtitle.to_ass(), self.options.temp_dir.as_deref())?;

        let output_path = request.output_path();
        if output_path.exists() {
            tracing::debug!(output = %output_path.display(), "Removing stale output file");
            std::fs::remove_file(output_path).map_err(|e| {
                BurnsubError::preparation(format!(
                    "Failed to remove existing output {}: {e}",
                    output_path.display()
                ))
            })?;
        }
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(PreparedRender {
            invocation: EncoderInvocation {
                input_path: request.source_path().to_path_buf(),
                subtitle_path: subtitle_file.to_path_buf(),
                width: request.width(),
                height: request.height(),
                output_path: output_path.to_path_buf(),
            },
            subtitle_file,
        })
    }

    fn transition(&mut self, next: RenderStage) {
        tracing::debug!(from = ?self.stage, to = ?next, "Render stage");
        self.stage = next;
    }
}

fn line_handler(frames: FrameCounter, output_tail: Arc<Mutex<VecDeque<String>>>) -> LineHandler {
    Arc::new(move |line: &str| {
        if frames.observe_line(line).is_some() {
            return;
        }
        tracing::trace!(line, "encoder");
        if let Ok(mut tail) = output_tail.lock() {
            if tail.len() == OUTPUT_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }
    })
}

/// Write the scratch subtitle under a unique name.
fn write_temp_subtitle(content: &str, dir: Option<&Path>) -> BurnsubResult<TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("burnsub-").suffix(".ass");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| BurnsubError::preparation(format!("Failed to create temporary subtitle: {e}")))?;

    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| BurnsubError::preparation(format!("Failed to write temporary subtitle: {e}")))?;

    let path = file.into_temp_path();
    tracing::debug!(path = %path.display(), "Wrote temporary subtitle");
    Ok(path)
}

/// Best-effort removal; failures are logged and otherwise ignored.
fn remove_temp_artifact(path: TempPath) {
    let shown = path.display().to_string();
    if let Err(e) = path.close() {
        tracing::warn!(path = %shown, error = %e, "Failed to remove temporary subtitle");
    }
}

fn remove_partial_output(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(output = %path.display(), "Removed partial output"),
        Err(e) => {
            tracing::warn!(output = %path.display(), error = %e, "Failed to remove partial output")
        }
    }
}
