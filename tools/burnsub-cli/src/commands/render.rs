//! Render a video with burned-in subtitles.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use burnsub_common::config::AppConfig;
use burnsub_render_engine::{
    probe_video, CancellationFlag, FfmpegCommand, ProgressObserver, RenderOptions,
    RenderOrchestrator, RenderOutcome, RenderProgress, RenderRequest,
};
use burnsub_subtitle_model::Subtitle;

pub struct RenderArgs {
    pub video: PathBuf,
    pub subtitle: PathBuf,
    pub output: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub font_size: Option<u32>,
    pub rtl: bool,
    pub deadline_secs: Option<u64>,
}

/// Writes a single, in-place progress line to stdout.
struct TerminalProgress {
    last_len: usize,
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&mut self, progress: &RenderProgress) {
        let mut line = if progress.total_frames > 0 {
            format!(
                "  frame {}/{} ({:.1}%)",
                progress.display_frames(),
                progress.total_frames,
                progress.fraction() * 100.0
            )
        } else {
            format!("  frame {}", progress.processed_frames)
        };
        if let Some(eta) = progress.eta {
            line.push_str(&format!("  ETA: {eta}"));
        }
        // Pad over the remains of a longer previous line.
        let width = line.len().max(self.last_len);
        self.last_len = line.len();
        print!("\r{line:<width$}");
        let _ = std::io::stdout().flush();
    }

    fn on_cleared(&mut self) {
        if self.last_len > 0 {
            print!("\r{:width$}\r", "", width = self.last_len);
            let _ = std::io::stdout().flush();
            self.last_len = 0;
        }
    }
}

pub async fn run(args: RenderArgs, config: AppConfig) -> anyhow::Result<()> {
    println!("Rendering: {}", args.video.display());
    println!("  Subtitles: {}", args.subtitle.display());

    let content = std::fs::read_to_string(&args.subtitle).map_err(|e| {
        anyhow::anyhow!("Failed to read subtitle {}: {e}", args.subtitle.display())
    })?;
    let mut subtitle = Subtitle::parse(&content);
    subtitle.ensure_header();

    let (width, height, total_frames) =
        match probe_video(&config.encoder.ffprobe_path, &args.video) {
            Ok(info) => (
                args.width.unwrap_or(info.width),
                args.height.unwrap_or(info.height),
                info.total_frames,
            ),
            Err(e) => match (args.width, args.height) {
                (Some(w), Some(h)) => {
                    tracing::warn!(error = %e, "Probe failed; rendering without a frame total");
                    (w, h, 0)
                }
                _ => {
                    return Err(anyhow::anyhow!(
                        "Failed to probe {}: {e} (pass --width and --height to skip probing)",
                        args.video.display()
                    ));
                }
            },
        };

    let request = RenderRequest::new(&args.video, subtitle, &args.output, width, height)
        .with_font_size(args.font_size)
        .with_total_frames(total_frames);

    let mut options = RenderOptions::from(&config.render);
    options.right_to_left_mode |= args.rtl;
    if let Some(secs) = args.deadline_secs {
        options.deadline = Some(Duration::from_secs(secs));
    }

    println!(
        "  Resolution: {}x{}  Frames: {}",
        request.width(),
        request.height(),
        if total_frames > 0 {
            total_frames.to_string()
        } else {
            "unknown".to_string()
        }
    );
    println!("  Output: {}", args.output.display());
    println!();

    let cancel = CancellationFlag::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling render");
                cancel.cancel();
            }
        })
    };

    let command = FfmpegCommand::from_config(&config.encoder);
    let render_cancel = cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut orchestrator = RenderOrchestrator::new(command, options);
        let mut observer = TerminalProgress { last_len: 0 };
        orchestrator.render(&request, &render_cancel, &mut observer)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Render task failed: {e}"))?;
    ctrl_c.abort();

    match outcome {
        RenderOutcome::Completed(path) => {
            println!("Render complete: {}", path.display());
            Ok(())
        }
        RenderOutcome::Cancelled => {
            println!("Render cancelled.");
            Ok(())
        }
        RenderOutcome::Failed(failure) => Err(anyhow::anyhow!("Render failed: {failure}")),
    }
}
