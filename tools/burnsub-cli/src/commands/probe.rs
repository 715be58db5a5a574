//! Show source video information.

use std::path::PathBuf;

use burnsub_common::config::AppConfig;
use burnsub_render_engine::probe_video;

pub fn run(video: PathBuf, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let info = probe_video(&config.encoder.ffprobe_path, &video)
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", video.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Video: {}", video.display());
    println!("  Resolution: {}x{}", info.width, info.height);
    println!("  Frame rate: {:.3} fps", info.frame_rate);
    println!("  Duration: {:.2}s", info.duration_secs);
    println!("  Frames: {}", info.total_frames);
    Ok(())
}
