//! Source video probing via ffprobe.

use std::path::Path;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use burnsub_common::error::{BurnsubError, BurnsubResult};

/// What the renderer needs to know about a source video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Expected frame count. Zero when it could not be determined.
    pub total_frames: u64,
    pub frame_rate: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe the first video stream of `path`.
pub fn probe_video(ffprobe: &Path, path: &Path) -> BurnsubResult<VideoInfo> {
    if !path.exists() {
        return Err(BurnsubError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,nb_frames,r_frame_rate,avg_frame_rate,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| BurnsubError::probe(format!("Failed to run {}: {e}", ffprobe.display())))?;

    if !output.status.success() {
        return Err(BurnsubError::probe(format!(
            "ffprobe failed (status {}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
    tracing::debug!(?info, path = %path.display(), "Probed source video");
    Ok(info)
}

/// Parse `ffprobe -of json` output.
pub fn parse_probe_output(json: &str) -> BurnsubResult<VideoInfo> {
    let parsed: ProbeOutput = serde_json::from_str(json)?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| BurnsubError::probe("No video stream found"))?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(BurnsubError::probe("Video stream has no dimensions"));
    }

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rational))
        .unwrap_or(0.0);

    let duration_secs = stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            parsed
                .format
                .and_then(|f| f.duration)
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    let total_frames = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| (duration_secs * frame_rate).round().max(0.0) as u64);

    Ok(VideoInfo {
        width,
        height,
        total_frames,
        frame_rate,
        duration_secs,
    })
}

/// Parse an ffprobe rational such as `30000/1001`.
fn parse_rational(value: &str) -> Option<f64> {
    let (num, den) = match value.split_once('/') {
        Some((n, d)) => (n.trim().parse::<f64>().ok()?, d.trim().parse::<f64>().ok()?),
        None => (value.trim().parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}

/// Whether a binary can be executed (`<binary> -version` succeeds).
pub fn command_exists(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_frame_count() {
        let json = r#"{
            "programs": [],
            "streams": [
                { "width": 1920, "height": 1080, "r_frame_rate": "25/1",
                  "avg_frame_rate": "25/1", "duration": "12.000000", "nb_frames": "300" }
            ],
            "format": { "duration": "12.040000" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.total_frames, 300);
        assert!((info.frame_rate - 25.0).abs() < 1e-9);
        assert!((info.duration_secs - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_derives_frames_from_duration() {
        // Matroska streams carry no nb_frames.
        let json = r#"{
            "streams": [ { "width": 1280, "height": 720, "r_frame_rate": "30000/1001", "avg_frame_rate": "0/0" } ],
            "format": { "duration": "10.010000" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.total_frames, 300);
        assert!((info.frame_rate - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_probe_without_video_stream() {
        let err = parse_probe_output(r#"{ "streams": [] }"#).unwrap_err();
        assert!(err.to_string().contains("No video stream"));
    }

    #[test]
    fn test_parse_rational() {
        assert_eq!(parse_rational("25/1"), Some(25.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("24"), Some(24.0));
        assert_eq!(parse_rational("abc"), None);
    }

    #[test]
    fn test_missing_binary_does_not_exist() {
        assert!(!command_exists(Path::new("/nonexistent/burnsub-encoder")));
    }
}
