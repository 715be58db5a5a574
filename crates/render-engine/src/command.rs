//! Encoder command construction.

use std::path::{Path, PathBuf};
use std::process::Command;

use burnsub_common::config::EncoderDefaults;

/// The five values an encoder run is defined by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInvocation {
    pub input_path: PathBuf,
    pub subtitle_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub output_path: PathBuf,
}

/// Builds the process command for an encoder invocation.
///
/// Flag syntax is encoder specific; the contract is that the spawned
/// process either writes a video to `output_path` and exits successfully,
/// or exits with an error.
pub trait EncoderCommand: Send + Sync {
    /// Build the command. Stdio is configured by the caller.
    fn build(&self, invocation: &EncoderInvocation) -> Command;

    /// Program name, for logs and error messages.
    fn program(&self) -> String;
}

/// ffmpeg with the libass `ass` filter.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    binary: PathBuf,
    video_codec: String,
    preset: String,
    crf: u8,
    pixel_format: String,
    copy_audio: bool,
}

impl Default for FfmpegCommand {
    fn default() -> Self {
        Self::from_config(&EncoderDefaults::default())
    }
}

impl FfmpegCommand {
    pub fn from_config(config: &EncoderDefaults) -> Self {
        Self {
            binary: config.ffmpeg_path.clone(),
            video_codec: config.video_codec.clone(),
            preset: config.preset.clone(),
            crf: config.crf,
            pixel_format: config.pixel_format.clone(),
            copy_audio: config.copy_audio,
        }
    }

    /// Full argument list, without the program name.
    pub fn args(&self, invocation: &EncoderInvocation) -> Vec<String> {
        let filter = format!(
            "scale={}:{},ass='{}'",
            invocation.width,
            invocation.height,
            escape_filter_path(&invocation.subtitle_path)
        );

        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            invocation.input_path.to_string_lossy().into_owned(),
            "-vf".to_string(),
            filter,
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ];
        if self.copy_audio {
            args.extend(["-c:a".to_string(), "copy".to_string()]);
        }
        args.push(invocation.output_path.to_string_lossy().into_owned());
        args
    }
}

impl EncoderCommand for FfmpegCommand {
    fn build(&self, invocation: &EncoderInvocation) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(self.args(invocation));
        cmd
    }

    fn program(&self) -> String {
        self.binary.display().to_string()
    }
}

/// Escape a path for use inside a single-quoted filter-graph option.
///
/// Backslashes become forward slashes (Windows paths), then `:` and `'`
/// are escaped so the filter parser does not split on them.
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            ':' => escaped.push_str("\\:"),
            '\'' => escaped.push_str("'\\''"),
            _ => escaped.push(c),
        }
    }
    escaped
}
