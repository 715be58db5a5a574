//! Simulated encoder for integration tests.
//!
//! The encoder is a POSIX shell script receiving the invocation as
//! positional parameters: `$1` input, `$2` subtitle, `$3` width, `$4` height,
//! `$5` output.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use burnsub_render_engine::{EncoderCommand, EncoderInvocation, RenderOptions};

pub const SCRIPT: &str = "[Script Info]
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,20,&H00FFFFFF,&H0000FFFF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:00.00,0:00:02.00,Default,,0,0,0,,Hello
";

pub struct ShellEncoder {
    script: String,
}

impl ShellEncoder {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
        }
    }
}

impl EncoderCommand for ShellEncoder {
    fn build(&self, invocation: &EncoderInvocation) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.script)
            .arg("fake-encoder")
            .arg(&invocation.input_path)
            .arg(&invocation.subtitle_path)
            .arg(invocation.width.to_string())
            .arg(invocation.height.to_string())
            .arg(&invocation.output_path);
        cmd
    }

    fn program(&self) -> String {
        "fake-encoder".to_string()
    }
}

/// Fast polling, subtitle scratch files confined to `scratch`.
pub fn fast_options(scratch: &Path) -> RenderOptions {
    RenderOptions {
        poll_interval: Duration::from_millis(5),
        tick_interval: Duration::from_millis(20),
        temp_dir: Some(scratch.to_path_buf()),
        ..RenderOptions::default()
    }
}

/// A dummy source file the orchestrator can see.
pub fn source_video(dir: &Path) -> PathBuf {
    let path = dir.join("source.mkv");
    std::fs::write(&path, b"not really a video").expect("source fixture should be writable");
    path
}

pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .expect("scratch dir should be readable")
        .next()
        .is_none()
}
