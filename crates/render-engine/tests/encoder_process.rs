#![cfg(unix)]

mod support;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use burnsub_render_engine::{EncoderInvocation, EncoderProcess, FfmpegCommand, ProcessExit};
use burnsub_common::config::EncoderDefaults;
use burnsub_common::error::FailureKind;

use support::ShellEncoder;

fn invocation() -> EncoderInvocation {
    EncoderInvocation {
        input_path: PathBuf::from("in.mkv"),
        subtitle_path: PathBuf::from("sub.ass"),
        width: 2,
        height: 2,
        output_path: PathBuf::from("out.mp4"),
    }
}

fn collecting_handler() -> (Arc<Mutex<Vec<String>>>, burnsub_render_engine::LineHandler) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let handler: burnsub_render_engine::LineHandler = Arc::new(move |line: &str| {
        sink.lock().unwrap().push(line.to_string());
    });
    (lines, handler)
}

#[test]
fn delivers_lines_from_both_streams() {
    let (lines, handler) = collecting_handler();
    let encoder = ShellEncoder::new("echo out-line; echo err-line >&2; printf 'frame=1\\rframe=2\\r' >&2");
    let mut process = EncoderProcess::launch(&encoder, &invocation(), handler).unwrap();

    let exit = process.wait().unwrap();
    assert_eq!(
        exit,
        ProcessExit::Exited {
            code: Some(0),
            success: true
        }
    );

    let mut lines = lines.lock().unwrap().clone();
    lines.sort();
    assert_eq!(lines, vec!["err-line", "frame=1", "frame=2", "out-line"]);
}

#[test]
fn reports_non_zero_exit_without_judging_it() {
    let (_, handler) = collecting_handler();
    let mut process =
        EncoderProcess::launch(&ShellEncoder::new("exit 7"), &invocation(), handler).unwrap();
    assert_eq!(
        process.wait().unwrap(),
        ProcessExit::Exited {
            code: Some(7),
            success: false
        }
    );
    assert!(!process.is_running());
}

#[test]
fn request_stop_is_idempotent() {
    let (_, handler) = collecting_handler();
    let mut process =
        EncoderProcess::launch(&ShellEncoder::new("sleep 30"), &invocation(), handler).unwrap();
    assert!(process.is_running());

    let started = Instant::now();
    process.request_stop();
    process.request_stop();
    assert_eq!(process.wait().unwrap(), ProcessExit::Terminated);
    assert!(started.elapsed() < Duration::from_secs(10));

    process.request_stop();
    assert!(!process.is_running());
    assert_eq!(process.wait().unwrap(), ProcessExit::Terminated);
}

#[test]
fn stop_after_natural_exit_keeps_exit_status() {
    let (_, handler) = collecting_handler();
    let mut process =
        EncoderProcess::launch(&ShellEncoder::new("exit 0"), &invocation(), handler).unwrap();
    while process.is_running() {
        std::thread::sleep(Duration::from_millis(5));
    }
    process.request_stop();
    assert_eq!(
        process.wait().unwrap(),
        ProcessExit::Exited {
            code: Some(0),
            success: true
        }
    );
}

#[test]
fn missing_binary_is_a_launch_failure() {
    let (_, handler) = collecting_handler();
    let config = EncoderDefaults {
        ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg-burnsub"),
        ..EncoderDefaults::default()
    };
    let err = EncoderProcess::launch(&FfmpegCommand::from_config(&config), &invocation(), handler)
        .err()
        .expect("launch should fail");
    assert_eq!(err.kind(), FailureKind::Launch);
    assert!(err.to_string().contains("not found"));
}
