//! Encoder process control.
//!
//! [`EncoderProcess`] owns one running encoder. Both output streams are
//! drained on background threads and split into lines on `\n` *and* `\r`
//! (ffmpeg rewrites its stats line in place with carriage returns), each
//! line being handed to the registered [`LineHandler`]. Dropping the handle
//! kills a still-running process.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;

use burnsub_common::error::{BurnsubError, BurnsubResult};

use crate::command::{EncoderCommand, EncoderInvocation};

/// Callback receiving every non-empty output line, from either stream.
pub type LineHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// How the encoder process ended.
///
/// The controller does not decide whether a run succeeded; it only reports
/// what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own.
    Exited { code: Option<i32>, success: bool },
    /// The process was killed by [`EncoderProcess::request_stop`].
    Terminated,
}

impl std::fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exited {
                code: Some(code), ..
            } => write!(f, "exit code {code}"),
            Self::Exited { code: None, .. } => write!(f, "killed by signal"),
            Self::Terminated => write!(f, "terminated on request"),
        }
    }
}

/// A running encoder process.
pub struct EncoderProcess {
    child: Child,
    program: String,
    readers: Vec<JoinHandle<()>>,
    stop_requested: bool,
    exit: Option<ProcessExit>,
}

impl EncoderProcess {
    /// Spawn the encoder and start delivering its output lines.
    ///
    /// Fails with [`BurnsubError::Launch`] if the process cannot be started.
    pub fn launch(
        command: &dyn EncoderCommand,
        invocation: &EncoderInvocation,
        on_line: LineHandler,
    ) -> BurnsubResult<Self> {
        let program = command.program();
        let mut cmd = command.build(invocation);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a stop also reaches anything the encoder spawned.
            cmd.process_group(0);
        }

        tracing::debug!(program = %program, ?invocation, "Spawning encoder");
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                BurnsubError::launch(format!("Encoder binary not found: {program}"))
            }
            io::ErrorKind::PermissionDenied => {
                BurnsubError::launch(format!("Permission denied running encoder {program}"))
            }
            _ => BurnsubError::launch(format!("Failed to start {program}: {e}")),
        })?;

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader("stdout", stdout, Arc::clone(&on_line)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader("stderr", stderr, Arc::clone(&on_line)));
        }

        tracing::info!(pid = child.id(), program = %program, "Encoder process started");

        Ok(Self {
            child,
            program,
            readers,
            stop_requested: false,
            exit: None,
        })
    }

    /// OS process id.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Whether the process is still alive.
    pub fn is_running(&mut self) -> bool {
        if self.exit.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(pid = self.child.id(), error = %e, "Failed to query encoder status");
                false
            }
        }
    }

    /// Whether [`request_stop`](Self::request_stop) has killed the process.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Forcibly terminate the process. Safe to call repeatedly and after
    /// the process has already exited.
    pub fn request_stop(&mut self) {
        if self.stop_requested || !self.is_running() {
            return;
        }
        tracing::info!(pid = self.child.id(), "Stopping encoder process");
        match kill_process(&mut self.child) {
            Ok(()) => self.stop_requested = true,
            Err(e) => {
                tracing::debug!(pid = self.child.id(), error = %e, "Encoder kill failed; likely already exited");
            }
        }
    }

    /// Block until the process exits and all of its output has been
    /// delivered to the line handler.
    pub fn wait(&mut self) -> BurnsubResult<ProcessExit> {
        if let Some(exit) = self.exit {
            return Ok(exit);
        }

        let status = self.child.wait().map_err(|e| {
            BurnsubError::runtime(format!("Failed to wait on {}: {e}", self.program))
        })?;

        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                tracing::warn!(program = %self.program, "Encoder output reader panicked");
            }
        }

        let exit = if self.stop_requested && !status.success() {
            ProcessExit::Terminated
        } else {
            ProcessExit::Exited {
                code: status.code(),
                success: status.success(),
            }
        };
        tracing::debug!(pid = self.child.id(), %exit, "Encoder process exited");
        self.exit = Some(exit);
        Ok(exit)
    }
}

impl Drop for EncoderProcess {
    fn drop(&mut self) {
        if self.exit.is_none() {
            if self.is_running() {
                let _ = kill_process(&mut self.child);
            }
            let _ = self.child.wait();
        }
    }
}

#[cfg(unix)]
fn kill_process(child: &mut Child) -> io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) only sends a signal; the group id is the child's own pid
    // because it was spawned with process_group(0).
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        child.kill()
    }
}

#[cfg(not(unix))]
fn kill_process(child: &mut Child) -> io::Result<()> {
    child.kill()
}

fn spawn_line_reader<R>(stream: &'static str, source: R, on_line: LineHandler) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        if let Err(e) = for_each_output_line(source, |line| (*on_line)(line)) {
            tracing::debug!(stream, error = %e, "Encoder output stream closed with error");
        }
    })
}

/// Longest line buffered before it is delivered without a terminator.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Split a byte stream into lines on `\n` or `\r`, skipping empty lines.
///
/// Lines are delivered as soon as their terminator arrives. Invalid UTF-8
/// is replaced rather than dropped. Unterminated runs longer than
/// [`MAX_LINE_BYTES`] are delivered in chunks of that size.
pub fn for_each_output_line<R, F>(source: R, mut on_line: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(source);
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let consumed = {
            let buf = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if buf.is_empty() {
                break;
            }
            for &byte in buf {
                if byte == b'\n' || byte == b'\r' {
                    if !pending.is_empty() {
                        on_line(&String::from_utf8_lossy(&pending));
                        pending.clear();
                    }
                } else {
                    pending.push(byte);
                    if pending.len() >= MAX_LINE_BYTES {
                        on_line(&String::from_utf8_lossy(&pending));
                        pending.clear();
                    }
                }
            }
            buf.len()
        };
        reader.consume(consumed);
    }

    if !pending.is_empty() {
        on_line(&String::from_utf8_lossy(&pending));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for_each_output_line(Cursor::new(input.to_vec()), |l| lines.push(l.to_string())).unwrap();
        lines
    }

    #[test]
    fn test_splits_on_carriage_return_and_newline() {
        let lines = collect(b"Input #0\nframe=  10 fps=5\rframe=  20 fps=5\r\nDone");
        assert_eq!(lines, vec!["Input #0", "frame=  10 fps=5", "frame=  20 fps=5", "Done"]);
    }

    #[test]
    fn test_skips_empty_lines() {
        assert_eq!(collect(b"\n\r\n\n"), Vec::<String>::new());
        assert_eq!(collect(b""), Vec::<String>::new());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let lines = collect(b"frame=5 \xff\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("frame=5 "));
    }

    #[test]
    fn test_unterminated_output_is_chunked() {
        let mut input = vec![b'x'; MAX_LINE_BYTES * 2 + 10];
        input.extend_from_slice(b"\nframe=7");
        let lines = collect(&input);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES);
        assert_eq!(lines[1].len(), MAX_LINE_BYTES);
        assert_eq!(lines[2], "x".repeat(10));
        assert_eq!(lines[3], "frame=7");
    }

    #[test]
    fn test_process_exit_display() {
        assert_eq!(
            ProcessExit::Exited {
                code: Some(1),
                success: false
            }
            .to_string(),
            "exit code 1"
        );
        assert_eq!(ProcessExit::Terminated.to_string(), "terminated on request");
    }
}
