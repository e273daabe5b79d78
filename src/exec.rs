//! Subprocess execution for script layers.
use std::io::{self, Write as _};
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Result of a command execution.
///
/// `stdout` is kept as raw bytes: it becomes file content verbatim.
#[derive(Debug)]
pub struct ExecResult {
    /// Raw standard output.
    pub stdout: Vec<u8>,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process spawning so the layer applier can be tested
/// without real scripts.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run `program` without arguments, feeding `input` on stdin and
    /// capturing stdout and stderr.
    ///
    /// A non-zero exit is *not* an error here; callers inspect
    /// [`ExecResult::success`].
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or its pipes fail.
    fn run_filter(&self, program: &Path, input: &[u8]) -> io::Result<ExecResult>;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_filter(&self, program: &Path, input: &[u8]) -> io::Result<ExecResult> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a separate thread; a script that writes more than a
        // pipe buffer before reading would otherwise deadlock against us.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                if let Some(mut stdin) = stdin {
                    match stdin.write_all(input) {
                        // The script may legitimately exit without reading everything.
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                        other => other?,
                    }
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            let output = output?;
            written?;
            Ok::<_, io::Error>(output)
        })?;

        Ok(ExecResult::from(output))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_filter_pipes_stdin_to_stdout() {
        let result = SystemExecutor
            .run_filter(Path::new("cat"), b"hello\nworld")
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stdout, b"hello\nworld");
        assert!(result.stderr.is_empty());
    }

    #[test]
    fn run_filter_reports_failure_without_error() {
        let result = SystemExecutor.run_filter(Path::new("false"), b"").unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
        assert_eq!(result.code, Some(1));
    }

    #[test]
    fn run_filter_handles_large_input() {
        let input = vec![b'x'; 1 << 20];
        let result = SystemExecutor.run_filter(Path::new("cat"), &input).unwrap();
        assert_eq!(result.stdout.len(), input.len());
    }

    #[test]
    fn run_filter_missing_program_is_error() {
        let result =
            SystemExecutor.run_filter(Path::new("this-program-does-not-exist-12345"), b"");
        assert!(result.is_err());
    }
}
