#![forbid(unsafe_code)]

use crate::{ExtractError, TextExtractor, bin_detect};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_SNIPPET_CHARS: usize = 400;

/// Runs `program [args..] <path>` and returns its stdout as the document
/// text. The child is killed once `timeout` elapses.
#[derive(Clone, Debug)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Splits a whitespace-separated command line (`"tesseract --psm 3"`)
    /// into program and leading args.
    pub fn from_command_line(command_line: &str, timeout: Duration) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, timeout).with_args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl TextExtractor for CommandExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let Some(program) = bin_detect::resolve_program(&self.program) else {
            return Err(ExtractError::MissingProgram {
                program: self.program.clone(),
            });
        };

        let capture = Capture::new();
        let mut child = Command::new(&program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::from(File::create(&capture.stdout)?))
            .stderr(Stdio::from(File::create(&capture.stderr)?))
            .spawn()?;
        debug!(program = %program.display(), path = %path.display(), "spawned extractor");

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                warn!(program = %self.program, timeout = ?self.timeout, "extractor killed");
                return Err(ExtractError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            sleep(POLL_INTERVAL);
        };

        if !status.success() {
            return Err(ExtractError::CommandFailed {
                program: self.program.clone(),
                status: format_exit_status(&status),
                stderr: capture.stderr_snippet(),
            });
        }

        let bytes = std::fs::read(&capture.stdout)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn format_exit_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Per-invocation stdout/stderr capture files, removed on drop.
struct Capture {
    stdout: PathBuf,
    stderr: PathBuf,
}

impl Capture {
    fn new() -> Self {
        let dir = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let stem = format!("it_extract_{}_{nonce}", std::process::id());
        Self {
            stdout: dir.join(format!("{stem}.out")),
            stderr: dir.join(format!("{stem}.err")),
        }
    }

    fn stderr_snippet(&self) -> String {
        let bytes = std::fs::read(&self.stderr).unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes);
        text.trim().chars().take(STDERR_SNIPPET_CHARS).collect()
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.stdout);
        let _ = std::fs::remove_file(&self.stderr);
    }
}
