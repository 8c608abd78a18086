//! Synchronous child processes with concurrent pipe handling.

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::str::{self, Utf8Error};
use std::thread;

/// What a finished child left behind.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// Captured standard output (empty when it was inherited)
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Standard output as text; fails on invalid UTF-8 instead of
    /// replacing it.
    pub fn stdout_text(&self) -> Result<&str, Utf8Error> {
        str::from_utf8(&self.stdout)
    }
}

/// Run `command` to completion.
///
/// `input` is written to standard input from a separate thread while this
/// thread drains standard output and standard error, so a child that fills
/// one pipe before reading all of its input cannot deadlock. Without `input`
/// the child gets an empty standard input. Standard output is captured only
/// when `capture_stdout` is set.
pub fn run(command: &mut Command, input: Option<&[u8]>, capture_stdout: bool) -> io::Result<ProcessOutput> {
    command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(if capture_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;
    let stdin = child.stdin.take();

    let output = thread::scope(|scope| {
        if let (Some(mut pipe), Some(data)) = (stdin, input) {
            scope.spawn(move || {
                // A child may exit without reading everything it was given.
                if let Err(err) = pipe.write_all(data) {
                    if err.kind() != io::ErrorKind::BrokenPipe {
                        log::debug!("writing to child stdin failed: {}", err);
                    }
                }
            });
        }
        child.wait_with_output()
    })?;

    Ok(ProcessOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
