// Copyright 2026 Oxide Computer Company

//! Running VCS commands.

use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, io, process::Command};

/// A command to run: a program, its arguments and a working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    current_dir: Utf8PathBuf,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments, run in
    /// `current_dir`.
    pub fn new(program: impl Into<String>, current_dir: &Utf8Path) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.to_owned(),
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the program to run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Returns the working directory.
    pub fn current_dir(&self) -> &Utf8Path {
        &self.current_dir
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// The captured result of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited successfully.
    pub success: bool,
    /// The exit code, if the process exited normally.
    pub code: Option<i32>,
    /// A human-readable description of the exit status (e.g.,
    /// "exit status: 128" or "signal: 9 (SIGKILL)").
    pub exit_status: String,
    /// Everything the command wrote to stdout.
    pub stdout: Vec<u8>,
    /// Everything the command wrote to stderr.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Creates the output of a command that exited with status 0.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        CommandOutput {
            success: true,
            code: Some(0),
            exit_status: "exit status: 0".to_owned(),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Creates the output of a command that exited with `code`.
    pub fn failure(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        CommandOutput {
            success: false,
            code: Some(code),
            exit_status: format!("exit status: {code}"),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns stderr as trimmed, lossily decoded text.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Executes VCS commands on behalf of a backend.
///
/// Every command a backend runs goes through this trait, so tests can
/// substitute canned output for real processes.
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` to completion and captures its output.
    ///
    /// An `Err` means the process could not be started. A process that
    /// starts and then fails is reported as a [`CommandOutput`] with
    /// `success` set to false.
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Runs commands as child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let output = Command::new(invocation.program())
            .args(invocation.get_args())
            .current_dir(invocation.current_dir())
            .output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            exit_status: output.status.to_string(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
