//! External tool invocations and the runners that execute them.

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, info};

use crate::error::{OpsError, Result};

/// What the child process reads on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdinMode {
    /// Share the terminal with the child.
    #[default]
    Inherit,
    /// Answer every prompt with `y`.
    AutoConfirm,
}

/// A program, its arguments and where to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: StdinMode,
    /// Indexes into `args` that are masked when the invocation is displayed.
    secret_args: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdin: StdinMode::Inherit,
            secret_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument that must not appear in logs or error messages.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Add an argument only when `condition` holds.
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition { self.arg(arg) } else { self }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdin(mut self, mode: StdinMode) -> Self {
        self.stdin = mode;
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> OpsError {
        OpsError::Spawn {
            command: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&idx) {
                let shown = arg.split_once('=').map_or("***".to_string(), |(key, _)| {
                    format!("{key}=***")
                });
                write!(f, " {shown}")?;
            } else if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Exit code and captured output of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout; empty for invocations run on the terminal.
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`OpsError::CommandFailed`].
    pub fn require(self, invocation: &Invocation) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(OpsError::CommandFailed {
                command: invocation.to_string(),
                code: self.code,
            })
        }
    }
}

/// Executes invocations.
pub trait CommandRunner {
    /// Run on the terminal and wait for it to finish.
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run with stdout captured and stderr discarded.
    fn capture(&mut self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run with stdout echoed to the terminal and handed to `on_line` one line at a time.
    fn stream(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<CommandOutput>;
}

/// Runs invocations as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn configure_stdin(command: &mut Command, mode: StdinMode) {
        match mode {
            StdinMode::Inherit => command.stdin(Stdio::inherit()),
            StdinMode::AutoConfirm => command.stdin(Stdio::piped()),
        };
    }

    /// Keep answering `y` until the child closes its stdin.
    fn feed_confirmations(child: &mut std::process::Child) {
        if let Some(mut stdin) = child.stdin.take() {
            thread::spawn(move || while stdin.write_all(b"y\n").is_ok() {});
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput> {
        info!(command = %invocation, cwd = ?invocation.cwd, "running");
        let mut command = invocation.command();
        Self::configure_stdin(&mut command, invocation.stdin);
        let mut child = command.spawn().map_err(|e| invocation.spawn_error(e))?;
        Self::feed_confirmations(&mut child);
        let status = child.wait().map_err(|e| invocation.spawn_error(e))?;
        debug!(command = %invocation, code = ?status.code(), "finished");
        Ok(CommandOutput {
            code: status.code(),
            stdout: String::new(),
        })
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(command = %invocation, cwd = ?invocation.cwd, "capturing");
        let mut command = invocation.command();
        Self::configure_stdin(&mut command, invocation.stdin);
        let output = command
            .stderr(Stdio::null())
            .output()
            .map_err(|e| invocation.spawn_error(e))?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn stream(
        &mut self,
        invocation: &Invocation,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<CommandOutput> {
        info!(command = %invocation, cwd = ?invocation.cwd, "running");
        let mut command = invocation.command();
        Self::configure_stdin(&mut command, invocation.stdin);
        let mut child = command
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| invocation.spawn_error(e))?;
        Self::feed_confirmations(&mut child);

        if let Some(stdout) = child.stdout.take() {
            let mut terminal = std::io::stdout();
            for line in BufReader::new(stdout).lines() {
                let line = line.map_err(|e| invocation.spawn_error(e))?;
                // Echo failures only affect what the operator sees.
                let _ = writeln!(terminal, "{line}");
                on_line(&line);
            }
        }

        let status = child.wait().map_err(|e| invocation.spawn_error(e))?;
        debug!(command = %invocation, code = ?status.code(), "finished");
        Ok(CommandOutput {
            code: status.code(),
            stdout: String::new(),
        })
    }
}
