use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::error::UtilError;
use crate::Result;

/// Stdio mode for subprocess streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    Inherit,
    Pipe,
    Null,
}

impl StdioMode {
    fn to_stdio(self) -> Stdio {
        match self {
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Pipe => Stdio::piped(),
            StdioMode::Null => Stdio::null(),
        }
    }
}

/// Result of running a subprocess.
#[derive(Debug)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Builder for invoking an init script (or any subprocess) with a bounded
/// deadline. This is the collaborator the service controller drives for
/// every `status`/`start`/`stop`/`restart` call against the host's init
/// system (spec §6's "init-system adapter").
pub struct ChildCommand {
    program: OsString,
    args: Vec<OsString>,
    stdout_mode: StdioMode,
    stderr_mode: StdioMode,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ChildCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            stdout_mode: StdioMode::Pipe,
            stderr_mode: StdioMode::Pipe,
            working_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout_mode = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr_mode = mode;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(self.stdout_mode.to_stdio());
        cmd.stderr(self.stderr_mode.to_stdio());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn command_string(&self) -> String {
        let mut s = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(&arg.to_string_lossy());
        }
        s
    }

    /// Run the command and wait for it to complete, capturing output.
    /// If a timeout was set, the child is killed and a `SubprocessTimeout`
    /// error is returned once the deadline elapses without exit.
    pub fn run(&self) -> Result<CommandResult> {
        let mut cmd = self.build_command();
        let cmd_str = self.command_string();

        let mut child = cmd.spawn().map_err(|e| UtilError::Subprocess {
            command: cmd_str.clone(),
            source: e,
        })?;

        let Some(timeout) = self.timeout else {
            let output = child
                .wait_with_output()
                .map_err(|e| UtilError::Subprocess {
                    command: cmd_str,
                    source: e,
                })?;
            return Ok(CommandResult {
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_)) => {
                    let output = child
                        .wait_with_output()
                        .map_err(|e| UtilError::Subprocess {
                            command: cmd_str.clone(),
                            source: e,
                        })?;
                    return Ok(CommandResult {
                        status: output.status,
                        stdout: output.stdout,
                        stderr: output.stderr,
                    });
                }
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(UtilError::SubprocessTimeout {
                            command: cmd_str,
                            elapsed_ms: start.elapsed().as_millis(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    return Err(UtilError::Subprocess {
                        command: cmd_str,
                        source: e,
                    });
                }
            }
        }
    }
}
