//! Child process execution for the two lookup implementations.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{BenchError, Result};
use crate::plan::Scenario;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Selects which side of the comparison is being run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Implementation {
    /// Reference implementation.
    Baseline,
    /// Implementation under test.
    Optimized,
}

impl Implementation {
    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Implementation::Baseline => "baseline",
            Implementation::Optimized => "optimized",
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Program plus leading arguments; scenario parameters are appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplementationCommand {
    /// Executable to launch.
    pub program: String,
    /// Arguments placed before the scenario parameters.
    pub args: Vec<String>,
}

impl ImplementationCommand {
    /// Creates a command from a program and its fixed arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Full argument vector for `scenario`: fixed args, letters, tlds, limit.
    pub fn argv(&self, scenario: &Scenario) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.push(scenario.letters.to_string());
        argv.push(scenario.tld_arg());
        argv.push(scenario.limit.to_string());
        argv
    }

    /// Shell-like rendering used in messages.
    pub fn render(&self, scenario: &Scenario) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.argv(scenario));
        parts.join(" ")
    }
}

/// Result of a successful child run.
#[derive(Clone, Debug)]
pub struct ProcessOutcome {
    /// Exit code reported by the child.
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
    /// Wall-clock time the harness waited.
    pub elapsed: Duration,
}

/// Launches implementations from a fixed working directory.
#[derive(Clone, Debug)]
pub struct Executor {
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl Executor {
    /// Creates an executor that waits indefinitely for each child.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: None,
        }
    }

    /// Kills children that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory children are started in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Runs `command` for `scenario`, inheriting the environment plus
    /// `extra_env`, and fails unless the child exits with status zero.
    pub fn execute(
        &self,
        command: &ImplementationCommand,
        implementation: Implementation,
        scenario: &Scenario,
        extra_env: &[(String, String)],
    ) -> Result<ProcessOutcome> {
        let rendered = command.render(scenario);
        let spawn_failed = |source| BenchError::Spawn {
            implementation,
            command: rendered.clone(),
            source,
        };
        let capture = tempfile::tempfile().map_err(spawn_failed)?;
        let stderr = capture.try_clone().map_err(spawn_failed)?;
        let stdout = capture.try_clone().map_err(spawn_failed)?;

        let mut cmd = Command::new(&command.program);
        cmd.args(command.argv(scenario))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        debug!(%implementation, command = %rendered, "bench.exec.spawn");
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(spawn_failed)?;
        let waited = self.wait(&mut child).map_err(|source| BenchError::Wait {
            implementation,
            command: rendered.clone(),
            source,
        })?;
        let elapsed = start.elapsed();
        let output = read_capture(capture).map_err(|source| BenchError::Capture {
            implementation,
            command: rendered.clone(),
            source,
        })?;

        match waited {
            Wait::TimedOut(after) => {
                warn!(%implementation, command = %rendered, ?after, "bench.exec.timeout");
                Err(BenchError::Timeout {
                    implementation,
                    command: rendered,
                    after,
                    output,
                })
            }
            Wait::Exited(status) if status.success() => {
                debug!(%implementation, elapsed_ms = elapsed.as_millis() as u64, "bench.exec.exit");
                Ok(ProcessOutcome {
                    exit_code: status.code(),
                    output,
                    elapsed,
                })
            }
            Wait::Exited(status) => {
                warn!(%implementation, code = ?status.code(), "bench.exec.failed");
                Err(BenchError::Execution {
                    implementation,
                    command: rendered,
                    exit_code: status.code(),
                    output,
                })
            }
        }
    }

    fn wait(&self, child: &mut Child) -> io::Result<Wait> {
        let Some(timeout) = self.timeout else {
            return child.wait().map(Wait::Exited);
        };
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Wait::Exited(status));
            }
            if started.elapsed() >= timeout {
                let _ = child.kill();
                child.wait()?;
                return Ok(Wait::TimedOut(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

enum Wait {
    Exited(ExitStatus),
    TimedOut(Duration),
}

fn read_capture(mut capture: File) -> io::Result<String> {
    let mut bytes = Vec::new();
    capture.seek(SeekFrom::Start(0))?;
    capture.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
