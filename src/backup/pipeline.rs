//! Subprocess pipelines
//!
//! Chains programs stdout-to-stdin without going through a shell, with an
//! optional input file on the first stage and an optional output file on
//! the last. Each stage's stderr is captured in an anonymous temporary file
//! so a failing stage can be reported with its own message.

use std::ffi::{OsStr, OsString};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use thiserror::Error;

/// Why a pipeline did not complete
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Output file was already present when the pipeline opened it
    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}{}", format_stderr(.stderr))]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

#[derive(Debug, Clone)]
struct Stage {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Stage {
    fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .to_string()
    }
}

/// A chain of programs connected by pipes
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Pipeline {
    /// Start a pipeline with its first program
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            stages: vec![Stage {
                program: program.as_ref().to_path_buf(),
                args: Vec::new(),
            }],
            input: None,
            output: None,
        }
    }

    /// Add an argument to the most recently added program
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        if let Some(stage) = self.stages.last_mut() {
            stage.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Pipe the previous program's stdout into `program`
    pub fn pipe(mut self, program: impl AsRef<Path>) -> Self {
        self.stages.push(Stage {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        });
        self
    }

    /// Feed a file to the first program's stdin
    pub fn read_from(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Some(path.as_ref().to_path_buf());
        self
    }

    /// Write the last program's stdout to a new file
    ///
    /// The file is created exclusively; an existing file is never truncated.
    pub fn write_to(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    /// Shell-like rendering for logs
    pub fn describe(&self) -> String {
        let mut rendered = self
            .stages
            .iter()
            .map(|stage| {
                let mut parts = vec![stage.program.display().to_string()];
                parts.extend(stage.args.iter().map(|a| a.to_string_lossy().to_string()));
                parts.join(" ")
            })
            .collect::<Vec<_>>()
            .join(" | ");

        if let Some(input) = &self.input {
            rendered.push_str(&format!(" < {}", input.display()));
        }
        if let Some(output) = &self.output {
            rendered.push_str(&format!(" > {}", output.display()));
        }
        rendered
    }

    /// Run every stage to completion
    ///
    /// Blocks until all programs have exited. Files are opened before the
    /// first program starts, so a setup failure never leaves children behind.
    /// When several stages fail, one that exited with a code is reported
    /// ahead of one killed by a signal.
    pub fn run(self) -> Result<(), PipelineError> {
        let mut input = match &self.input {
            Some(path) => Some(File::open(path).map_err(|source| PipelineError::Open {
                path: path.clone(),
                source,
            })?),
            None => None,
        };

        let mut captures = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let log = stderr_capture(stage)?;
            let handle = log.try_clone().map_err(|source| PipelineError::Spawn {
                program: stage.name(),
                source,
            })?;
            captures.push((log, handle));
        }

        let mut output = match &self.output {
            Some(path) => Some(create_output(path)?),
            None => None,
        };

        let mut running: Vec<(String, Child, File)> = Vec::with_capacity(self.stages.len());
        let mut previous_stdout = None;
        let last = self.stages.len() - 1;

        for ((position, stage), (stderr_log, stderr_handle)) in
            self.stages.iter().enumerate().zip(captures)
        {
            let mut command = Command::new(&stage.program);
            command.args(&stage.args);

            let stdin = match (previous_stdout.take(), input.take()) {
                (Some(pipe), _) => Stdio::from(pipe),
                (None, Some(file)) => Stdio::from(file),
                (None, None) => Stdio::null(),
            };
            command.stdin(stdin);

            if position == last {
                match output.take() {
                    Some(file) => command.stdout(Stdio::from(file)),
                    None => command.stdout(Stdio::null()),
                };
            } else {
                command.stdout(Stdio::piped());
            }
            command.stderr(Stdio::from(stderr_handle));

            let mut child = match spawn(&mut command) {
                Ok(child) => child,
                Err(source) => {
                    abandon(running);
                    return Err(PipelineError::Spawn {
                        program: stage.name(),
                        source,
                    });
                }
            };

            if position != last {
                previous_stdout = child.stdout.take();
            }
            running.push((stage.name(), child, stderr_log));
        }

        let mut failures = Vec::new();
        for (program, mut child, mut stderr_log) in running {
            match child.wait() {
                Ok(status) if status.success() => {}
                Ok(status) => failures.push(PipelineError::Exit {
                    program,
                    status,
                    stderr: read_captured(&mut stderr_log),
                }),
                Err(source) => failures.push(PipelineError::Wait { program, source }),
            }
        }

        match select_failure(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Pick the failure to report, in pipeline order
///
/// A stage killed by a signal is usually a writer whose reader already
/// died (SIGPIPE), so the first stage that exited with a code wins.
fn select_failure(mut failures: Vec<PipelineError>) -> Option<PipelineError> {
    let exited = failures.iter().position(|failure| {
        matches!(failure, PipelineError::Exit { status, .. } if status.code().is_some())
    });
    match exited {
        Some(index) => Some(failures.swap_remove(index)),
        None => failures.into_iter().next(),
    }
}

/// Spawn, retrying briefly while a just-written executable is still busy
fn spawn(command: &mut Command) -> io::Result<Child> {
    const ETXTBSY: i32 = 26;

    let mut attempts = 0;
    loop {
        match command.spawn() {
            Err(err) if cfg!(unix) && err.raw_os_error() == Some(ETXTBSY) && attempts < 10 => {
                attempts += 1;
                std::thread::sleep(std::time::Duration::from_millis(20));
            }
            other => return other,
        }
    }
}

fn create_output(path: &Path) -> Result<File, PipelineError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                PipelineError::OutputExists(path.to_path_buf())
            } else {
                PipelineError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
}

fn stderr_capture(stage: &Stage) -> Result<File, PipelineError> {
    tempfile::tempfile().map_err(|source| PipelineError::Spawn {
        program: stage.name(),
        source,
    })
}

fn read_captured(log: &mut File) -> String {
    let mut captured = String::new();
    if log.seek(SeekFrom::Start(0)).is_ok() {
        let _ = log.read_to_string(&mut captured);
    }
    captured.trim().to_string()
}

/// Stop stages that were already started before a later one failed to spawn
fn abandon(running: Vec<(String, Child, File)>) {
    for (_, mut child, _) in running {
        let _ = child.kill();
        let _ = child.wait();
    }
}
