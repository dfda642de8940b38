//! The boundary to the external programs.
//!
//! Every step of the pipeline describes its command as an [Invocation] and hands it to a [ToolRunner].
//! The runner blocks until the program exits and turns anything other than a clean exit into an error.
use crate::errors::{PolishError, Result};
use definitions::PipelineState;
use log::*;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command line of an external tool, tagged by the state issuing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub state: PipelineState,
    pub program: String,
    pub args: Vec<OsString>,
    /// If some, the stdout of the program is written (truncated) to this path.
    pub stdout: Option<PathBuf>,
}

impl Invocation {
    pub fn new(state: PipelineState, program: &str) -> Self {
        Self {
            state,
            program: program.to_string(),
            args: vec![],
            stdout: None,
        }
    }
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }
    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout = Some(path.to_path_buf());
        self
    }
    /// The first argument, i.e., the sub-command of samtools/nanopolish.
    pub fn subcommand(&self) -> Option<&OsStr> {
        self.args.first().map(|a| a.as_os_str())
    }
    /// The value following `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|a| a.as_os_str())
    }
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in self.args.iter() {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        if let Some(path) = self.stdout.as_ref() {
            line.push_str(&format!(" > {}", path.display()));
        }
        line
    }
}

/// Something that executes invocations one at a time.
pub trait ToolRunner {
    /// Run the program to completion. Ok only if it exited with status zero.
    fn run(&mut self, invocation: &Invocation) -> Result<()>;
}

/// Run the tools as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        debug!("RUN\t{}\t{}", invocation.state, invocation.command_line());
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped());
        match invocation.stdout.as_ref() {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .map_err(|e| PolishError::resource(format!("{}", path.display()), e))?;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::null());
            }
        }
        let output = command.output().map_err(|source| PolishError::ToolLaunch {
            state: invocation.state,
            program: invocation.program.clone(),
            source,
        })?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if output.status.success() {
            if !stderr.is_empty() {
                trace!("STDERR\t{}\t{}", invocation.program, stderr);
            }
            Ok(())
        } else {
            Err(PolishError::ExternalTool {
                state: invocation.state,
                command: invocation.command_line(),
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}

/// Count the invocations handed to another runner, failed ones included.
#[derive(Debug)]
pub struct CountingRunner<'a, R: ToolRunner> {
    inner: &'a mut R,
    count: usize,
}

impl<'a, R: ToolRunner> CountingRunner<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self { inner, count: 0 }
    }
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<'a, R: ToolRunner> ToolRunner for CountingRunner<'a, R> {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.count += 1;
        self.inner.run(invocation)
    }
}
