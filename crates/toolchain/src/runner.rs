//! External process execution.
//!
//! Every adapter that shells out (`npx`, `git`) goes through [`CommandRunner`]
//! so tests can replace real processes with scripted output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use pipeline::ToolError;

/// Longest stderr excerpt carried in a [`ToolError::CommandFailed`].
const STDERR_EXCERPT_LEN: usize = 4000;

/// A program invocation.
///
/// Neither `Display` nor `Debug` shows environment values, so credentials
/// belong in [`CommandSpec::env`], never in `args`.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to run, looked up on `PATH`.
    pub program: String,
    /// Arguments, passed verbatim (no shell).
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Extra environment variables for the child process.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// A command with no arguments, run in `cwd`.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Sets an environment variable for the child process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env", &self.env.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` for exit code zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts an unsuccessful output into a [`ToolError::CommandFailed`].
    pub fn into_error(self, spec: &CommandSpec) -> ToolError {
        let stderr = if self.stderr.trim().is_empty() {
            self.stdout
        } else {
            self.stderr
        };
        ToolError::CommandFailed {
            program: spec.program.clone(),
            code: self.code,
            stderr: tail(stderr.trim(), STDERR_EXCERPT_LEN).to_string(),
        }
    }

    /// Returns `self` when successful, the matching error otherwise.
    pub fn check(self, spec: &CommandSpec) -> Result<Self, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(self.into_error(spec))
        }
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Runs external programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `spec` to completion and captures its output.
    ///
    /// A non-zero exit is **not** an error here; callers decide what it means.
    /// Only a failure to start the process is.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        tracing::debug!(command = %spec, cwd = %spec.cwd.display(), "Running command");
        let output = tokio::process::Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::CommandFailed {
                program: spec.program.clone(),
                code: None,
                stderr: format!("could not start process: {e}"),
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command = %spec.program, code = ?result.code, "Command finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_prefer_stderr_and_keep_the_tail() {
        let spec = CommandSpec::new("npx", ".").arg("typedoc");
        let out = CommandOutput {
            code: Some(1),
            stdout: "progress".to_string(),
            stderr: format!("{}the end", "x".repeat(STDERR_EXCERPT_LEN)),
        };
        let ToolError::CommandFailed { program, code, stderr } = out.into_error(&spec) else {
            panic!("expected a command failure");
        };
        assert_eq!(program, "npx");
        assert_eq!(code, Some(1));
        assert_eq!(stderr.len(), STDERR_EXCERPT_LEN);
        assert!(stderr.ends_with("the end"));
    }

    #[test]
    fn failures_fall_back_to_stdout() {
        let spec = CommandSpec::new("git", ".");
        let out = CommandOutput {
            code: Some(128),
            stdout: "fatal: not a git repository".to_string(),
            stderr: "  ".to_string(),
        };
        assert!(out.into_error(&spec).to_string().contains("not a git repository"));
    }

    #[test]
    fn specs_display_as_a_command_line() {
        let spec = CommandSpec::new("git", "/tmp").args(["push", "origin"]);
        assert_eq!(spec.to_string(), "git push origin");
    }

    #[test]
    fn environment_values_stay_out_of_display_and_debug() {
        let spec = CommandSpec::new("git", "/tmp")
            .arg("fetch")
            .env("TBDOCS_GIT_TOKEN", "s3cr3t");
        assert_eq!(spec.to_string(), "git fetch");
        let debug = format!("{spec:?}");
        assert!(debug.contains("TBDOCS_GIT_TOKEN"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn command_logs_leave_out_environment_values() {
        let logs = crate::testing::LogCapture::default();
        let _guard = logs.install();
        let spec = CommandSpec::new("tbdocs-definitely-not-a-program", ".")
            .arg("ls-remote")
            .env("TBDOCS_GIT_TOKEN", "s3cr3t");

        let _ = ProcessRunner.run(&spec).await;

        let out = logs.contents();
        assert!(out.contains("tbdocs-definitely-not-a-program ls-remote"));
        assert!(!out.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn missing_programs_are_command_failures() {
        let spec = CommandSpec::new("tbdocs-definitely-not-a-program", ".");
        let err = ProcessRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed { code: None, .. }));
    }
}
