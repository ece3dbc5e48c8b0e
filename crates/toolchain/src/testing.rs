//! Scripted [`CommandRunner`] for tests of code that shells out.
//!
//! Available to other crates through the `test-util` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pipeline::ToolError;

use crate::{CommandOutput, CommandRunner, CommandSpec};

/// Replays queued outputs in order; succeeds silently once the queue is empty.
pub struct ScriptedRunner {
    outputs: Mutex<VecDeque<CommandOutput>>,
    /// Every command run so far, in order.
    pub seen: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    /// A runner answering with `outputs`, one per command.
    pub fn new(outputs: Vec<CommandOutput>) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(outputs.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// The subcommand of every command seen (first argument that is neither
    /// a flag nor a `key=value` setting).
    pub fn subcommands(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|spec| {
                spec.args
                    .iter()
                    .find(|a| !a.starts_with('-') && !a.contains('='))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        self.seen.lock().unwrap().push(spec.clone());
        let next = self.outputs.lock().unwrap().pop_front();
        Ok(next.unwrap_or(CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        }))
    }
}

/// A successful output with `stdout`.
pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// A failed output with exit `code` and `stderr`.
pub fn failed(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// A runner that answers the first command with the given output.
pub fn scripted(code: i32, stdout: &str, stderr: &str) -> Arc<ScriptedRunner> {
    ScriptedRunner::new(vec![CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }])
}

/// Collects everything logged through `tracing` while installed.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Makes this capture the thread's default subscriber, at debug level,
    /// until the guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Everything logged so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
