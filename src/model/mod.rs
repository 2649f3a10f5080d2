//! Model invocation.
//!
//! The pipeline only needs "system prompt + user prompt in, raw text out".
//! [`CommandModel`] satisfies that by running an external program, which
//! keeps provider selection, credentials and retries outside this crate.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::ModelResponse;
use crate::extract::split_reasoning;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no model command configured")]
    NotConfigured,

    #[error("failed to run model command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Turns a system prompt and a user prompt into a model reply.
pub trait ModelService {
    fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<ModelResponse, ModelError>;
}

/// Model backed by an external command.
///
/// The command receives `{"system": ..., "user": ...}` as JSON on stdin and
/// must print the raw reply on stdout. A leading `<think>` block in the
/// reply is split off as reasoning.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    args: Vec<String>,
}

impl CommandModel {
    /// Build from an argv list; the first element is the program.
    pub fn from_argv(argv: &[String]) -> Result<Self, ModelError> {
        let (program, args) = argv.split_first().ok_or(ModelError::NotConfigured)?;
        Ok(Self { program: program.clone(), args: args.to_vec() })
    }
}

impl ModelService for CommandModel {
    fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<ModelResponse, ModelError> {
        let payload = json!({ "system": system_prompt, "user": user_prompt }).to_string();
        debug!(program = %self.program, bytes = payload.len(), "invoking model command");

        let spawn_err = |source| ModelError::Spawn { program: self.program.clone(), source };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // Feed stdin from another thread so a chatty child cannot fill its
        // stdout pipe while we are still writing the prompt.
        let stdin = child.stdin.take();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(payload.as_bytes()) {
                // The command may answer without reading its input; the exit
                // status and stdout decide the outcome.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        });

        let output = child.wait_with_output().map_err(spawn_err)?;
        match writer.join() {
            Ok(result) => result.map_err(spawn_err)?,
            Err(_) => {
                return Err(ModelError::Failed {
                    status: "writer panic".to_string(),
                    stderr: String::new(),
                })
            }
        }

        if !output.status.success() {
            return Err(ModelError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let response = split_reasoning(&raw);
        info!(
            response_bytes = response.response_text.len(),
            has_reasoning = response.reasoning_text.is_some(),
            "model replied"
        );
        Ok(response)
    }
}
