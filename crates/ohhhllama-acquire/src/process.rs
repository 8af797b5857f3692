//! Subprocess execution for external tools.
//!
//! Every tool the pipeline shells out to (`huggingface-cli`, `wget`, the
//! llama.cpp converter, `ollama`, `docker`) goes through [`run_tool`], which
//! bounds the run with a timeout, kills the child if the future is dropped,
//! and folds stderr into the error so failures carry a diagnostic.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

/// Longest stderr excerpt kept in an error message.
const MAX_STDERR_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} is not installed")]
    NotFound { tool: String },

    #[error("failed to spawn {tool}: {reason}")]
    Spawn { tool: String, reason: String },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} timed out after {}s", .after.as_secs())]
    TimedOut { tool: String, after: Duration },
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Locate `program` on `PATH`, or accept it as-is when it is already a path.
pub fn locate(program: &str) -> Result<PathBuf, ToolError> {
    let as_path = PathBuf::from(program);
    if as_path.components().count() > 1 {
        return if as_path.is_file() {
            Ok(as_path)
        } else {
            Err(ToolError::NotFound {
                tool: program.to_string(),
            })
        };
    }
    which::which(program).map_err(|_| ToolError::NotFound {
        tool: program.to_string(),
    })
}

/// Run `cmd` to completion, failing on non-zero exit or timeout.
pub async fn run_tool(
    mut cmd: Command,
    tool: &str,
    timeout: Duration,
) -> Result<ToolOutput, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(target: "ohhhllama.process", tool, command = ?cmd.as_std(), "spawning tool");

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound {
                tool: tool.to_string(),
            }
        } else {
            ToolError::Spawn {
                tool: tool.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ToolError::Spawn {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?,
        Err(_) => {
            return Err(ToolError::TimedOut {
                tool: tool.to_string(),
                after: timeout,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let detail = if stderr.is_empty() { &stdout } else { &stderr };
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: tail(detail, MAX_STDERR_CHARS),
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

/// Last `max` characters of `text`.
fn tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}
