use std::ffi::OsStr;
use std::fmt::Debug;
use std::process::{ExitStatus, Output};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),

    #[error("Command exited with {status}: {diagnostics}")]
    Failed {
        status: ExitStatus,
        diagnostics: String,
    },
}

/// Runs external programs directly from an argument vector, never through a shell.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn execute<S>(&self, program: &str, args: &[S]) -> Result<Output, ExecutionError>
    where
        S: AsRef<OsStr> + Debug,
    {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %program,
            args = ?args,
            timeout_secs = %self.timeout.as_secs(),
            "Executing command"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ExecutionError::TimedOut(self.timeout))?
            .map_err(|source| ExecutionError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let diagnostics = diagnostics(&output);
            tracing::error!(
                program = %program,
                status = %output.status,
                stderr = %diagnostics,
                "Command failed"
            );
            return Err(ExecutionError::Failed {
                status: output.status,
                diagnostics,
            });
        }

        tracing::debug!(
            program = %program,
            output_size = output.stdout.len(),
            "Command succeeded"
        );

        Ok(output)
    }
}

/// stderr if the program wrote any, otherwise stdout.
fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor() -> CommandExecutor {
        CommandExecutor::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn successful_command_returns_output() {
        let output = executor().execute("echo", &["hello"]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        let output = executor()
            .execute("echo", &["'quoted' $(whoami) ; ls"])
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).trim(),
            "'quoted' $(whoami) ; ls"
        );
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let err = executor()
            .execute("sh", &["-c", "echo 'no route to host' >&2; exit 4"])
            .await
            .unwrap_err();
        match err {
            ExecutionError::Failed {
                status,
                diagnostics,
            } => {
                assert_eq!(status.code(), Some(4));
                assert_eq!(diagnostics, "no route to host");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = executor()
            .execute("definitely-not-an-installed-downloader", &["x"])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let err = CommandExecutor::new(Duration::from_millis(100))
            .execute("sleep", &["5"])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::TimedOut(_)));
    }
}
