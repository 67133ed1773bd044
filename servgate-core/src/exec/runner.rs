//! Process launching: one child per invocation, argument vector only, bounded by a timeout.

use crate::error::GatewayError;
use crate::models::CommandOutcome;
use futures::future::BoxFuture;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Program plus discrete arguments. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs an [`Invocation`] and reports how it ended.
///
/// Implementations never return an error: anything that goes wrong becomes a
/// failed [`CommandOutcome`].
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        timeout: Duration,
    ) -> BoxFuture<'a, CommandOutcome>;
}

/// Spawns real processes via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        timeout: Duration,
    ) -> BoxFuture<'a, CommandOutcome> {
        let invocation = invocation.clone();
        // 子进程放在独立任务里：请求被丢弃时命令照常跑完，只有超时会杀掉它
        let task = tokio::spawn(run_to_completion(invocation, timeout));
        Box::pin(async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "command task aborted");
                    CommandOutcome::failed(GatewayError::ExecutionFailure(e.to_string()))
                }
            }
        })
    }
}

async fn run_to_completion(invocation: Invocation, timeout: Duration) -> CommandOutcome {
    // kill_on_drop reaps the child when the timeout drops the wait future.
    let child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let child = match child {
        Ok(c) => c,
        Err(e) => {
            warn!(program = %invocation.program, error = %e, "failed to launch command");
            return CommandOutcome::failed(GatewayError::ExecutionFailure(e.to_string()));
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => CommandOutcome::exited(
            output.status.code(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ),
        Ok(Err(e)) => CommandOutcome::failed(GatewayError::ExecutionFailure(e.to_string())),
        Err(_) => {
            warn!(command = %invocation, ?timeout, "command timed out");
            CommandOutcome::failed(GatewayError::ExecutionTimeout(timeout))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
        }
    }

    #[tokio::test]
    async fn captures_exit_code_and_streams() {
        let outcome = SystemRunner
            .run(&sh("echo out; echo err >&2; exit 3"), Duration::from_secs(10))
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let outcome = SystemRunner
            .run(&sh("echo ok"), Duration::from_secs(10))
            .await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.exit_code, Some(0));
    }

    #[tokio::test]
    async fn arguments_are_not_shell_expanded() {
        let invocation = Invocation {
            program: "echo".into(),
            args: vec!["$(id);".into(), "a|b".into()],
        };
        let outcome = SystemRunner.run(&invocation, Duration::from_secs(10)).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.stdout, "$(id); a|b\n");
    }

    #[tokio::test]
    async fn missing_program_is_a_failure() {
        let invocation = Invocation {
            program: "/nonexistent/servgate-helper".into(),
            args: vec![],
        };
        let outcome = SystemRunner.run(&invocation, Duration::from_secs(10)).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, None);
        assert!(matches!(
            outcome.failure,
            Some(GatewayError::ExecutionFailure(_))
        ));
    }

    #[tokio::test]
    async fn slow_command_times_out_without_output() {
        let outcome = SystemRunner
            .run(&sh("echo partial; sleep 5"), Duration::from_millis(200))
            .await;
        assert!(!outcome.succeeded);
        assert!(outcome.stdout.is_empty());
        assert_eq!(
            outcome.failure,
            Some(GatewayError::ExecutionTimeout(Duration::from_millis(200)))
        );
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("done");
        let script = format!("sleep 0.5; touch '{}'", marker.display());

        let early = tokio::time::timeout(
            Duration::from_millis(100),
            SystemRunner.run(&sh(&script), Duration::from_secs(30)),
        )
        .await;
        assert!(early.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(marker.exists());
    }
}
