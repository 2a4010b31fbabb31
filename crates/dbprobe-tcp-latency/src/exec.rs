//! Running an external command under a wall-clock deadline.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tracing::{debug, error, warn};

/// How long to keep reading output after the child has exited.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// How a bounded command run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exited successfully before the deadline; carries stdout.
    Completed(String),
    /// Could not be started, or exited unsuccessfully; carries the error text.
    Failed(String),
    /// Still running at the deadline. It has been killed and reaped.
    TimedOut,
}

/// Run `program` with `args`, returning its stdout if it exits successfully
/// within `timeout`.
///
/// Past the deadline the child is killed and waited for before this returns,
/// so no zombie is left behind.
pub fn run_with_deadline(program: &Path, args: &[String], timeout: Duration) -> CommandOutcome {
    let command_line = render(program, args);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build runtime for '{}': {}", command_line, e);
            return CommandOutcome::Failed(format!("Command '{}' could not be run: {}", command_line, e));
        }
    };

    runtime.block_on(wait_with_deadline(program, args, timeout, &command_line))
}

async fn wait_with_deadline(
    program: &Path,
    args: &[String],
    timeout: Duration,
    command_line: &str,
) -> CommandOutcome {
    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            error!("Failed to start '{}': {}", command_line, e);
            return CommandOutcome::Failed(format!("Command '{}' failed to start: {}", command_line, e));
        }
    };
    debug!("Started '{}' (pid {:?})", command_line, child.id());

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out = Vec::new();
    let mut err = Vec::new();

    // The deadline covers process exit only. Pipes are drained alongside so a
    // chatty child cannot block on a full pipe.
    let exited = tokio::time::timeout(timeout, async {
        tokio::select! {
            _ = child.wait() => {}
            _ = drain_both(stdout.as_mut(), stderr.as_mut(), &mut out, &mut err) => {}
        }
        child.wait().await
    })
    .await;

    let status = match exited {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            return CommandOutcome::Failed(format!("Command '{}' failed: {}", command_line, e));
        }
        Err(_) => {
            // kill() sends SIGKILL and then waits, which reaps the child.
            if let Err(e) = child.kill().await {
                warn!("Failed to kill '{}': {}", command_line, e);
            }
            warn!("The command '{}' timed out after {:?}", command_line, timeout);
            return CommandOutcome::TimedOut;
        }
    };

    // A descendant may still hold the pipes open after the child exits.
    let drained = tokio::time::timeout(
        PIPE_DRAIN_GRACE,
        drain_both(stdout.as_mut(), stderr.as_mut(), &mut out, &mut err),
    )
    .await;
    if drained.is_err() {
        warn!(
            "'{}' exited but its output is still held open, using what was read",
            command_line
        );
    }

    let out = String::from_utf8_lossy(&out).into_owned();
    let err = String::from_utf8_lossy(&err);

    if status.success() {
        CommandOutcome::Completed(out)
    } else {
        let code = status
            .code()
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        let output = err.lines().collect::<Vec<_>>().join("\n ");
        CommandOutcome::Failed(format!(
            "Command '{}' failed. Return code: {}.\nOutput:\n {}.",
            command_line, code, output
        ))
    }
}

async fn drain_both(
    stdout: Option<&mut ChildStdout>,
    stderr: Option<&mut ChildStderr>,
    out: &mut Vec<u8>,
    err: &mut Vec<u8>,
) {
    tokio::join!(drain(stdout, out), drain(stderr, err));
}

/// Read `pipe` to EOF into `buf`. Safe to cancel and resume: every chunk read
/// is already in `buf`.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) {
    let Some(pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) => {
                debug!("Failed to read child output: {}", e);
                break;
            }
        }
    }
}

fn render(program: &Path, args: &[String]) -> String {
    std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::fake_netperf;
    use std::time::Instant;

    #[test]
    fn test_completed_returns_stdout() {
        let fake = fake_netperf("echo TCP,667.240,785,970");
        let outcome = run_with_deadline(&fake.path, &[], Duration::from_secs(5));
        assert_eq!(outcome, CommandOutcome::Completed("TCP,667.240,785,970\n".to_string()));
    }

    #[test]
    fn test_args_are_passed_through() {
        let fake = fake_netperf("echo \"$@\"");
        let args = vec!["-H".to_string(), "db1".to_string()];
        let outcome = run_with_deadline(&fake.path, &args, Duration::from_secs(5));
        assert_eq!(outcome, CommandOutcome::Completed("-H db1\n".to_string()));
    }

    #[test]
    fn test_nonzero_exit_is_failure() {
        let fake = fake_netperf("echo 'establish control: are you sure there is a netserver' >&2\nexit 3");
        match run_with_deadline(&fake.path, &[], Duration::from_secs(5)) {
            CommandOutcome::Failed(msg) => {
                assert!(msg.contains("Return code: 3"), "{}", msg);
                assert!(msg.contains("establish control"), "{}", msg);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_binary_is_failure() {
        let outcome = run_with_deadline(Path::new("/nonexistent/netperf"), &[], Duration::from_secs(1));
        assert!(matches!(outcome, CommandOutcome::Failed(ref msg) if msg.contains("failed to start")));
    }

    #[test]
    fn test_timeout_kills_and_reaps() {
        let fake = fake_netperf("echo $$ > \"$(dirname \"$0\")/pid\"\nexec sleep 10");
        let started = Instant::now();
        let outcome = run_with_deadline(&fake.path, &[], Duration::from_secs(1));
        let elapsed = started.elapsed();

        assert_eq!(outcome, CommandOutcome::TimedOut);
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);

        let pid = std::fs::read_to_string(fake.dir.path().join("pid")).unwrap();
        let pid = pid.trim();
        assert!(!pid.is_empty());
        #[cfg(target_os = "linux")]
        assert!(
            !Path::new("/proc").join(pid).exists(),
            "process {} is still present",
            pid
        );
    }

    #[test]
    fn test_background_descendant_does_not_cause_timeout() {
        let fake = fake_netperf("sleep 3 &\necho TCP,1.0,2,3");
        let started = Instant::now();
        let outcome = run_with_deadline(&fake.path, &[], Duration::from_secs(2));

        assert_eq!(outcome, CommandOutcome::Completed("TCP,1.0,2,3\n".to_string()));
        assert!(started.elapsed() < Duration::from_millis(1500), "took {:?}", started.elapsed());
    }

    #[test]
    fn test_large_output_is_not_blocked() {
        let fake = fake_netperf("i=0\nwhile [ $i -lt 20000 ]; do echo TCP,1.0,2,3; i=$((i+1)); done");
        match run_with_deadline(&fake.path, &[], Duration::from_secs(10)) {
            CommandOutcome::Completed(out) => assert_eq!(out.lines().count(), 20000),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_render() {
        let args = vec!["-l".to_string(), "1".to_string()];
        assert_eq!(render(Path::new("/usr/bin/netperf"), &args), "/usr/bin/netperf -l 1");
    }
}
