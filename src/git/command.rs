//! Running the `git` binary with a deadline
//!
//! Every invocation sets `GIT_TERMINAL_PROMPT=0` so credential prompts fail
//! instead of hanging. A child that outlives its timeout is killed. Helpers it
//! spawned (ssh, remote helpers) may keep the output pipes open, so output is
//! drained on detached threads and never waited on past the deadline.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for output after the child has exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How a git invocation ended
#[derive(Debug)]
pub enum Outcome {
    Completed { success: bool, output: String },
    TimedOut,
}

/// Render args as a shell-like command line for error messages
pub fn display_command(args: &[&str]) -> String {
    let mut parts = vec!["git".to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}

/// Run `git <args>` in `cwd` (or the current directory), killing it after `timeout`
pub fn run(args: &[&str], cwd: Option<&Path>, timeout: Duration) -> std::io::Result<Outcome> {
    run_program("git", args, cwd, timeout)
}

fn run_program(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> std::io::Result<Outcome> {
    let mut command = Command::new(program);
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            kill(&mut child);
            return Ok(Outcome::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    };

    let mut output = stdout.recv_timeout(DRAIN_GRACE).unwrap_or_default();
    output.push_str(&stderr.recv_timeout(DRAIN_GRACE).unwrap_or_default());
    Ok(Outcome::Completed {
        success: status.success(),
        output,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        let _ = tx.send(String::from_utf8_lossy(&buffer).into_owned());
    });
    rx
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!("failed to kill timed out git process: {e}");
    }
    let _ = child.wait();
}
