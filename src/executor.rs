//! Executors run a task's script on its host.
//!
//! `CommandExecutor` shells out to a local ssh binary. The in-process
//! client lives in [`crate::native`].

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::LlshError;
use crate::task::Task;

#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs `task.script` on `task.host` and returns its output.
    async fn execute(&self, task: &Task) -> Result<String, LlshError>;
}

/// Runs `<ssh_path> [options] <host> <script>` and captures stdout and
/// stderr into one buffer, in arrival order.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    ssh_path: String,
}

impl CommandExecutor {
    pub fn new(ssh_path: impl Into<String>) -> Self {
        Self {
            ssh_path: ssh_path.into(),
        }
    }

    fn command(&self, task: &Task) -> Command {
        let mut command = Command::new(&self.ssh_path);
        if task.host.user.is_none() {
            if let Some(user) = task.user() {
                command.arg("-l").arg(user);
            }
        }
        if let Some(port) = task.explicit_port() {
            command.arg("-p").arg(port.to_string());
        }
        if let Some(timeout) = task.timeout {
            command
                .arg("-o")
                .arg(format!("ConnectTimeout={}", timeout.as_secs().max(1)));
        }
        command
            .arg(task.host.destination())
            .arg(&task.script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn execute(&self, task: &Task) -> Result<String, LlshError> {
        log::debug!("[{}] exec {} '{}'", task.host, self.ssh_path, task.script);
        let mut child = self.command(task).spawn()?;
        let output = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => read_combined(stdout, stderr).await?,
            _ => Vec::new(),
        };
        let status = child.wait().await?;
        let output = String::from_utf8_lossy(&output).into_owned();
        if status.success() {
            Ok(output)
        } else {
            log::warn!("[{}] {} exited with {}", task.host, self.ssh_path, status);
            Err(LlshError::Command { output })
        }
    }
}

/// Drains two streams into one buffer as data arrives on either.
async fn read_combined<A, B>(mut first: A, mut second: B) -> std::io::Result<Vec<u8>>
where
    A: AsyncRead + Unpin,
    B: AsyncRead + Unpin,
{
    let mut combined = Vec::new();
    let mut first_buf = [0u8; 4096];
    let mut second_buf = [0u8; 4096];
    let (mut first_done, mut second_done) = (false, false);
    while !(first_done && second_done) {
        tokio::select! {
            n = first.read(&mut first_buf), if !first_done => match n? {
                0 => first_done = true,
                n => combined.extend_from_slice(&first_buf[..n]),
            },
            n = second.read(&mut second_buf), if !second_done => match n? {
                0 => second_done = true,
                n => combined.extend_from_slice(&second_buf[..n]),
            },
        }
    }
    Ok(combined)
}
