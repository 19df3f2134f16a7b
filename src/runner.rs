//! Fan-out/join over hosts.
//!
//! Every task gets its own tokio task. Results land in a shared list behind a
//! lock, and nothing is printed until every host has answered.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use futures::future::join_all;
use tokio::sync::Mutex;

use crate::error::LlshError;
use crate::executor::Executor;
use crate::host::Host;
use crate::task::Task;

#[derive(Debug)]
pub struct HostResult {
    pub host: Host,
    /// Command output, or a failure description.
    pub output: String,
    pub error: Option<LlshError>,
}

impl HostResult {
    pub fn new(host: Host, outcome: Result<String, LlshError>) -> Self {
        match outcome {
            Ok(output) => Self {
                host,
                output,
                error: None,
            },
            Err(error) => Self {
                host,
                output: format!("fail to execute task: {}", error),
                error: Some(error),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Runner {
    executor: Arc<dyn Executor>,
}

impl Runner {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Runs every task concurrently and waits for all of them.
    ///
    /// Results come back in the order the tasks were given.
    pub async fn run(&self, tasks: Vec<Task>) -> Vec<HostResult> {
        let results = Arc::new(Mutex::new(Vec::with_capacity(tasks.len())));
        let mut hosts = Vec::with_capacity(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            hosts.push(task.host.clone());
            let executor = Arc::clone(&self.executor);
            let results = Arc::clone(&results);
            handles.push(tokio::spawn(async move {
                log::debug!("[{}] running '{}'", task.host, task.script);
                let outcome = executor.execute(&task).await;
                match &outcome {
                    Ok(_) => log::info!("[{}] done", task.host),
                    Err(e) => log::warn!("[{}] failed: {}", task.host, e),
                }
                results
                    .lock()
                    .await
                    .push((index, HostResult::new(task.host, outcome)));
            }));
        }

        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                log::warn!("[{}] task did not finish: {}", hosts[index], e);
                let host = hosts[index].clone();
                let error = LlshError::Join(host.to_string());
                results
                    .lock()
                    .await
                    .push((index, HostResult::new(host, Err(error))));
            }
        }

        let mut results = std::mem::take(&mut *results.lock().await);
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

/// Writes a green (success) or red (failure) header per host, followed by
/// its output.
pub fn print_results<W: Write>(results: &[HostResult], mut writer: W) -> std::io::Result<()> {
    for result in results {
        let header = format!("Host {}", result.host);
        if result.is_success() {
            writeln!(writer, "{}", header.green())?;
        } else {
            writeln!(writer, "{}", header.red())?;
        }
        let output = result.output.trim_end_matches('\n');
        if !output.is_empty() {
            writeln!(writer, "{}", output)?;
        }
    }
    writer.flush()
}

/// Counts of (succeeded, failed) hosts.
pub fn summary(results: &[HostResult]) -> (usize, usize) {
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    (succeeded, results.len() - succeeded)
}
