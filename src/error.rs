use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single host's task.
#[derive(Error, Debug)]
pub enum LlshError {
    #[error("SSH protocol error: {0}")]
    Ssh(#[from] russh::Error),
    #[error("Failed to decode private key: {0}")]
    Key(#[from] russh::keys::Error),
    #[error("Failed to execute local command: {0}")]
    Io(#[from] std::io::Error),
    #[error("can't read from the terminal: {0}")]
    Prompt(std::io::Error),
    #[error("couldn't read the content of private key {path}: {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("none available auth methods")]
    NoAuthMethods,
    #[error("authentication failed for user '{0}'")]
    AuthFailed(String),
    #[error("timed out connecting to {0} after {1}s")]
    Timeout(String, u64),
    #[error("failed to run: remote command exited with status {status}{}", stderr_suffix(.stderr))]
    RemoteExit { status: u32, stderr: String },
    #[error("failed to run: remote command ended without an exit status")]
    NoExitStatus,
    #[error("fail to exec command: {output}")]
    Command { output: String },
    #[error("task for {0} panicked or was aborted")]
    Join(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Invalid combination of command line flags.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("hosts can't be empty")]
    NoHosts,
    #[error("can't use both public key and password")]
    KeyAndPassword,
    #[error("command can't be empty")]
    EmptyCommand,
}

/// Problems reading or querying a host file.
#[derive(Error, Debug)]
pub enum HostFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("section '{0}' does not exist")]
    NoSuchSection(String),
    #[error("invalid host '{0}': {1}")]
    InvalidHost(String, String),
    #[error("no hosts found")]
    Empty,
}
