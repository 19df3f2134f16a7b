//! One host-targeted unit of work.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use russh::keys::PrivateKey;

use crate::error::LlshError;
use crate::executor::{CommandExecutor, Executor};
use crate::host::Host;
use crate::native::NativeExecutor;

/// Port used when neither the host nor the flags name one.
pub const DEFAULT_PORT: u16 = 22;

#[derive(Clone)]
pub enum AuthMethod {
    Password(String),
    PrivateKey(Arc<PrivateKey>),
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password(_) => write!(f, "Password(..)"),
            AuthMethod::PrivateKey(_) => write!(f, "PrivateKey(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecMode {
    /// Speak SSH in-process.
    Native,
    /// Shell out to a local ssh executable.
    External { ssh_path: String },
}

impl ExecMode {
    pub fn executor(&self) -> Arc<dyn Executor> {
        match self {
            ExecMode::Native => Arc::new(NativeExecutor),
            ExecMode::External { ssh_path } => Arc::new(CommandExecutor::new(ssh_path.clone())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    /// Login user, unless the host names its own.
    pub username: String,
    /// Shared by every task of a run.
    pub auth_methods: Arc<Vec<AuthMethod>>,
    pub host: Host,
    /// Port, unless the host names its own. 0 means the default port.
    pub port: u16,
    /// The shell command.
    pub script: String,
    /// Upper bound on connection establishment.
    pub timeout: Option<Duration>,
    pub mode: ExecMode,
}

impl Task {
    pub fn new(host: Host, script: impl Into<String>, mode: ExecMode) -> Self {
        Self {
            username: String::new(),
            auth_methods: Arc::new(vec![]),
            host,
            port: DEFAULT_PORT,
            script: script.into(),
            timeout: None,
            mode,
        }
    }

    /// The user to log in as; `None` leaves it to ssh's own configuration.
    pub fn user(&self) -> Option<&str> {
        match &self.host.user {
            Some(user) => Some(user),
            None if !self.username.is_empty() => Some(&self.username),
            None => None,
        }
    }

    /// The port to connect to.
    pub fn port(&self) -> u16 {
        match self.host.port {
            Some(port) => port,
            None if self.port == 0 => DEFAULT_PORT,
            None => self.port,
        }
    }

    /// A port that differs from what ssh would pick on its own.
    pub fn explicit_port(&self) -> Option<u16> {
        self.host
            .port
            .or(Some(self.port).filter(|&port| port != 0 && port != DEFAULT_PORT))
    }

    /// Runs the task with the executor for its mode.
    pub async fn execute(&self) -> Result<String, LlshError> {
        self.mode.executor().execute(self).await
    }
}
