//! In-process SSH client built on russh.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::{ssh_key, PrivateKeyWithHashAlg};
use russh::{ChannelMsg, Disconnect};

use crate::error::LlshError;
use crate::executor::Executor;
use crate::task::{AuthMethod, Task};

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeExecutor;

/// Narrows the configured methods to the ones actually offered.
///
/// Passwords accumulate, but a private key replaces everything collected so
/// far: key authentication is never mixed with anything else.
pub fn effective_auth_methods(methods: &[AuthMethod]) -> Result<Vec<AuthMethod>, LlshError> {
    let mut effective = vec![];
    for method in methods {
        match method {
            AuthMethod::Password(_) => effective.push(method.clone()),
            AuthMethod::PrivateKey(_) => effective = vec![method.clone()],
        }
    }
    if effective.is_empty() {
        return Err(LlshError::NoAuthMethods);
    }
    Ok(effective)
}

#[async_trait]
impl Executor for NativeExecutor {
    async fn execute(&self, task: &Task) -> Result<String, LlshError> {
        let methods = effective_auth_methods(&task.auth_methods)?;
        let user = match task.user() {
            Some(user) => user.to_string(),
            None => std::env::var("USER").unwrap_or_default(),
        };
        let port = task.port();
        log::debug!("[{}] connecting to port {} as '{}'", task.host, port, user);

        let config = Arc::new(client::Config::default());
        let connect = client::connect(config, (task.host.hostname.as_str(), port), AcceptAnyHostKey);
        let mut session = match task.timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| LlshError::Timeout(task.host.to_string(), timeout.as_secs()))??,
            None => connect.await?,
        };

        authenticate(&mut session, &user, &methods).await?;
        let result = run_script(&session, &task.script).await;
        if let Err(e) = session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            log::debug!("[{}] error while disconnecting: {}", task.host, e);
        }
        result
    }
}

async fn authenticate(
    session: &mut Handle<AcceptAnyHostKey>,
    user: &str,
    methods: &[AuthMethod],
) -> Result<(), LlshError> {
    for method in methods {
        let accepted = match method {
            AuthMethod::Password(password) => {
                log::debug!("trying password authentication for '{}'", user);
                session.authenticate_password(user, password).await?
            }
            AuthMethod::PrivateKey(key) => {
                log::debug!("trying public key authentication for '{}'", user);
                let hash_alg = session.best_supported_rsa_hash().await?.flatten();
                session
                    .authenticate_publickey(
                        user,
                        PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg),
                    )
                    .await?
            }
        };
        if accepted.success() {
            return Ok(());
        }
    }
    Err(LlshError::AuthFailed(user.to_string()))
}

/// Runs one command on a fresh session channel. Only stdout is returned;
/// stderr is kept for the error message.
async fn run_script(session: &Handle<AcceptAnyHostKey>, script: &str) -> Result<String, LlshError> {
    let mut channel = session.channel_open_session().await?;
    channel.exec(true, script).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_status = None;
    // The exit status may arrive before the last data, so read until the
    // channel closes.
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
            ChannelMsg::ExtendedData { ref data, ext } => {
                if ext == 1 {
                    stderr.extend_from_slice(data);
                }
            }
            ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
            _ => {}
        }
    }

    match exit_status {
        Some(0) => Ok(String::from_utf8_lossy(&stdout).into_owned()),
        Some(status) => Err(LlshError::RemoteExit {
            status,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }),
        None => Err(LlshError::NoExitStatus),
    }
}

/// Accepts every server host key.
#[derive(Debug)]
struct AcceptAnyHostKey;

impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        async { Ok(true) }
    }
}
