//! Configuration for llsh.
//!
//! Everything is driven by command line flags; there is no config file.
//! The underscore spellings of the long flags are kept as aliases so older
//! invocations such as `--host_file` keep working.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::error::ConfigError;

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "llsh executes the remote shell command on multiple remote servers"
)]
pub struct Config {
    /// The host names for remote server, split by comma, for example, host1,host2,host3
    #[arg(long, default_value = "")]
    pub hosts: String,

    /// The path of the host file (INI sections or YAML); if specified, hosts will be omitted
    #[arg(long, alias = "host_file")]
    pub host_file: Option<PathBuf>,

    /// The section of the host file, default to all hosts when not specified or empty
    #[arg(long, default_value = "")]
    pub section: String,

    /// The username for login user
    #[arg(long, short, default_value = "")]
    pub user: String,

    /// The command you need to run on the servers
    #[arg(long, short)]
    pub command: String,

    /// Use the ssh executable, like /bin/ssh
    #[arg(
        long,
        alias = "use_ssh_command",
        default_value_t = true,
        action = ArgAction::Set,
        value_name = "BOOL"
    )]
    pub use_ssh_command: bool,

    /// Read a password from the terminal
    #[arg(long, short)]
    pub password: bool,

    /// The file path of the private key, like ~/.ssh/id_rsa
    #[arg(long, short = 'k', alias = "publickey")]
    pub private_key: Option<PathBuf>,

    /// The file path of the ssh command, like /bin/ssh
    #[arg(long, alias = "ssh_command_path", default_value = "ssh")]
    pub ssh_command_path: String,

    /// SSH port used for hosts that don't name one
    #[arg(long, default_value = "22")]
    pub port: u16,

    /// Connection timeout in seconds. Giving 0 disables it.
    #[arg(long, default_value = "10")]
    pub timeout: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Config {
    /// Checks flag combinations. Returns warnings that don't stop the run.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.host_file.is_none() && self.hosts.trim().is_empty() {
            return Err(ConfigError::NoHosts);
        }
        if self.private_key.is_some() && self.password {
            return Err(ConfigError::KeyAndPassword);
        }
        if self.command.trim().is_empty() {
            return Err(ConfigError::EmptyCommand);
        }

        let mut warnings = vec![];
        if (self.private_key.is_some() || self.password) && self.use_ssh_command {
            warnings.push(
                "Public key or password option will be ignored when using ssh command".to_string(),
            );
        }
        Ok(warnings)
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("llsh").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--hosts", "a,b", "-c", "uptime"]);
        assert!(config.use_ssh_command);
        assert_eq!(config.ssh_command_path, "ssh");
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
        assert!(!config.password);
        assert!(config.private_key.is_none());
    }

    #[test]
    fn test_underscore_aliases() {
        let config = parse(&[
            "--host_file",
            "hosts.ini",
            "--use_ssh_command",
            "false",
            "--ssh_command_path",
            "/usr/bin/ssh",
            "--publickey",
            "id_rsa",
            "-c",
            "ls",
        ]);
        assert_eq!(config.host_file, Some(PathBuf::from("hosts.ini")));
        assert!(!config.use_ssh_command);
        assert_eq!(config.ssh_command_path, "/usr/bin/ssh");
        assert_eq!(config.private_key, Some(PathBuf::from("id_rsa")));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Config::try_parse_from(["llsh", "--hosts", "a"]).is_err());
    }

    #[test]
    fn test_validate_requires_hosts() {
        let config = parse(&["-c", "ls"]);
        assert_eq!(config.validate(), Err(ConfigError::NoHosts));
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let config = parse(&["--hosts", "a", "-c", "  "]);
        assert_eq!(config.validate(), Err(ConfigError::EmptyCommand));
    }

    #[test]
    fn test_validate_rejects_key_and_password() {
        let config = parse(&["--hosts", "a", "-c", "ls", "-p", "-k", "id_rsa"]);
        assert_eq!(config.validate(), Err(ConfigError::KeyAndPassword));
    }

    #[test]
    fn test_validate_key_and_password_reported_before_empty_command() {
        let config = parse(&["--hosts", "a", "-c", " ", "-p", "-k", "id_rsa"]);
        assert_eq!(config.validate(), Err(ConfigError::KeyAndPassword));
    }

    #[test]
    fn test_validate_warns_auth_ignored_with_ssh_command() {
        let config = parse(&["--hosts", "a", "-c", "ls", "-p"]);
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ignored"));
    }

    #[test]
    fn test_validate_native_password_no_warning() {
        let config = parse(&["--hosts", "a", "-c", "ls", "-p", "--use-ssh-command", "false"]);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = parse(&["--hosts", "a", "-c", "ls", "--timeout", "0"]);
        assert_eq!(config.timeout(), None);
    }
}
