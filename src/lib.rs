//! llsh: Run One Shell Command on Many Hosts over SSH.

// Command line arguments and configuration.
pub mod config;
// How to parse and represent hosts.
pub mod host;
// Credentials for native mode.
pub mod auth;
// The per-host unit of work.
pub mod task;
// Executor trait and the ssh binary executor.
pub mod executor;
// In-process SSH executor.
pub mod native;
// Fan-out/join and result printing.
pub mod runner;
// Error handling.
pub mod error;
#[cfg(test)]
mod test_keys;

pub use config::Config;
pub use error::{ConfigError, HostFileError, LlshError};
pub use executor::{CommandExecutor, Executor};
pub use host::{parse_host_list, resolve_hosts, Host, Inventory};
pub use native::NativeExecutor;
pub use runner::{print_results, summary, HostResult, Runner};
pub use task::{AuthMethod, ExecMode, Task};
