use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use itertools::Itertools;
use log::LevelFilter;

use llsh::{auth, print_results, resolve_hosts, summary, Config, ExecMode, Runner, Task};

fn fail(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("{}", message.to_string().red());
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Config::parse();

    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Warn))
        .init();

    match cli.validate() {
        Ok(warnings) => {
            for warning in warnings {
                eprintln!("{}", warning.yellow());
            }
        }
        Err(e) => return fail(e),
    }

    let auth_methods = match auth::auth_methods(&cli) {
        Ok(methods) => Arc::new(methods),
        Err(e) => return fail(e),
    };

    let hosts = match resolve_hosts(&cli) {
        Ok(hosts) => hosts,
        Err(e) => return fail(format!("Invalid hosts: {}", e)),
    };

    let mode = if cli.use_ssh_command {
        ExecMode::External {
            ssh_path: cli.ssh_command_path.clone(),
        }
    } else {
        ExecMode::Native
    };
    let tasks = hosts
        .into_iter()
        .map(|host| Task {
            username: cli.user.clone(),
            auth_methods: Arc::clone(&auth_methods),
            host,
            port: cli.port,
            script: cli.command.clone(),
            timeout: cli.timeout(),
            mode: mode.clone(),
        })
        .collect::<Vec<_>>();

    let results = Runner::new(mode.executor()).run(tasks).await;
    if let Err(e) = print_results(&results, std::io::stdout().lock()) {
        return fail(format!("Failed to print results: {}", e));
    }

    let (succeeded, failed) = summary(&results);
    if failed == 0 {
        return ExitCode::SUCCESS;
    }
    let failed_hosts = results
        .iter()
        .filter(|result| !result.is_success())
        .map(|result| result.host.to_string())
        .join(", ");
    eprintln!(
        "{}",
        format!(
            "{} succeeded, {} failed: {}",
            succeeded, failed, failed_hosts
        )
        .yellow()
    );
    ExitCode::FAILURE
}
