//! CLI module graph and command dispatch.

pub mod check;
pub mod command;
pub mod manage;
pub mod output;
pub mod overview;
pub mod records;
pub mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::infrastructure::config::Config;
use command::{CheckCommand, Cli, Commands};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Load the configuration named on the command line.
///
/// An explicit path must exist. Without one, `config.toml` in the working
/// directory is used when present and the built-in defaults otherwise. The
/// returned path is `None` for the defaults.
#[allow(clippy::result_large_err)]
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((Config::load(path)?, Some(path.to_path_buf())));
    }
    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        Ok((Config::load(default)?, Some(default.to_path_buf())))
    } else {
        Ok((Config::default(), None))
    }
}

/// Run one parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let (config, source) = load_config(cli.config.as_deref())?;
    config.logging.clone().with_verbosity(cli.verbose).init();
    debug!(config = ?source, "Configuration loaded");

    match cli.command {
        Commands::Watch => overview::execute_watch(&config).await,
        Commands::Overview(args) => {
            overview::execute_overview(&config, Duration::from_secs(args.timeout)).await
        }
        Commands::Login(args) => session::execute_login(&config, args).await,
        Commands::Logout => session::execute_logout(&config),
        Commands::List(args) => records::execute_list(&config, args.kind).await,
        Commands::Payments(args) => records::execute_payments(&config, &args.loan_id).await,
        Commands::Signup(args) => manage::execute_signup(&config, args).await,
        Commands::Add(command) => manage::execute_add(&config, command).await,
        Commands::Update(command) => manage::execute_update(&config, command).await,
        Commands::Delete(args) => manage::execute_delete(&config, args).await,
        Commands::Check(CheckCommand::Config) => {
            check::config::execute_config(&config, source.as_deref())
        }
        Commands::Check(CheckCommand::Connection) => {
            check::connection::execute_connection(&config).await
        }
    }
}
