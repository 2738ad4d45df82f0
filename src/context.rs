use std::{net::SocketAddr, path::PathBuf, time::Duration};

use crate::cli::Cli;

pub const DB_FILE_NAME: &str = "usergroups.sqlite";

/// Runtime settings resolved from the command line and environment.
#[derive(Clone, Debug)]
pub struct Context {
    pub data_dir: PathBuf,
    pub api_listen: SocketAddr,
    pub log_file: Option<PathBuf>,
    pub busy_timeout: Duration,
    pub reset: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            api_listen: cli.api_listen,
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
            reset: cli.reset,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}
