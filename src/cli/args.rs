use clap::Parser;
use std::env;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Users, groups and group memberships over HTTP",
    long_about = "Serves users, groups and their memberships as JSON resources backed by a local SQLite database."
)]
pub struct Cli {
    #[arg(
        long,
        env = "USERGROUPS_DATA_DIR",
        default_value = ".usergroups/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "api-listen",
        env = "USERGROUPS_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8000",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "log-file",
        env = "USERGROUPS_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "busy-timeout-ms",
        env = "USERGROUPS_BUSY_TIMEOUT_MS",
        default_value_t = 5_000u64,
        value_name = "MS",
        help = "How long a transaction waits for a locked database before failing"
    )]
    pub busy_timeout_ms: u64,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}
