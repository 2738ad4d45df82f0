use crate::{cli, context, rest, storage};
use anyhow::{Context as AnyhowContext, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The main application state.
/// Decoupled from CLI parsing so it can be built directly in tests.
pub struct App {
    config: context::Context,
    storage: storage::SqliteStorage,
    shutdown: CancellationToken,
}

impl App {
    /// Parses the command line, wires logging and prepares the database.
    pub fn from_cli() -> Result<Self> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::set_log_file(ctx.log_file.as_deref())
            .context("opening log file")?;
        log_startup_info(&ctx);

        let storage = init_storage(&ctx)?;
        Ok(Self::new(ctx, storage))
    }

    fn new(config: context::Context, storage: storage::SqliteStorage) -> Self {
        Self {
            config,
            storage,
            shutdown: CancellationToken::new(),
        }
    }

    /// Serves the API until Ctrl-C or until the server stops on its own.
    pub async fn run_daemon(&self) -> Result<()> {
        let mut rest_handle = self.spawn_rest_server();
        self.wait_for_shutdown(&mut rest_handle).await
    }

    fn spawn_rest_server(&self) -> JoinHandle<Result<()>> {
        let addr = self.config.api_listen;
        let store = self.storage.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            let result = rest::serve(addr, store, token).await;
            if let Err(e) = &result {
                log::error!("REST server failed: {:#}", e);
            }
            result
        })
    }

    async fn wait_for_shutdown(&self, rest_task: &mut JoinHandle<Result<()>>) -> Result<()> {
        let early_exit = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("🧨 Ctrl-C received, shutting down...");
                None
            }
            joined = &mut *rest_task => {
                log::error!("REST task exited unexpectedly");
                Some(joined)
            }
        };

        self.shutdown.cancel();

        let joined = match early_exit {
            Some(joined) => joined,
            None => rest_task.await,
        };
        joined.context("REST task panicked")??;

        log::info!("✅ Shutdown complete");
        Ok(())
    }
}

fn log_startup_info(ctx: &context::Context) {
    log::info!("🚀 Starting usergroups");
    log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
    log::info!("🌐 REST API: http://{}", ctx.api_listen);
    log::info!("⏱️ Busy timeout: {:?}", ctx.busy_timeout);
    if let Some(path) = ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.to_string_lossy());
    }
}

fn init_storage(ctx: &context::Context) -> Result<storage::SqliteStorage> {
    std::fs::create_dir_all(&ctx.data_dir).context("creating data dir")?;

    let sqlite = storage::SqliteStorage::new(ctx.db_path()).with_busy_timeout(ctx.busy_timeout);
    if ctx.reset {
        log::warn!("🧹 Resetting database at {}", sqlite.path);
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;

    Ok(sqlite)
}

// --- Entry Point ---

pub async fn run() -> Result<()> {
    let app = App::from_cli()?;
    app.run_daemon().await
}
