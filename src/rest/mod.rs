use std::{net::SocketAddr, time::SystemTime};

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{registry::Registry, storage::Storage};

mod error;
mod handlers;
pub mod models;
mod validate;

pub use error::ApiError;

use handlers::{
    add_member, create_group, create_user, get_group_by_name, get_user, groups_for_user, health,
    list_groups, list_members, list_users, not_found,
};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub registry: Registry<S>,
    pub started_at: SystemTime,
}

/// Builds the HTTP surface over `storage`.
///
/// `/groups/:group` resolves a group by name, while the `members` routes
/// below it parse the same segment as a numeric group id.
pub fn router<S: Storage + Clone + Send + Sync + 'static>(storage: S) -> Router {
    let state = AppState {
        registry: Registry::new(storage),
        started_at: SystemTime::now(),
    };

    Router::new()
        .route("/healthz", get(health::<S>))
        .route("/users", get(list_users::<S>).post(create_user::<S>))
        .route("/users/:user_id", get(get_user::<S>))
        .route("/users/:user_id/groups", get(groups_for_user::<S>))
        .route("/groups", get(list_groups::<S>).post(create_group::<S>))
        .route("/groups/:group", get(get_group_by_name::<S>))
        .route(
            "/groups/:group/members",
            get(list_members::<S>).post(add_member::<S>),
        )
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    storage: S,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, storage, shutdown).await
}

pub async fn serve_on<S: Storage + Clone + Send + Sync + 'static>(
    listener: TcpListener,
    storage: S,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", listener.local_addr()?);

    axum::serve(listener, router(storage))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
