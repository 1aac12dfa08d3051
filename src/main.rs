//! Photo buzzer server entrypoint wiring the host session, team routes and the
//! display stream over the shared round document.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_buzz::{
    config::{AppConfig, StoreKind},
    dao::{
        round_store::{FileRoundStore, MemoryRoundStore, RoundStore},
        storage::StorageError,
    },
    photo::{NetpbmDecoder, PhotoDeck},
    routes,
    services::{reveal_service, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let deck = match PhotoDeck::load_dir(&config.photos_dir, &NetpbmDecoder).await {
        Ok(deck) => deck,
        Err(err) => {
            warn!(
                dir = %config.photos_dir.display(),
                error = %err,
                "failed to read photo directory; starting with an empty deck"
            );
            PhotoDeck::default()
        }
    };
    info!(photos = deck.len(), "photo deck loaded");

    let store = config.store;
    let state_path = config.state_path.clone();
    let app_state = AppState::new(config, deck);

    spawn_storage_supervisor(app_state.clone(), store, state_path);
    tokio::spawn(reveal_service::run_host_cycle(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Keep the round store connected in the background; the server answers 503
/// until the first connection succeeds.
fn spawn_storage_supervisor(state: SharedState, kind: StoreKind, path: PathBuf) {
    match kind {
        StoreKind::File => {
            info!(path = %path.display(), "using file round store");
            tokio::spawn(storage_supervisor::run(state, move || {
                let path = path.clone();
                async move {
                    let store = FileRoundStore::open(path).await?;
                    Ok::<Arc<dyn RoundStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        StoreKind::Memory => {
            info!("using in-memory round store");
            let store = MemoryRoundStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<Arc<dyn RoundStore>, StorageError>(Arc::new(store)) }
            }));
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
