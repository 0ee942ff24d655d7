//! Trivia Back binary entrypoint wiring the REST layer, the round rotator, and storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_back::{
    config::AppConfig,
    dao::trivia_store::memory::MemoryTriviaStore,
    routes,
    services::rotation_service,
    state::{AppState, SharedState},
};

const STORE_ENV: &str = "TRIVIA_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    start_storage(app_state.clone()).await?;
    tokio::spawn(rotation_service::run_rotator(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
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

/// Install the storage backend selected by `TRIVIA_STORE`.
///
/// The memory store is installed immediately; MongoDB is handed to the storage supervisor,
/// and the application stays in degraded mode until the first connection succeeds.
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    let kind = env::var(STORE_ENV).ok();
    match kind.as_deref().map(str::trim) {
        Some("memory") => {
            info!("using in-memory trivia store; data is lost on shutdown");
            state
                .install_trivia_store(Arc::new(MemoryTriviaStore::new()))
                .await;
            Ok(())
        }
        Some("mongo") | Some("") | None => start_mongo(state).await,
        Some(other) => {
            anyhow::bail!("unknown {STORE_ENV} value `{other}` (expected `mongo` or `memory`)")
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn start_mongo(state: SharedState) -> anyhow::Result<()> {
    use trivia_back::{
        dao::{
            storage::StorageError,
            trivia_store::{
                TriviaStore,
                mongodb::{MongoConfig, MongoTriviaStore},
            },
        },
        services::storage_supervisor,
    };

    let mongo_uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let mongo_db = env::var("MONGO_DB").ok();
    let config = MongoConfig::from_uri(&mongo_uri, mongo_db.as_deref())
        .await
        .context("parsing MongoDB connection settings")?;

    tokio::spawn(storage_supervisor::run(state, move || {
        let config = config.clone();
        async move {
            let store = MongoTriviaStore::connect(config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn TriviaStore>)
        }
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
async fn start_mongo(_state: SharedState) -> anyhow::Result<()> {
    anyhow::bail!("built without the `mongo-store` feature; set {STORE_ENV}=memory")
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
