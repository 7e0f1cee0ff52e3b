//! HTTP server: router assembly, background tasks and graceful shutdown.

use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::gate::GateConfig;
use crate::auth::{RevocationCache, SessionAuthority, TokenIssuer, session_gate, spawn_reaper};
use crate::config::Config;
use crate::notes::NoteService;
use crate::store::{InMemoryNoteStore, InMemoryShareStore, InMemoryUserStore};
use crate::users::UserService;
use crate::{Error, Result, auth, notes, users};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Session issuance, verification and revocation
    pub authority: Arc<SessionAuthority>,
    /// User profile operations
    pub users: UserService,
    /// Note CRUD and sharing
    pub notes: NoteService,
}

impl AppState {
    /// Build the state from config, wiring in-memory repositories.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let users = UserService::new(Arc::new(InMemoryUserStore::new()));
        let notes = NoteService::new(
            Arc::new(InMemoryNoteStore::new()),
            Arc::new(InMemoryShareStore::new()),
            users.clone(),
        );

        let tokens = TokenIssuer::new(
            &config.auth.resolve_jwt_secret(),
            config.auth.access_ttl,
            config.auth.refresh_ttl,
            config.auth.refresh_enabled,
        );
        let authority = Arc::new(SessionAuthority::new(
            users.clone(),
            tokens,
            Arc::new(RevocationCache::new()),
        ));

        Self {
            authority,
            users,
            notes,
        }
    }
}

/// `GET /api` — liveness greeting.
async fn hello() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello World!" }))
}

/// Create the router.
pub fn create_router(state: AppState, public_paths: Vec<String>) -> Router {
    let gate = Arc::new(GateConfig {
        authority: Arc::clone(&state.authority),
        public_paths,
    });

    Router::new()
        .route("/api", get(hello))
        .route("/api/auth/signup", post(auth::handler::sign_up))
        .route("/api/auth/login", post(auth::handler::login))
        .route("/api/auth/refresh", post(auth::handler::refresh))
        .route("/api/auth/logout", post(auth::handler::logout))
        .route("/api/users", get(users::handler::profile))
        .route("/api/users/getUsers", get(users::handler::list))
        .route(
            "/api/notes",
            post(notes::handler::create).get(notes::handler::list),
        )
        .route(
            "/api/notes/{uid}",
            get(notes::handler::find_one)
                .put(notes::handler::update)
                .delete(notes::handler::remove),
        )
        .route("/api/notes/{uid}/share", post(notes::handler::share))
        // Session gate runs before the other layers
        .layer(middleware::from_fn_with_state(gate, session_gate))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The note service HTTP server.
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a server from resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bind, serve and block until shutdown.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);

        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

        let state = AppState::from_config(&self.config);

        // Background reaper bounds revocation-cache memory between lookups
        spawn_reaper(
            state.authority.blacklist(),
            self.config.revocation.reap_interval,
            shutdown_tx.subscribe(),
        );

        let app = create_router(state, self.config.auth.public_paths.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind {addr}: {e}")))?;

        info!("notevault v{}", env!("CARGO_PKG_VERSION"));
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        info!(
            access_ttl = ?self.config.auth.access_ttl,
            refresh = self.config.auth.refresh_enabled,
            "Session policy"
        );
        if self.config.auth.jwt_secret == "auto" {
            warn!("JWT secret is auto-generated; sessions will not survive a restart");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Server stopped");
        Ok(())
    }
}

/// Resolve on Ctrl+C or SIGTERM, then fan the shutdown out to background
/// tasks.
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
