//! `AssistantServer` — Axum HTTP + WebSocket server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use stagelink_settings::AssistantSettings;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::{ControlStateCache, SettingsCache};
use crate::chat::ChatTracker;
use crate::companion::CompanionManager;
use crate::errors::Result;
use crate::health::{self, HealthResponse};
use crate::link::StreamerLink;
use crate::poller::{PollerHandle, StatusPoller};
use crate::shutdown::ShutdownCoordinator;
use crate::ws;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Role settings.
    pub settings: Arc<AssistantSettings>,
    /// Typed command surface to the attached streamer.
    pub link: Arc<StreamerLink>,
    /// Mirrored control state.
    pub control_state: Arc<ControlStateCache>,
    /// Latest capability catalog.
    pub settings_cache: Arc<SettingsCache>,
    /// Chat de-duplication and log.
    pub chat: Arc<ChatTracker>,
    /// Companion registry and fan-out.
    pub companions: Arc<CompanionManager>,
    /// Status poller control.
    pub poller: PollerHandle,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
}

impl AppState {
    /// Build the state graph and the (not yet running) status poller.
    #[must_use]
    pub fn new(settings: AssistantSettings) -> (Self, StatusPoller) {
        let settings = Arc::new(settings);
        let link = Arc::new(StreamerLink::new(Duration::from_millis(
            settings.request_timeout_ms,
        )));
        let control_state = Arc::new(ControlStateCache::new());
        let companions = Arc::new(CompanionManager::new(
            settings.max_companions,
            settings.companion_preview_divisor,
        ));
        let (poller, handle) = StatusPoller::new(
            link.clone(),
            companions.clone(),
            control_state.clone(),
            Duration::from_millis(settings.status_poll_interval_ms),
        );
        let state = Self {
            chat: Arc::new(ChatTracker::new(settings.chat_log_limit)),
            settings,
            link,
            control_state,
            settings_cache: Arc::new(SettingsCache::new()),
            companions,
            poller: handle,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        };
        (state, poller)
    }
}

/// Build the router over an existing state graph.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws::streamer_ws_handler))
        .route("/companion", get(ws::companion_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The assistant server.
pub struct AssistantServer {
    state: AppState,
    poller: StatusPoller,
}

impl AssistantServer {
    /// Create a server from role settings.
    #[must_use]
    pub fn new(settings: AssistantSettings) -> Self {
        let (state, poller) = AppState::new(settings);
        Self { state, poller }
    }

    /// The shared state graph.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the Axum router with all routes.
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Get the shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Bind the configured listen address. Port 0 auto-assigns.
    pub async fn bind(&self) -> Result<TcpListener> {
        let address = format!(
            "{}:{}",
            self.state.settings.host, self.state.settings.port
        );
        let listener = TcpListener::bind(&address).await?;
        info!(address = %listener.local_addr()?, "assistant listening");
        Ok(listener)
    }

    /// Bind and serve until shutdown.
    pub async fn serve(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let Self { state, poller } = self;
        let token = state.shutdown.token();
        let poller_task = tokio::spawn(poller.run(token.clone()));

        let app = router(state.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        state.shutdown.drain(poller_task).await;
        Ok(())
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.link.is_connected(),
        state.companions.count(),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
