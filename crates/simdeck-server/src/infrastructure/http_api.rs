//! HTTP API, static UI and push-channel upgrade.
//!
//! Every `/api/*` route decodes its JSON body into a [`Command`], runs it
//! through the [`CommandDispatcher`] and answers with the resulting
//! [`Envelope`].  Malformed bodies are answered with a `400` envelope without
//! touching the device.  `GET /api/screenshot.png` is the one raw route: PNG
//! bytes with caching disabled.
//!
//! The browser UI (`/`, `/app.js`) is compiled into the binary.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use simdeck_core::Action;

use crate::application::driver::DriverError;
use crate::application::{Command, CommandDispatcher, Envelope};
use crate::domain::requests::{
    InstallRequest, KeyRequest, LaunchTarget, OpenUrlRequest, StatusBarOverride, SwipeGesture,
    TapElementRequest, TapRequest, TypeElementRequest, TypeRequest, UninstallRequest,
};
use crate::infrastructure::ws_session::run_push_session;

const UI_INDEX_HTML: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/web/index.html"));
const UI_APP_JS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/web/app.js"));

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    /// Flips to `true` on shutdown; open push sessions close when it does.
    pub shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(dispatcher: Arc<CommandDispatcher>, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            dispatcher,
            shutdown_rx,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ui_index_handler))
        .route("/app.js", get(ui_app_js_handler))
        .route("/ws", get(ws_handler))
        .route("/api/device", get(device_handler))
        .route("/api/platform", get(platform_handler))
        .route("/api/screenshot", get(screenshot_handler))
        .route("/api/screenshot.png", get(screenshot_png_handler))
        .route("/api/screen", get(screen_handler))
        .route("/api/apps", get(apps_handler))
        .route("/api/elements", get(elements_handler))
        .route("/api/tap", post(tap_handler))
        .route("/api/swipe", post(swipe_handler))
        .route("/api/type", post(type_handler))
        .route("/api/key", post(key_handler))
        .route("/api/launch", post(launch_handler))
        .route("/api/openurl", post(open_url_handler))
        .route("/api/statusbar", post(status_bar_handler))
        .route("/api/record/start", post(record_start_handler))
        .route("/api/record/stop", post(record_stop_handler))
        .route("/api/install", post(install_handler))
        .route("/api/uninstall", post(uninstall_handler))
        .route("/api/tap-element", post(tap_element_handler))
        .route("/api/type-element", post(type_element_handler))
        .layer(cors)
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` flips.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    info!(addr = ?addr, "HTTP API listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
            info!("HTTP API shutting down");
        })
        .await
}

// ── Envelope helpers ──────────────────────────────────────────────────────────

fn respond(envelope: Envelope) -> Response {
    let status = StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    respond(Envelope::failure(&DriverError::InvalidArgument(message.into())))
}

fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "rejected request body");
            Err(bad_request(rejection.body_text()))
        }
    }
}

/// Like [`body`], but refuses an action the platform lacks before looking at
/// the payload.
fn supported_body<T: DeserializeOwned>(
    state: &AppState,
    action: Action,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    match state.dispatcher.refusal(action) {
        Some(refused) => Err(respond(refused)),
        None => body(payload),
    }
}

async fn run(state: &AppState, command: Command) -> Response {
    respond(state.dispatcher.dispatch(command).await)
}

// ── UI ────────────────────────────────────────────────────────────────────────

async fn ui_index_handler() -> Response {
    Html(UI_INDEX_HTML).into_response()
}

async fn ui_app_js_handler() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        UI_APP_JS,
    )
        .into_response()
}

// ── Push channel ──────────────────────────────────────────────────────────────

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let session = Arc::clone(state.dispatcher.session());
    let shutdown_rx = state.shutdown_rx.clone();
    ws.on_upgrade(move |socket| async move {
        run_push_session(socket, session, shutdown_rx).await;
    })
    .into_response()
}

// ── Queries ───────────────────────────────────────────────────────────────────

async fn device_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::Device).await
}

async fn platform_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::Platform).await
}

async fn screenshot_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::Screenshot).await
}

async fn screenshot_png_handler(State(state): State<AppState>) -> Response {
    match state.dispatcher.screenshot_png().await {
        Ok(png) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            ],
            png,
        )
            .into_response(),
        Err(e) => respond(Envelope::failure(&e)),
    }
}

async fn screen_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::Screen).await
}

async fn apps_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::Apps).await
}

async fn elements_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::Elements).await
}

// ── Input ─────────────────────────────────────────────────────────────────────

async fn tap_handler(
    State(state): State<AppState>,
    payload: Result<Json<TapRequest>, JsonRejection>,
) -> Response {
    let request = match body(payload) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match request.target() {
        Some(target) => run(&state, Command::Tap(target)).await,
        None => bad_request("x and y, or relX and relY, are required"),
    }
}

async fn swipe_handler(
    State(state): State<AppState>,
    payload: Result<Json<SwipeGesture>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(gesture) => run(&state, Command::Swipe(gesture)).await,
        Err(resp) => resp,
    }
}

async fn type_handler(
    State(state): State<AppState>,
    payload: Result<Json<TypeRequest>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(TypeRequest { text }) => run(&state, Command::Type { text }).await,
        Err(resp) => resp,
    }
}

async fn key_handler(
    State(state): State<AppState>,
    payload: Result<Json<KeyRequest>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(KeyRequest { key }) => run(&state, Command::Key { key }).await,
        Err(resp) => resp,
    }
}

// ── Apps and device state ─────────────────────────────────────────────────────

async fn launch_handler(
    State(state): State<AppState>,
    payload: Result<Json<LaunchTarget>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(target) => run(&state, Command::Launch(target)).await,
        Err(resp) => resp,
    }
}

async fn open_url_handler(
    State(state): State<AppState>,
    payload: Result<Json<OpenUrlRequest>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(OpenUrlRequest { url }) => run(&state, Command::OpenUrl { url }).await,
        Err(resp) => resp,
    }
}

async fn status_bar_handler(
    State(state): State<AppState>,
    payload: Result<Json<StatusBarOverride>, JsonRejection>,
) -> Response {
    match supported_body(&state, Action::StatusBar, payload) {
        Ok(status) => run(&state, Command::StatusBar(status)).await,
        Err(resp) => resp,
    }
}

async fn record_start_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::RecordStart).await
}

async fn record_stop_handler(State(state): State<AppState>) -> Response {
    run(&state, Command::RecordStop).await
}

async fn install_handler(
    State(state): State<AppState>,
    payload: Result<Json<InstallRequest>, JsonRejection>,
) -> Response {
    match supported_body(&state, Action::Install, payload) {
        Ok(InstallRequest { apk_path }) => run(&state, Command::Install { apk_path }).await,
        Err(resp) => resp,
    }
}

async fn uninstall_handler(
    State(state): State<AppState>,
    payload: Result<Json<UninstallRequest>, JsonRejection>,
) -> Response {
    match supported_body(&state, Action::Uninstall, payload) {
        Ok(UninstallRequest { package_name }) => {
            run(&state, Command::Uninstall { package_name }).await
        }
        Err(resp) => resp,
    }
}

// ── Element queries ───────────────────────────────────────────────────────────

async fn tap_element_handler(
    State(state): State<AppState>,
    payload: Result<Json<TapElementRequest>, JsonRejection>,
) -> Response {
    match supported_body(&state, Action::TapElement, payload) {
        Ok(TapElementRequest { query, exact }) => {
            run(&state, Command::TapElement { query, exact }).await
        }
        Err(resp) => resp,
    }
}

async fn type_element_handler(
    State(state): State<AppState>,
    payload: Result<Json<TypeElementRequest>, JsonRejection>,
) -> Response {
    match supported_body(&state, Action::TypeElement, payload) {
        Ok(TypeElementRequest { query, text }) => {
            run(&state, Command::TypeElement { query, text }).await
        }
        Err(resp) => resp,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
