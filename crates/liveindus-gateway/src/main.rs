//! LiveIndus Gateway: guide chat relay plus the static site, bare metal.
//! Chat routes classify the conversation, assemble the prompt and call the language model.

mod handlers;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use liveindus_core::{build_model, LanguageModel, RelayConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Characters of the provider key shown by the diagnostics endpoint.
const KEY_PREFIX_CHARS: usize = 10;

/// What the diagnostics endpoint may reveal about the provider key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub exists: bool,
    pub length: usize,
    pub prefix: String,
}

impl CredentialStatus {
    fn from_key(key: Option<&str>) -> Self {
        match key {
            Some(k) => Self {
                exists: true,
                length: k.chars().count(),
                prefix: format!("{}...", k.chars().take(KEY_PREFIX_CHARS).collect::<String>()),
            },
            None => Self {
                exists: false,
                length: 0,
                prefix: "Not set".to_string(),
            },
        }
    }
}

/// Immutable per-process state shared by every request.
pub struct AppState {
    pub config: RelayConfig,
    /// `None` when running live without a key.
    pub model: Option<Arc<dyn LanguageModel>>,
    pub credential: CredentialStatus,
}

impl AppState {
    pub fn new(
        config: RelayConfig,
        model: Option<Arc<dyn LanguageModel>>,
        api_key: Option<&str>,
    ) -> Self {
        Self {
            config,
            model,
            credential: CredentialStatus::from_key(api_key),
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match RelayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "[LIVEINDUS] failed to load configuration");
            std::process::exit(1);
        }
    };

    let api_key = config.api_key();
    let model = build_model(&config, api_key.clone());
    match &model {
        Some(m) => tracing::info!(
            model = m.model_name(),
            mode = ?config.llm_mode,
            strategy = %config.prompt_strategy,
            "[LIVEINDUS] language model ready"
        ),
        None => tracing::warn!(
            var = %config.api_key_env,
            "[LIVEINDUS] no provider key set; chat will answer with fallback text"
        ),
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, model, api_key.as_deref()));
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "[LIVEINDUS] failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("[LIVEINDUS] relay listening on http://{}", addr);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "[LIVEINDUS] server stopped");
        std::process::exit(1);
    }
}

/// Router with every route, the static fallback and the CORS and logging layers.
/// OPTIONS on any path is answered by the CORS layer before routing.
pub fn build_app(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(health))
        .route(
            "/api/chat",
            post(handlers::chat::chat).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/chat/:strategy",
            post(handlers::chat::chat_with_strategy).fallback(handlers::method_not_allowed),
        )
        .route("/api/check-api", get(handlers::diagnostics::check_api))
        .route(
            "/api/test-chat",
            post(handlers::diagnostics::test_chat).fallback(handlers::method_not_allowed),
        )
        .with_state(state);

    let dir = Path::new(&static_dir);
    if dir.is_dir() {
        let index = ServeFile::new(dir.join("index.html"));
        let site = Router::new()
            .fallback_service(ServeDir::new(dir).fallback(index))
            .layer(axum::middleware::from_fn(refuse_hidden));
        app = app.fallback_service(site);
    } else {
        tracing::warn!(static_dir = %static_dir, "[LIVEINDUS] static directory missing; site not served");
    }

    app.layer(axum::middleware::from_fn(log_request)).layer(cors)
}

/// Dotfiles and dot-directories (`.env`, `.git/`) are never served, encoded or not.
fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.') || segment.to_ascii_lowercase().starts_with("%2e")
    })
}

async fn refuse_hidden(request: Request<Body>, next: Next) -> Response {
    if is_hidden_path(request.uri().path()) {
        tracing::warn!(path = %request.uri().path(), "[LIVEINDUS] hidden path refused");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(
        method = %request.method(),
        path = %request.uri().path(),
        client = %client,
        "[LIVEINDUS] request"
    );
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}
