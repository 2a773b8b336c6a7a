use std::{net::SocketAddr, sync::Arc, time::Instant};

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use finbot_core::{config::Config, engine::ConversationEngine, ports::Ledger};
use finbot_twilio::RequestValidator;

use crate::routes;

/// Startup-resolved webhook authentication: validate against the signed
/// public URL, or accept everything in mock mode.
pub enum WebhookAuth {
    Twilio { validator: RequestValidator, url: String },
    Disabled,
}

/// Service modes surfaced on the dashboard status endpoint.
pub struct ServiceModes {
    pub whatsapp: &'static str,
    pub sheets: &'static str,
    pub gemini: &'static str,
}

pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub ledger: Arc<dyn Ledger>,
    pub auth: WebhookAuth,
    pub modes: ServiceModes,
    pub started: Instant,
}

pub async fn run(
    cfg: Arc<Config>,
    engine: Arc<ConversationEngine>,
    ledger: Arc<dyn Ledger>,
    validator: Option<(RequestValidator, String)>,
) -> anyhow::Result<()> {
    let auth = match validator {
        Some((validator, url)) => WebhookAuth::Twilio { validator, url },
        None => WebhookAuth::Disabled,
    };

    let mode = |enabled: bool| if enabled { "active" } else { "mock" };
    let state = Arc::new(AppState {
        engine,
        ledger,
        auth,
        modes: ServiceModes {
            whatsapp: mode(cfg.twilio_enabled()),
            sheets: mode(cfg.sheets_enabled()),
            gemini: mode(cfg.gemini_enabled()),
        },
        started: Instant::now(),
    });

    let app = Router::new()
        .route("/webhook", post(routes::webhook::receive))
        .route("/webhook/health", get(routes::webhook::health))
        .route("/dashboard/logs", get(routes::dashboard::logs))
        .route("/dashboard/status", get(routes::dashboard::status))
        .route("/", get(|| async { Redirect::to("/index.html") }))
        .fallback_service(ServeDir::new(&cfg.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("server listening on {addr}");
    tracing::info!("dashboard available at http://localhost:{}", cfg.port);
    tracing::info!("webhook endpoint: http://localhost:{}/webhook", cfg.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
