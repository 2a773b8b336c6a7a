use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::routes::ApiError;
use crate::server::AppState;

const DEFAULT_LOG_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    limit: Option<usize>,
}

/// Recent ledger records for the dashboard table.
pub async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let records = state.ledger.recent_records(limit).await?;

    Ok(Json(json!({
        "status": "success",
        "data": records
    })))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": {
            "uptime": state.started.elapsed().as_secs(),
            "timestamp": Utc::now().to_rfc3339(),
            "services": {
                "whatsapp": state.modes.whatsapp,
                "googleSheets": state.modes.sheets,
                "gemini": state.modes.gemini,
            }
        }
    }))
}
