use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use finbot_core::{domain::SenderId, Error};

use crate::routes::ApiError;
use crate::server::{AppState, WebhookAuth};

/// Inbound Twilio WhatsApp delivery.
///
/// The signature is validated against the raw form body before any
/// state-machine logic runs; a rejected request changes no state.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let params: Vec<(String, String)> =
        url::form_urlencoded::parse(body.as_bytes()).into_owned().collect();

    if let WebhookAuth::Twilio { validator, url } = &state.auth {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !validator.validate(signature, url, &params) {
            tracing::error!("invalid webhook signature");
            return Err(Error::Auth("invalid webhook signature".to_string()).into());
        }
    }

    let message = form_value(&params, "Body")
        .ok_or_else(|| Error::Validation("Message body is required".to_string()))?;
    let from = form_value(&params, "From")
        .ok_or_else(|| Error::Validation("Sender is required".to_string()))?;
    let sender = SenderId::from_transport(&from);

    state.engine.handle_message(&sender, &message).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message processed successfully"
    })))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn form_value(params: &[(String, String)], key: &str) -> Option<String> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .filter(|v| !v.trim().is_empty())
}
