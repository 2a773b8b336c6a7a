use std::sync::Arc;

use finbot_core::{
    config::Config,
    engine::ConversationEngine,
    ports::{Ledger, MessagingPort, TextGenerator},
    store::MemoryStore,
};
use finbot_gemini::GeminiClient;
use finbot_sheets::{MemoryLedger, SheetsLedger};
use finbot_twilio::{MockMessenger, RequestValidator, TwilioMessenger};

mod routes;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    finbot_core::logging::init("finbot");

    let cfg = Arc::new(Config::load()?);

    // Every collaborator is built exactly once here and injected below;
    // live-vs-mock is a startup decision, never per-call branching.
    let ledger: Arc<dyn Ledger> = match (&cfg.sheets_spreadsheet_id, &cfg.sheets_token) {
        (Some(id), Some(token)) => Arc::new(SheetsLedger::new(id.clone(), token.clone())),
        _ => Arc::new(MemoryLedger::new()),
    };

    let messenger: Arc<dyn MessagingPort> = match (
        &cfg.twilio_account_sid,
        &cfg.twilio_auth_token,
        &cfg.twilio_whatsapp_number,
    ) {
        (Some(sid), Some(token), Some(from)) => {
            Arc::new(TwilioMessenger::new(sid.clone(), token.clone(), from.clone()))
        }
        _ => Arc::new(MockMessenger),
    };

    let generator: Option<Arc<dyn TextGenerator>> = cfg.gemini_api_key.as_ref().map(|key| {
        Arc::new(GeminiClient::new(key.clone(), cfg.gemini_api_url.clone()))
            as Arc<dyn TextGenerator>
    });

    // Signature validation needs both the auth token and the public URL the
    // transport signed against.
    let validator = match (&cfg.twilio_auth_token, cfg.webhook_url()) {
        (Some(token), Some(url)) if cfg.twilio_enabled() => {
            Some((RequestValidator::new(token.clone()), url))
        }
        _ => None,
    };

    let engine = Arc::new(ConversationEngine::new(
        Arc::new(MemoryStore::new()),
        ledger.clone(),
        messenger,
        generator,
    ));

    server::run(cfg, engine, ledger, validator).await
}
