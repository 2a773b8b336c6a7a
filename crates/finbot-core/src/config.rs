use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration for the bot.
///
/// Credential groups are optional on purpose: a missing group logs a warning
/// and selects the mock variant of that collaborator at startup, so the bot
/// stays runnable on a laptop with zero secrets configured.
#[derive(Clone, Debug)]
pub struct Config {
    // Server
    pub port: u16,
    pub public_url: Option<String>,
    pub static_dir: PathBuf,

    // Twilio WhatsApp transport
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_whatsapp_number: Option<String>,

    // Google Sheets ledger
    pub sheets_spreadsheet_id: Option<String>,
    pub sheets_token: Option<String>,

    // Gemini text backend
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
}

const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let port = match env_str("PORT") {
            None => 8000,
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {raw}")))?,
        };

        let public_url = env_str("PUBLIC_URL")
            .and_then(non_empty)
            .map(|u| u.trim_end_matches('/').to_string());

        let static_dir = PathBuf::from(env_str("STATIC_DIR").unwrap_or("public".to_string()));

        // Twilio: the account SID format is checked up front so a typo'd SID
        // selects mock mode instead of failing every outbound send.
        let twilio_account_sid = env_str("TWILIO_ACCOUNT_SID")
            .and_then(non_empty)
            .filter(|sid| {
                let ok = sid.starts_with("AC");
                if !ok {
                    tracing::warn!("TWILIO_ACCOUNT_SID does not start with 'AC'; ignoring");
                }
                ok
            });
        let twilio_auth_token = env_str("TWILIO_AUTH_TOKEN").and_then(non_empty);
        let twilio_whatsapp_number = env_str("TWILIO_WHATSAPP_NUMBER").and_then(non_empty);

        let sheets_spreadsheet_id = env_str("GOOGLE_SHEETS_SPREADSHEET_ID").and_then(non_empty);
        let sheets_token = env_str("GOOGLE_SHEETS_TOKEN").and_then(non_empty);

        let gemini_api_key = env_str("GEMINI_API_KEY").and_then(non_empty);
        let gemini_api_url = env_str("GEMINI_API_URL")
            .and_then(non_empty)
            .unwrap_or(DEFAULT_GEMINI_URL.to_string());

        let cfg = Self {
            port,
            public_url,
            static_dir,
            twilio_account_sid,
            twilio_auth_token,
            twilio_whatsapp_number,
            sheets_spreadsheet_id,
            sheets_token,
            gemini_api_key,
            gemini_api_url,
        };

        if !cfg.twilio_enabled() {
            tracing::warn!("Twilio credentials not set or invalid; WhatsApp delivery in mock mode");
        }
        if !cfg.sheets_enabled() {
            tracing::warn!("Google Sheets credentials not set; ledger in mock mode");
        }
        if !cfg.gemini_enabled() {
            tracing::warn!("Gemini API key not set; extraction uses the heuristic strategy");
        }
        if cfg.twilio_enabled() && cfg.public_url.is_none() {
            tracing::warn!("PUBLIC_URL not set; webhook signature validation disabled");
        }

        Ok(cfg)
    }

    pub fn twilio_enabled(&self) -> bool {
        self.twilio_account_sid.is_some()
            && self.twilio_auth_token.is_some()
            && self.twilio_whatsapp_number.is_some()
    }

    pub fn sheets_enabled(&self) -> bool {
        self.sheets_spreadsheet_id.is_some() && self.sheets_token.is_some()
    }

    pub fn gemini_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    /// Full public URL of the webhook endpoint, as Twilio signs it.
    pub fn webhook_url(&self) -> Option<String> {
        self.public_url.as_ref().map(|base| format!("{base}/webhook"))
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_filters_blank_values() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }

    #[test]
    fn dotenv_parsing_does_not_override_existing_env() {
        let dir = std::env::temp_dir().join(format!("finbot-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(".env");
        std::fs::write(
            &file,
            "# comment\nFINBOT_TEST_A=\"quoted\"\nFINBOT_TEST_B=plain\n",
        )
        .unwrap();

        env::set_var("FINBOT_TEST_B", "already-set");
        load_dotenv_if_present(&file);

        assert_eq!(env::var("FINBOT_TEST_A").unwrap(), "quoted");
        assert_eq!(env::var("FINBOT_TEST_B").unwrap(), "already-set");

        env::remove_var("FINBOT_TEST_A");
        env::remove_var("FINBOT_TEST_B");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
