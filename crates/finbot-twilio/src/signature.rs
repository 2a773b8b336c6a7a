//! Twilio webhook request-signature validation.
//!
//! Twilio signs each webhook delivery with `X-Twilio-Signature`: the full
//! public URL of the endpoint, followed by every POST parameter sorted by
//! key with its value appended, HMAC-SHA1'd with the account auth token and
//! base64-encoded. Validation runs before any state-machine logic.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

#[derive(Clone, Debug)]
pub struct RequestValidator {
    auth_token: String,
}

impl RequestValidator {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
        }
    }

    /// Check a delivery's signature header against the signed URL and its
    /// decoded form parameters.
    pub fn validate(&self, signature: &str, url: &str, params: &[(String, String)]) -> bool {
        constant_time_eq(self.compute(url, params).as_bytes(), signature.trim().as_bytes())
    }

    fn compute(&self, url: &str, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut data = url.to_string();
        for (key, value) in sorted {
            data.push_str(key);
            data.push_str(value);
        }

        let mut mac =
            HmacSha1::new_from_slice(self.auth_token.as_bytes()).expect("hmac accepts any key length");
        mac.update(data.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
