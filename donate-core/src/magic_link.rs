//! Stateless magic-link codes
//!
//! A magic-link code is `hex(HMAC-SHA256(secret, "{email}:{secret}:{window}"))`
//! where `window` is the index of the five-minute slice of epoch time the code
//! was issued in. Nothing is persisted: verification recomputes the codes for
//! the window containing the verification time and its two neighbours, so a
//! code is accepted for at most three windows (fifteen minutes).
//!
//! # Replay
//!
//! There is no consumption record. A code verifies every time it is presented
//! while its window is still in range, so a leaked link is usable by whoever
//! holds it until it ages out. Rate limiting of the callback belongs to the
//! HTTP layer in front of this module.
//!
//! # Example
//!
//! ```rust
//! use donate_core::{MagicLinkService, Secrets, decode_state};
//!
//! let service = MagicLinkService::new(Secrets::new("totp-secret", "localhost:3000")).unwrap();
//! let url = service.generate_url("donor@example.com").unwrap();
//!
//! let encoded = url.split("?state=").nth(1).unwrap();
//! let state = decode_state(encoded).unwrap();
//!
//! assert_eq!(state.email, "donor@example.com");
//! assert!(service.verify_code_now(&state.email, &state.code));
//! ```

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE_NO_PAD},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    config::Secrets,
    crypto::{HmacKey, constant_time_compare},
};

/// Width of one code window in milliseconds.
pub const WINDOW_DURATION_MS: i64 = 5 * 60 * 1000;

/// Shortest time, in whole minutes, that a freshly issued link stays valid.
///
/// A code issued at the very end of its window is still accepted through the
/// following window, so every link lives at least one full window.
pub const MIN_LINK_LIFETIME_MINUTES: u32 = (WINDOW_DURATION_MS / 60_000) as u32;

/// Path of the callback route that consumes `?state=`.
pub const CALLBACK_PATH: &str = "/auth/magic-link/callback";

pub const STATE_PARAM: &str = "state";

/// Accepts URL-safe base64 with or without trailing `=`.
const STATE_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The `{email, code}` pair carried by a magic-link URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicLinkState {
    pub email: String,
    pub code: String,
}

impl MagicLinkState {
    pub fn new(email: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            code: code.into(),
        }
    }

    /// Serialize to JSON and encode as unpadded URL-safe base64.
    pub fn encode(&self) -> Result<String, Error> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a `state` parameter.
    ///
    /// Never fails loudly: anything that is not base64 of a JSON object with
    /// non-empty string `email` and `code` fields yields `None`.
    pub fn decode(encoded: &str) -> Option<Self> {
        // Older links used the standard alphabet; a `+` in a query string
        // arrives as a space once form-decoded.
        let normalized: String = encoded
            .chars()
            .map(|c| match c {
                '+' | ' ' => '-',
                '/' => '_',
                other => other,
            })
            .collect();

        let bytes = match STATE_DECODER.decode(normalized.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "Magic link state is not valid base64");
                return None;
            }
        };

        let state: Self = match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!(error = %e, "Magic link state is not a valid state object");
                return None;
            }
        };

        if state.email.is_empty() || state.code.is_empty() {
            return None;
        }

        Some(state)
    }
}

/// Decode a `state` parameter. See [`MagicLinkState::decode`].
pub fn decode_state(encoded: &str) -> Option<MagicLinkState> {
    MagicLinkState::decode(encoded)
}

/// Extract and decode the `state` query parameter of a callback URL.
pub fn state_from_url(url: &str) -> Option<MagicLinkState> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == STATE_PARAM)
        .and_then(|(_, value)| decode_state(value))
}

/// Index of the window containing `timestamp_ms`, floored toward negative infinity.
pub fn time_window(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(WINDOW_DURATION_MS)
}

/// Current UTC wall clock in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Issues and verifies magic-link codes.
///
/// Holds only immutable secret material, so one instance can be shared
/// across request handlers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MagicLinkService {
    key: HmacKey,
    secrets: Secrets,
}

impl MagicLinkService {
    pub fn new(secrets: Secrets) -> Result<Self, Error> {
        let key = HmacKey::new(secrets.totp_secret.expose().as_bytes())?;
        Ok(Self { key, secrets })
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    /// Compute the code for `email` in the window containing `timestamp_ms`.
    pub fn generate_code(&self, email: &str, timestamp_ms: i64) -> String {
        let window = time_window(timestamp_ms);
        let message = format!(
            "{email}:{secret}:{window}",
            secret = self.secrets.totp_secret.expose()
        );
        self.key.sign_hex(message.as_bytes())
    }

    pub fn generate_code_now(&self, email: &str) -> String {
        self.generate_code(email, now_millis())
    }

    /// Check `code` against the windows before, at and after `timestamp_ms`.
    ///
    /// All three candidates are always compared in constant time, and the
    /// result does not say which check failed.
    pub fn verify_code(&self, email: &str, code: &str, timestamp_ms: i64) -> bool {
        [
            timestamp_ms.saturating_sub(WINDOW_DURATION_MS),
            timestamp_ms,
            timestamp_ms.saturating_add(WINDOW_DURATION_MS),
        ]
        .iter()
        .map(|&t| {
            let candidate = self.generate_code(email, t);
            constant_time_compare(candidate.as_bytes(), code.as_bytes())
        })
        .fold(false, |matched, ok| matched | ok)
    }

    pub fn verify_code_now(&self, email: &str, code: &str) -> bool {
        self.verify_code(email, code, now_millis())
    }

    /// Absolute URL of the callback route, without a query.
    pub fn callback_url(&self) -> String {
        format!("{}{CALLBACK_PATH}", self.secrets.base_url())
    }

    /// Build a sign-in URL for `email` using the current time.
    pub fn generate_url(&self, email: &str) -> Result<String, Error> {
        self.generate_url_at(email, now_millis())
    }

    pub fn generate_url_at(&self, email: &str, timestamp_ms: i64) -> Result<String, Error> {
        let state = MagicLinkState::new(email, self.generate_code(email, timestamp_ms));
        let encoded = state.encode()?;

        Ok(format!("{}?{STATE_PARAM}={encoded}", self.callback_url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const T0: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60 * 1000;

    fn service() -> MagicLinkService {
        MagicLinkService::new(Secrets::new("test-totp-secret", "localhost:3000")).unwrap()
    }

    fn encode_json(value: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[test]
    fn test_code_is_64_lowercase_hex() {
        let code = service().generate_code("test@example.com", T0);

        assert_eq!(code.len(), 64);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_code_matches_hmac_of_documented_message() {
        let service = service();
        let window = time_window(T0);
        let expected = HmacKey::new(b"test-totp-secret")
            .unwrap()
            .sign_hex(format!("test@example.com:test-totp-secret:{window}").as_bytes());

        assert_eq!(service.generate_code("test@example.com", T0), expected);
    }

    #[test]
    fn test_code_is_deterministic_within_window() {
        let service = service();
        let start = time_window(T0) * WINDOW_DURATION_MS;
        let end = start + WINDOW_DURATION_MS - 1;

        assert_eq!(
            service.generate_code("test@example.com", start),
            service.generate_code("test@example.com", end)
        );
    }

    #[test]
    fn test_code_changes_across_windows() {
        let service = service();
        let start = time_window(T0) * WINDOW_DURATION_MS;

        assert_ne!(
            service.generate_code("test@example.com", start - 1),
            service.generate_code("test@example.com", start)
        );
    }

    #[test]
    fn test_code_depends_on_email_and_secret() {
        let a = service();
        let b = MagicLinkService::new(Secrets::new("other-secret", "localhost:3000")).unwrap();

        assert_ne!(
            a.generate_code("test@example.com", T0),
            a.generate_code("Test@example.com", T0)
        );
        assert_ne!(
            a.generate_code("test@example.com", T0),
            b.generate_code("test@example.com", T0)
        );
    }

    #[test]
    fn test_time_window_floors_negative_timestamps() {
        assert_eq!(time_window(0), 0);
        assert_eq!(time_window(WINDOW_DURATION_MS - 1), 0);
        assert_eq!(time_window(WINDOW_DURATION_MS), 1);
        assert_eq!(time_window(-1), -1);
    }

    #[test]
    fn test_verify_accepts_neighbouring_windows() {
        let service = service();
        let code = service.generate_code("test@example.com", T0);

        assert!(service.verify_code("test@example.com", &code, T0));
        assert!(service.verify_code("test@example.com", &code, T0 - 4 * MINUTE));
        assert!(service.verify_code("test@example.com", &code, T0 + 4 * MINUTE));
    }

    #[test]
    fn test_verify_accepts_any_offset_up_to_one_window() {
        let service = service();
        let code = service.generate_code("test@example.com", T0);

        for offset in (-WINDOW_DURATION_MS..=WINDOW_DURATION_MS).step_by(15_000) {
            assert!(
                service.verify_code("test@example.com", &code, T0 + offset),
                "offset {offset} should verify"
            );
        }
    }

    #[test]
    fn test_verify_rejects_expired_code() {
        let service = service();
        let code = service.generate_code("test@example.com", T0);

        assert!(!service.verify_code("test@example.com", &code, T0 - 15 * MINUTE));
        assert!(!service.verify_code("test@example.com", &code, T0 + 15 * MINUTE));

        for offset in [2 * WINDOW_DURATION_MS + 1, 3 * WINDOW_DURATION_MS, 24 * 60 * MINUTE] {
            assert!(!service.verify_code("test@example.com", &code, T0 + offset));
            assert!(!service.verify_code("test@example.com", &code, T0 - offset));
        }
    }

    #[test]
    fn test_verify_rejects_wrong_email_and_wrong_code() {
        let service = service();
        let code = service.generate_code("test@example.com", T0);

        assert!(!service.verify_code("wrong@example.com", &code, T0));
        assert!(!service.verify_code("test@example.com", &"0".repeat(64), T0));
        assert!(!service.verify_code("test@example.com", "wrongcode123", T0));
        assert!(!service.verify_code("test@example.com", "", T0));
        assert!(!service.verify_code("test@example.com", &code.to_uppercase(), T0));
    }

    #[test]
    fn test_verify_is_not_single_use() {
        let service = service();
        let code = service.generate_code("test@example.com", T0);

        assert!(service.verify_code("test@example.com", &code, T0));
        assert!(service.verify_code("test@example.com", &code, T0));
    }

    #[test]
    fn test_verify_saturates_at_extreme_timestamps() {
        let service = service();
        let code = service.generate_code("test@example.com", i64::MAX);

        assert!(service.verify_code("test@example.com", &code, i64::MAX));
        assert!(!service.verify_code("test@example.com", &code, i64::MIN));
    }

    #[test]
    fn test_generate_url_shape() {
        let service = service();
        let url = service.generate_url_at("test@example.com", T0).unwrap();

        assert!(url.starts_with("http://localhost:3000/auth/magic-link/callback?state="));
        let encoded = url.split("?state=").nth(1).unwrap();
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_url_uses_https_in_production() {
        let secrets = Secrets::new("test-totp-secret", "donate.example.org").with_production(true);
        let service = MagicLinkService::new(secrets).unwrap();

        let url = service.generate_url("test@example.com").unwrap();
        assert!(url.starts_with("https://donate.example.org/auth/magic-link/callback?state="));
    }

    #[test]
    fn test_generate_url_round_trip() {
        let service = service();

        for email in [
            "test@example.com",
            "first.last+tag@sub.example.org",
            "üñîçødé@example.com",
            "quote\"and\\slash@example.com",
        ] {
            let url = service.generate_url_at(email, T0).unwrap();
            let state = state_from_url(&url).unwrap();

            assert_eq!(state.email, email);
            assert_eq!(state.code, service.generate_code(email, T0));
            assert!(service.verify_code(email, &state.code, T0));
        }
    }

    #[test]
    fn test_scenario() {
        let service = service();
        let url = service.generate_url_at("test@example.com", T0).unwrap();
        assert!(url.contains("?state="));

        let state = state_from_url(&url).unwrap();
        assert_eq!(state.email, "test@example.com");
        assert_eq!(state.code.len(), 64);

        assert!(service.verify_code("test@example.com", &state.code, T0));
        assert!(!service.verify_code("wrong@example.com", &state.code, T0));
        assert!(!service.verify_code("test@example.com", &"0".repeat(64), T0));
    }

    #[test]
    fn test_decode_valid_state() {
        let encoded = encode_json(serde_json::json!({
            "email": "test@example.com",
            "code": "abc123",
        }));

        let state = decode_state(&encoded).unwrap();
        assert_eq!(state, MagicLinkState::new("test@example.com", "abc123"));
    }

    #[test]
    fn test_decode_accepts_standard_alphabet_and_padding() {
        let standard = base64::engine::general_purpose::STANDARD;

        let json = serde_json::json!({"email": "a>b?@example.com", "code": "abc"}).to_string();
        let encoded = standard.encode(&json);
        assert!(encoded.contains('/') && encoded.ends_with('='));
        assert_eq!(decode_state(&encoded).unwrap().email, "a>b?@example.com");

        let json = serde_json::json!({"email": "ab>>@example.com", "code": "abc"}).to_string();
        let encoded = standard.encode(&json);
        assert!(encoded.contains('+'));
        assert!(decode_state(&encoded).is_some());
        assert!(decode_state(&encoded.replace('+', " ")).is_some());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_state("").is_none());
        assert!(decode_state("!!!invalid!!!").is_none());
        assert!(decode_state("%%%").is_none());
        assert!(decode_state("a").is_none());
        assert!(decode_state(&"\u{0}".repeat(8)).is_none());
    }

    #[test]
    fn test_decode_is_total_over_short_strings() {
        const ALPHABET: [char; 14] = [
            'e', 'y', 'J', '9', '-', '_', '+', '/', '=', ' ', '%', '{', '\u{0}', 'é',
        ];

        let mut inputs = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..4 {
            frontier = frontier
                .iter()
                .flat_map(|prefix| {
                    ALPHABET.iter().map(move |c| {
                        let mut next = prefix.clone();
                        next.push(*c);
                        next
                    })
                })
                .collect();
            inputs.extend(frontier.iter().cloned());
        }

        for byte in 0..=u8::MAX {
            inputs.push(String::from_utf8_lossy(&[byte, byte ^ 0x5a, b'=']).into_owned());
        }

        for input in &inputs {
            if let Some(state) = decode_state(input) {
                assert!(!state.email.is_empty() && !state.code.is_empty(), "{input:?}");
            }
        }
    }

    #[test]
    fn test_link_lifetime_matches_window() {
        let service = service();
        let last_ms_of_window = (time_window(T0) + 1) * WINDOW_DURATION_MS - 1;
        let code = service.generate_code("test@example.com", last_ms_of_window);
        let lifetime_ms = i64::from(MIN_LINK_LIFETIME_MINUTES) * MINUTE;

        assert_eq!(MIN_LINK_LIFETIME_MINUTES, 5);
        assert!(service.verify_code("test@example.com", &code, last_ms_of_window + lifetime_ms));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let encoded = URL_SAFE_NO_PAD.encode("not valid json {{{");
        assert!(decode_state(&encoded).is_none());

        let encoded = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(decode_state(&encoded).is_none());
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        use serde_json::json;

        assert!(decode_state(&encode_json(json!({"email": "test@example.com"}))).is_none());
        assert!(decode_state(&encode_json(json!({"code": "abc123"}))).is_none());
        assert!(decode_state(&encode_json(json!({}))).is_none());
    }

    #[test]
    fn test_decode_rejects_non_object_json() {
        use serde_json::json;

        assert!(decode_state(&encode_json(json!(["a", "b"]))).is_none());
        assert!(decode_state(&encode_json(json!("hello"))).is_none());
        assert!(decode_state(&encode_json(json!(123))).is_none());
        assert!(decode_state(&encode_json(json!(null))).is_none());
    }

    #[test]
    fn test_decode_rejects_non_string_or_empty_fields() {
        use serde_json::json;

        assert!(decode_state(&encode_json(json!({"email": 123, "code": "abc"}))).is_none());
        assert!(
            decode_state(&encode_json(json!({"email": "test@example.com", "code": 123})))
                .is_none()
        );
        assert!(
            decode_state(&encode_json(json!({"email": "test@example.com", "code": null})))
                .is_none()
        );
        assert!(decode_state(&encode_json(json!({"email": "", "code": "abc"}))).is_none());
        assert!(
            decode_state(&encode_json(json!({"email": "test@example.com", "code": ""})))
                .is_none()
        );
    }

    #[test]
    fn test_state_from_url_ignores_other_params() {
        let service = service();
        let url = service.generate_url_at("test@example.com", T0).unwrap();
        let url = format!("{url}&utm_source=email#top");

        let state = state_from_url(&url).unwrap();
        assert_eq!(state.email, "test@example.com");

        assert!(state_from_url("http://localhost:3000/auth/magic-link/callback").is_none());
        assert!(state_from_url("http://localhost:3000/?other=1").is_none());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = MagicLinkService::new(Secrets::new("", "localhost:3000"));
        assert!(matches!(result, Err(Error::Crypto(_))));
    }

    #[tokio::test]
    async fn test_concurrent_verification() {
        let service = Arc::new(service());
        let code = service.generate_code("test@example.com", T0);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                let code = code.clone();
                tokio::spawn(async move {
                    service.verify_code("test@example.com", &code, T0 + i * 1_000)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
