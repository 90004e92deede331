//! HMAC-SHA512 request signing for the ICONOMI API
//!
//! Message format: {timestamp_millis}{METHOD}{path}
//! - Key: raw UTF-8 bytes of the secret (no base64 decoding)
//! - Algorithm: HMAC-SHA512
//! - Output: standard base64 with padding

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use statusbar_core::{FetchError, FetchResult};

type HmacSha512 = Hmac<Sha512>;

/// Inputs of one authenticated call, built fresh per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequestContext {
    pub timestamp_millis: i64,
    pub method: String,
    pub path: String,
}

impl SignedRequestContext {
    pub fn new(timestamp_millis: i64, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp_millis,
            method: method.into(),
            path: path.into(),
        }
    }

    /// Context stamped with the current wall-clock time
    pub fn now(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Utc::now().timestamp_millis(), method, path)
    }

    /// The exact string that gets signed
    pub fn message(&self) -> FetchResult<String> {
        if !self.path.starts_with('/') {
            return Err(FetchError::signing(format!(
                "Signed path must start with '/': {}",
                self.path
            )));
        }

        // Query string is never part of the signed path
        let path = self.path.split('?').next().unwrap_or_default();

        Ok(format!(
            "{}{}{}",
            self.timestamp_millis,
            self.method.to_ascii_uppercase(),
            path
        ))
    }

    pub fn sign(&self, secret_key: &str) -> FetchResult<String> {
        if secret_key.is_empty() {
            return Err(FetchError::signing("Secret key is empty"));
        }

        let message = self.message()?;

        let mut mac = HmacSha512::new_from_slice(secret_key.as_bytes())
            .map_err(|e| FetchError::signing(format!("Failed to create HMAC: {}", e)))?;
        mac.update(message.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Sign `(timestamp, method, path)` with the given secret
pub fn sign(timestamp_millis: i64, method: &str, path: &str, secret_key: &str) -> FetchResult<String> {
    SignedRequestContext::new(timestamp_millis, method, path).sign(secret_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            sign(1700000000000, "GET", "/v1/user/balance", "secret").unwrap(),
            "99A1PrY9yN0XJ0VuGPKHD9Jeqkd9iCTxn3//PVD6WoDfmn/HGceJ0/1nXZKxkcOU2ppM2Jk0XDbrPCzlv5RecQ=="
        );
        assert_eq!(
            sign(0, "GET", "/", "k").unwrap(),
            "8C4wmeBDgNMcvIwfyVL5sTHHpegk08uiFvTUFukdRXC30AL3IA3FjLzFf5gJbT2QpkjW7jPn5VFgqb74PKKafQ=="
        );
    }

    #[test]
    fn test_signature_is_deterministic_sha512_digest() {
        let first = sign(1712345678901, "GET", "/v1/user/balance", "s3cr3t").unwrap();
        let second = sign(1712345678901, "GET", "/v1/user/balance", "s3cr3t").unwrap();
        assert_eq!(first, second);

        let raw = STANDARD.decode(&first).unwrap();
        assert_eq!(raw.len(), 64);
    }

    #[test]
    fn test_method_is_uppercased_and_query_dropped() {
        let ctx = SignedRequestContext::new(42, "get", "/v1/user/balance?currency=EUR");
        assert_eq!(ctx.message().unwrap(), "42GET/v1/user/balance");
        assert_eq!(
            ctx.sign("key").unwrap(),
            sign(42, "GET", "/v1/user/balance", "key").unwrap()
        );
    }

    #[test]
    fn test_inputs_change_signature() {
        let base = sign(1, "GET", "/v1/user/balance", "key").unwrap();
        assert_ne!(base, sign(2, "GET", "/v1/user/balance", "key").unwrap());
        assert_ne!(base, sign(1, "POST", "/v1/user/balance", "key").unwrap());
        assert_ne!(base, sign(1, "GET", "/v1/user/balance", "other").unwrap());
    }

    #[test]
    fn test_preconditions() {
        assert!(matches!(
            sign(1, "GET", "/v1/user/balance", ""),
            Err(FetchError::SigningPrecondition(_))
        ));
        assert!(matches!(
            sign(1, "GET", "v1/user/balance", "key"),
            Err(FetchError::SigningPrecondition(_))
        ));
    }

    #[test]
    fn test_now_uses_wall_clock() {
        let before = Utc::now().timestamp_millis();
        let ctx = SignedRequestContext::now("GET", "/");
        assert!(ctx.timestamp_millis >= before);
    }
}
