//! HMAC-SHA256 authentication for the BitMEX API.
//!
//! BitMEX signs each request with HMAC-SHA256 over
//! `verb + path + expires + body`, rendered as lowercase hex. The expiry is
//! an epoch-milliseconds timestamp 60 seconds in the future; the exchange
//! rejects the request once it passes.
//!
//! # Security
//!
//! - Credentials are loaded from environment variables
//! - The API secret is never logged and is zeroized on drop
//!
//! # Example
//!
//! ```ignore
//! use hedge_trade_bitmex::auth::{BitmexAuthConfig, BitmexCredentials};
//!
//! let credentials = BitmexCredentials::from_env(BitmexAuthConfig::default())?;
//! let headers = credentials.sign_request("GET", "/api/v1/instrument", "")?;
//! ```

use crate::error::{BitmexError, Result};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Validity window granted to each signed request, in milliseconds.
const EXPIRES_WINDOW_MS: u64 = 60_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for BitMEX authentication.
#[derive(Debug, Clone)]
pub struct BitmexAuthConfig {
    /// Environment variable name for the API key.
    pub api_key_env: String,

    /// Environment variable name for the API secret.
    pub api_secret_env: String,
}

impl Default for BitmexAuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: "BITMEX_API_KEY".to_string(),
            api_secret_env: "BITMEX_API_SECRET".to_string(),
        }
    }
}

impl BitmexAuthConfig {
    /// Creates config for the testnet environment.
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            api_key_env: "BITMEX_TESTNET_API_KEY".to_string(),
            api_secret_env: "BITMEX_TESTNET_API_SECRET".to_string(),
        }
    }

    /// Sets custom environment variable names.
    #[must_use]
    pub fn with_env_vars(
        mut self,
        api_key_env: impl Into<String>,
        api_secret_env: impl Into<String>,
    ) -> Self {
        self.api_key_env = api_key_env.into();
        self.api_secret_env = api_secret_env.into();
        self
    }
}

// =============================================================================
// Signed Headers
// =============================================================================

/// Headers required for authenticated BitMEX API requests.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// api-key header.
    pub api_key: String,

    /// api-signature header (lowercase hex HMAC-SHA256).
    pub signature: String,

    /// api-expires header (epoch milliseconds).
    pub expires: String,
}

impl SignedHeaders {
    /// Returns headers as tuples for reqwest.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 3] {
        [
            ("api-expires", &self.expires),
            ("api-key", &self.api_key),
            ("api-signature", &self.signature),
        ]
    }
}

// =============================================================================
// BitmexCredentials
// =============================================================================

/// API key pair for signing BitMEX requests.
///
/// The secret is held as a [`SecretString`] and the key is zeroized on drop.
/// An empty secret signs without error; the exchange simply rejects the
/// resulting signature.
pub struct BitmexCredentials {
    /// API key.
    api_key: String,

    /// API secret used as the HMAC key.
    api_secret: SecretString,
}

impl std::fmt::Debug for BitmexCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmexCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl Drop for BitmexCredentials {
    fn drop(&mut self) {
        self.api_key.zeroize();
        // SecretString zeroizes itself on drop.
    }
}

impl BitmexCredentials {
    /// Creates credentials from a key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// Creates credentials from environment variables.
    ///
    /// # Arguments
    /// * `config` - Configuration specifying environment variable names
    ///
    /// # Errors
    /// Returns error if environment variables are missing.
    pub fn from_env(config: BitmexAuthConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BitmexError::Configuration(format!(
                "missing environment variable: {}",
                config.api_key_env
            ))
        })?;

        let api_secret = std::env::var(&config.api_secret_env).map_err(|_| {
            BitmexError::Configuration(format!(
                "missing environment variable: {}",
                config.api_secret_env
            ))
        })?;

        Ok(Self::new(api_key, api_secret))
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signs a request and returns the required headers.
    ///
    /// The `body` must be the exact string the request will transmit;
    /// serializing it a second time elsewhere can reorder keys and
    /// invalidate the signature.
    ///
    /// # Arguments
    /// * `verb` - HTTP method (GET, POST, etc.)
    /// * `path` - API path (e.g., "/api/v1/instrument")
    /// * `body` - Serialized request body
    ///
    /// # Errors
    /// Returns error if the system clock is unreadable or signing fails.
    pub fn sign_request(&self, verb: &str, path: &str, body: &str) -> Result<SignedHeaders> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| BitmexError::Signing(format!("failed to get timestamp: {e}")))?
            .as_millis() as u64;

        self.sign_request_at(verb, path, body, now_ms + EXPIRES_WINDOW_MS)
    }

    /// Signs a request with a specific expiry (useful for testing).
    ///
    /// # Errors
    /// Returns error if the HMAC cannot be keyed.
    pub fn sign_request_at(
        &self,
        verb: &str,
        path: &str,
        body: &str,
        expires_ms: u64,
    ) -> Result<SignedHeaders> {
        let expires = expires_ms.to_string();
        let message = format!("{verb}{path}{expires}{body}");

        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .map_err(|e| BitmexError::Signing(format!("invalid key length: {e}")))?;
        mac.update(message.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(SignedHeaders {
            api_key: self.api_key.clone(),
            signature,
            expires,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Key pair from the BitMEX API documentation's signature examples.
    const DOC_KEY: &str = "LAqUlngMIQkIUjXMUreyu3qn";
    const DOC_SECRET: &str = "chNOOS4KvNXR_Xq4k4c9qsfoKWvnDecLATCRlcBwyKDYnWgO";

    // ==================== Config Tests ====================

    #[test]
    fn test_auth_config_default() {
        let config = BitmexAuthConfig::default();
        assert_eq!(config.api_key_env, "BITMEX_API_KEY");
        assert_eq!(config.api_secret_env, "BITMEX_API_SECRET");
    }

    #[test]
    fn test_auth_config_testnet() {
        let config = BitmexAuthConfig::testnet();
        assert_eq!(config.api_key_env, "BITMEX_TESTNET_API_KEY");
        assert_eq!(config.api_secret_env, "BITMEX_TESTNET_API_SECRET");
    }

    #[test]
    fn test_auth_config_custom_env() {
        let config = BitmexAuthConfig::default().with_env_vars("CUSTOM_KEY", "CUSTOM_SECRET");
        assert_eq!(config.api_key_env, "CUSTOM_KEY");
        assert_eq!(config.api_secret_env, "CUSTOM_SECRET");
    }

    #[test]
    fn test_from_env_missing_api_key() {
        std::env::remove_var("TEST_MISSING_BITMEX_KEY");

        let config = BitmexAuthConfig::default()
            .with_env_vars("TEST_MISSING_BITMEX_KEY", "TEST_MISSING_BITMEX_SECRET");

        let result = BitmexCredentials::from_env(config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing environment variable"));
    }

    // ==================== Signature Vector Tests ====================

    #[test]
    fn test_signature_get_vector() {
        // GET /api/v1/instrument, expires 1518064236, empty body, from the
        // BitMEX API key usage documentation.
        let credentials = BitmexCredentials::new(DOC_KEY, DOC_SECRET);
        let headers = credentials
            .sign_request_at("GET", "/api/v1/instrument", "", 1518064236)
            .unwrap();

        assert_eq!(
            headers.signature,
            "c7682d435d0cfe87c16098df34ef2eb5a549d4c5a3c2b1f0f77b8af73423bf00"
        );
        assert_eq!(headers.expires, "1518064236");
        assert_eq!(headers.api_key, DOC_KEY);
    }

    #[test]
    fn test_signature_post_vector() {
        // POST /api/v1/order with a body, expires 1518064238, from the same
        // documentation page.
        let credentials = BitmexCredentials::new(DOC_KEY, DOC_SECRET);
        let body = r#"{"symbol":"XBTM15","price":219.0,"clOrdID":"mm_bmex_1a/oemUeQ4CAJZgP3fjHsA","orderQty":98}"#;
        let headers = credentials
            .sign_request_at("POST", "/api/v1/order", body, 1518064238)
            .unwrap();

        assert_eq!(
            headers.signature,
            "1749cd2ccae4aa49048ae09f0b95110cee706e0944e6a14ad0b3a8cb45bd336b"
        );
    }

    #[test]
    fn test_signature_deterministic() {
        let credentials = BitmexCredentials::new("key", "secret");
        let a = credentials
            .sign_request_at("GET", "/api/v1/position", "", 1700000000000)
            .unwrap();
        let b = credentials
            .sign_request_at("GET", "/api/v1/position", "", 1700000000000)
            .unwrap();
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn test_signature_varies_with_body() {
        let credentials = BitmexCredentials::new("key", "secret");
        let empty = credentials
            .sign_request_at("POST", "/api/v1/order", "", 1700000000000)
            .unwrap();
        let with_body = credentials
            .sign_request_at("POST", "/api/v1/order", "{}", 1700000000000)
            .unwrap();
        assert_ne!(empty.signature, with_body.signature);
    }

    #[test]
    fn test_empty_secret_signs_without_error() {
        // A missing secret produces a well-defined but invalid signature;
        // the failure surfaces at the exchange, not here.
        let credentials = BitmexCredentials::new("key", "");
        let headers = credentials
            .sign_request_at("GET", "/api/v1/user/margin", "", 1700000000000)
            .unwrap();
        assert_eq!(headers.signature.len(), 64);
        assert!(headers.signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let credentials = BitmexCredentials::new(DOC_KEY, DOC_SECRET);
        let headers = credentials
            .sign_request_at("GET", "/api/v1/instrument", "", 1518064236)
            .unwrap();
        assert_eq!(headers.signature, headers.signature.to_lowercase());
    }

    #[test]
    fn test_sign_request_expiry_in_future() {
        let credentials = BitmexCredentials::new("key", "secret");
        let before_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let headers = credentials.sign_request("GET", "/api/v1/instrument", "").unwrap();
        let expires: u64 = headers.expires.parse().unwrap();

        assert!(expires >= before_ms + EXPIRES_WINDOW_MS);
    }

    // ==================== Header Tests ====================

    #[test]
    fn test_signed_headers_as_tuples() {
        let headers = SignedHeaders {
            api_key: "test-key".to_string(),
            signature: "deadbeef".to_string(),
            expires: "1700000000000".to_string(),
        };

        let tuples = headers.as_tuples();
        assert_eq!(tuples[0], ("api-expires", "1700000000000"));
        assert_eq!(tuples[1], ("api-key", "test-key"));
        assert_eq!(tuples[2], ("api-signature", "deadbeef"));
    }

    // ==================== Secret Handling Tests ====================

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = BitmexCredentials::new("visible-key", "super-secret");
        let debug_output = format!("{:?}", credentials);
        assert!(debug_output.contains("visible-key"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret"));
    }
}
