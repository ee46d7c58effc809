//! Request signing for private OKX endpoints

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use common::error::{Error, Result};

/// Produces the `OK-ACCESS-SIGN` header value for a request
pub trait RequestSigner: Send + Sync {
    /// Sign `timestamp + method + request_path + body`
    fn sign(&self, timestamp: &str, method: &str, request_path: &str, body: &str) -> Result<String>;
}

/// Base64 encoded HMAC-SHA256 signer keyed with the API secret
pub struct HmacSigner {
    secret: Vec<u8>,
}

impl HmacSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }
}

impl RequestSigner for HmacSigner {
    fn sign(&self, timestamp: &str, method: &str, request_path: &str, body: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| Error::ConfigurationError(format!("invalid signing key: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());

        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}
