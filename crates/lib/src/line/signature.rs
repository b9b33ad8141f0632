//! X-Line-Signature: base64(HMAC-SHA256(channel secret, raw body)).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, body: &[u8]) -> HmacSha256 {
    // HMAC takes keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key of any length");
    mac.update(body);
    mac
}

/// Signature LINE would send for `body` on a channel with `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    STANDARD.encode(mac(secret, body).finalize().into_bytes())
}

/// Check the header value against the body. The digest comparison is constant-time.
pub fn verify(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.map(str::trim).unwrap_or("");
    if header.is_empty() {
        return Err(SignatureError::Missing);
    }
    let provided = STANDARD
        .decode(header)
        .map_err(|_| SignatureError::Malformed)?;
    mac(secret, body)
        .verify_slice(&provided)
        .map_err(|_| SignatureError::Mismatch)
}
