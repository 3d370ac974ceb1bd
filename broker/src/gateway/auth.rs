//! HMAC-SHA256 request signing for the brokerage gateway.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Canonical string a request signature covers.
pub fn payload(timestamp_ms: u64, method: &str, path: &str, body: &str) -> String {
    format!("{timestamp_ms}{method}{path}{body}")
}

/// Sign a canonical payload with HMAC-SHA256.
///
/// Returns the hex-encoded signature sent as `X-Signature`.
pub fn sign(payload: &str, secret_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}
