use hmac::{Hmac, Mac};
use sha2::Sha256;

/// The header the gateway sends the body signature in.
pub const WEBHOOK_HMAC_HEADER: &str = "X-Gateway-Hmac-Sha256";

/// Base64-encoded HMAC-SHA256 of `data` under `secret`. This is the signature the gateway attaches to
/// webhook deliveries.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length, so this branch is unreachable
        Err(_) => return String::new(),
    };
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}
