//! HMAC-SHA256 request signing for secured robots.
//!
//! A robot created with the "signature" security setting only accepts
//! requests whose URL carries a `timestamp` (ms since epoch) and a `sign`
//! computed from that timestamp and the shared secret.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a timestamp with the robot secret.
///
/// The MAC input is `"{timestamp}\n{secret}"`, keyed by the secret, and the
/// digest is base64 (standard alphabet, padded) encoded.
pub fn sign(timestamp_ms: i64, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(format!("{}\n{}", timestamp_ms, secret).as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_known_vector() {
        let secret = "SEC8a9fc6f36f447d7c497f8c8e08accde4c49b4b5a366fa3903f47e250d6746979";
        assert_eq!(
            sign(1612172996026, secret),
            "/hVashZiXp9FM7TxATe7Un+74AxwL9CxC6fhBIDcPpA="
        );
    }

    #[test]
    fn test_sign_short_secret() {
        assert_eq!(
            sign(1700000000000, "secret"),
            "OuzzJR5+xZ4/EYwqtNt6sMYZQMTa/HEGvc9miJe7XzY="
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        assert_eq!(sign(42, "abc"), sign(42, "abc"));
    }

    #[test]
    fn test_sign_varies_with_inputs() {
        let base = sign(1700000000000, "secret");
        assert_ne!(base, sign(1700000000001, "secret"));
        assert_ne!(base, sign(1700000000000, "other"));
        assert_eq!(
            sign(1700000000001, "secret"),
            "dycYwoGVgpVv3mP3qhjBsD7wPlevLM8sebujic6mSdE="
        );
    }
}
