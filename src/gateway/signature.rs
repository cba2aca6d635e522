//! Callback signature scheme: hex HMAC-SHA256 over `"{order_id}|{payment_id}"`
//! keyed with the gateway secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(remote_order_id: &str, remote_payment_id: &str, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts keys of any length");
    mac.update(remote_order_id.as_bytes());
    mac.update(b"|");
    mac.update(remote_payment_id.as_bytes());
    mac
}

/// The signature the gateway attaches to a successful payment callback.
pub fn payment_signature(remote_order_id: &str, remote_payment_id: &str, secret: &str) -> String {
    hex::encode(mac_for(remote_order_id, remote_payment_id, secret).finalize().into_bytes())
}

/// Check a supplied callback signature. Pure, no side effects; the digest
/// comparison is constant-time (`Mac::verify_slice`). A signature that is
/// not valid hex can never match.
pub fn verify_signature(
    remote_order_id: &str,
    remote_payment_id: &str,
    signature: &str,
    secret: &str,
) -> bool {
    let Ok(supplied) = hex::decode(signature) else {
        return false;
    };
    mac_for(remote_order_id, remote_payment_id, secret)
        .verify_slice(&supplied)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "shhh";

    #[test]
    fn signature_round_trips() {
        let sig = payment_signature("order_abc", "pay_xyz", SECRET);
        assert!(verify_signature("order_abc", "pay_xyz", &sig, SECRET));
    }

    #[test]
    fn tampered_payment_id_fails() {
        let sig = payment_signature("order_abc", "pay_xyz", SECRET);
        assert!(!verify_signature("order_abc", "pay_evil", &sig, SECRET));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = payment_signature("order_abc", "pay_xyz", SECRET);
        assert!(!verify_signature("order_abc", "pay_xyz", &sig, "other"));
    }

    #[test]
    fn non_hex_signature_fails_cleanly() {
        assert!(!verify_signature("order_abc", "pay_xyz", "not-hex!", SECRET));
    }

    #[test]
    fn digest_is_hex_sha256_sized() {
        let sig = payment_signature("order_abc", "pay_xyz", SECRET);
        assert_eq!(sig.len(), 64);
        assert!(sig.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
