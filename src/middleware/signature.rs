//! Authenticity checks for payment-gateway callbacks.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fields covered by Telr's `tran_check`, in signing order.
pub const TELR_CHECK_FIELDS: [&str; 15] = [
    "tran_store",
    "tran_type",
    "tran_class",
    "tran_test",
    "tran_ref",
    "tran_prevref",
    "tran_firstref",
    "tran_order",
    "tran_currency",
    "tran_amount",
    "tran_cartid",
    "tran_desc",
    "tran_status",
    "tran_authcode",
    "tran_authmessage",
];

/// `X-Tap-Signature` is the hex HMAC-SHA256 of the raw request body.
pub fn verify_tap_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// SHA-1 hex over `secret:field1:field2:...` with each value trimmed;
/// missing fields sign as empty.
pub fn telr_check(secret: &str, fields: &HashMap<String, String>) -> String {
    let mut parts = Vec::with_capacity(TELR_CHECK_FIELDS.len() + 1);
    parts.push(secret);
    for name in TELR_CHECK_FIELDS {
        parts.push(fields.get(name).map(|v| v.trim()).unwrap_or(""));
    }
    hex::encode(Sha1::digest(parts.join(":").as_bytes()))
}

pub fn verify_telr_check(secret: &str, fields: &HashMap<String, String>) -> bool {
    match fields.get("tran_check") {
        Some(given) => telr_check(secret, fields).eq_ignore_ascii_case(given.trim()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap_sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("key");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn tap_signature_matches_body() {
        let body = br#"{"type":"charge.succeeded","data":{"id":"chg_1"}}"#;
        let signature = tap_sign("whsec", body);
        assert!(verify_tap_signature("whsec", body, &signature));
        assert!(!verify_tap_signature("other", body, &signature));
        assert!(!verify_tap_signature("whsec", b"{}", &signature));
        assert!(!verify_tap_signature("whsec", body, "not-hex"));
    }

    #[test]
    fn telr_check_uses_every_field_in_order() {
        let mut fields: HashMap<String, String> = HashMap::new();
        fields.insert("tran_store".into(), "1234".into());
        fields.insert("tran_order".into(), "ORD1".into());
        fields.insert("tran_status".into(), "A".into());

        let expected_input = "secret:1234:::::::ORD1:::::A::";
        let expected = hex::encode(Sha1::digest(expected_input.as_bytes()));
        assert_eq!(telr_check("secret", &fields), expected);

        fields.insert("tran_check".into(), expected.to_uppercase());
        assert!(verify_telr_check("secret", &fields));

        fields.insert("tran_status".into(), "D".into());
        assert!(!verify_telr_check("secret", &fields));
    }

    #[test]
    fn telr_check_ignores_padding_around_values() {
        let mut fields: HashMap<String, String> = HashMap::new();
        fields.insert("tran_store".into(), "1234".into());
        fields.insert("tran_order".into(), "ORD1".into());
        fields.insert("tran_status".into(), "A".into());
        let clean = telr_check("secret", &fields);

        fields.insert("tran_store".into(), " 1234\n".into());
        fields.insert("tran_status".into(), "A ".into());
        assert_eq!(telr_check("secret", &fields), clean);

        fields.insert("tran_check".into(), clean);
        assert!(verify_telr_check("secret", &fields));
    }

    #[test]
    fn telr_callback_without_check_is_rejected() {
        let fields = HashMap::new();
        assert!(!verify_telr_check("secret", &fields));
    }
}
