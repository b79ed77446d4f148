//! Layered HMAC-SHA256 signing.
//!
//! The long-lived secret is narrowed into a single-use signing key by
//! chaining HMACs over the timestamp, API version and API name, then a fixed
//! terminator. That key signs a canonical string built from the payload hash
//! and the caller identity:
//!
//! ```text
//! kDate      = HMAC(secret,   timestamp)
//! kVersion   = HMAC(kDate,    api_version)
//! kApi       = HMAC(kVersion, api_name)
//! signingKey = HMAC(kApi,     "TERMINATOR")
//! request      = channel + user_id + hex(SHA256(payload))
//! stringToSign = "HMAC-SHA256" + timestamp + hex(SHA256(request))
//! signature    = hex(HMAC(signingKey, stringToSign))
//! ```
//!
//! The concatenation order is part of the wire contract with verifiers.

use crate::headers::{self, Headers};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Algorithm tag prefixed to the string to sign.
pub const ALGORITHM: &str = "HMAC-SHA256";

/// Final input of the key derivation chain.
pub const TERMINATOR: &str = "TERMINATOR";

/// Length of a hex-encoded signature.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Request attributes bound into the signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningAttributes {
    pub timestamp: String,
    pub api_name: String,
    pub api_version: String,
    pub channel: String,
    pub user_id: String,
}

impl SigningAttributes {
    pub fn new(
        timestamp: &str,
        api_name: &str,
        api_version: &str,
        channel: &str,
        user_id: &str,
    ) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            api_name: api_name.to_string(),
            api_version: api_version.to_string(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Read the attribute headers. Absent headers read as empty strings.
    pub fn from_headers(headers: &Headers) -> Self {
        let get = |name: &str| headers.get(name).unwrap_or_default().to_string();
        Self {
            timestamp: get(headers::TIMESTAMP),
            api_name: get(headers::API_NAME),
            api_version: get(headers::API_VERSION),
            channel: get(headers::CHANNEL),
            user_id: get(headers::USER_ID),
        }
    }

    /// Write the attributes as headers.
    pub fn to_headers(&self, headers: &mut Headers) {
        headers.set(headers::TIMESTAMP, self.timestamp.as_str());
        headers.set(headers::API_NAME, self.api_name.as_str());
        headers.set(headers::API_VERSION, self.api_version.as_str());
        headers.set(headers::CHANNEL, self.channel.as_str());
        headers.set(headers::USER_ID, self.user_id.as_str());
    }
}

/// Derived single-use signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = new_mac(key);
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Run the key derivation chain.
pub fn derive_signing_key(
    secret: &[u8],
    timestamp: &str,
    api_name: &str,
    api_version: &str,
) -> SigningKey {
    let k_date = hmac_sha256(secret, timestamp.as_bytes());
    let k_version = hmac_sha256(&k_date, api_version.as_bytes());
    let k_api = hmac_sha256(&k_version, api_name.as_bytes());
    SigningKey(hmac_sha256(&k_api, TERMINATOR.as_bytes()))
}

/// Build the canonical string to sign.
pub fn string_to_sign(attrs: &SigningAttributes, payload: &[u8]) -> String {
    let request = format!("{}{}{}", attrs.channel, attrs.user_id, sha256_hex(payload));
    format!(
        "{}{}{}",
        ALGORITHM,
        attrs.timestamp,
        sha256_hex(request.as_bytes())
    )
}

fn signing_mac(secret: &[u8], attrs: &SigningAttributes, payload: &[u8]) -> HmacSha256 {
    let key = derive_signing_key(secret, &attrs.timestamp, &attrs.api_name, &attrs.api_version);
    let mut mac = new_mac(key.as_bytes());
    mac.update(string_to_sign(attrs, payload).as_bytes());
    mac
}

/// Sign a request. Returns 64 lowercase hex characters.
///
/// Empty inputs are accepted and produce a deterministic signature.
pub fn sign(secret: &[u8], attrs: &SigningAttributes, payload: &[u8]) -> String {
    hex::encode(signing_mac(secret, attrs, payload).finalize().into_bytes())
}

/// Recompute the signature and compare in constant time.
///
/// Malformed hex never matches.
pub fn verify(
    secret: &[u8],
    attrs: &SigningAttributes,
    payload: &[u8],
    signature_hex: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    signing_mac(secret, attrs, payload)
        .verify_slice(&expected)
        .is_ok()
}

/// Holds a shared secret and signs with it.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign(&self, attrs: &SigningAttributes, payload: &[u8]) -> String {
        sign(&self.secret, attrs, payload)
    }

    pub fn verify(&self, attrs: &SigningAttributes, payload: &[u8], signature_hex: &str) -> bool {
        verify(&self.secret, attrs, payload, signature_hex)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_attrs() -> SigningAttributes {
        SigningAttributes::new("t1", "order", "v1", "web", "u1")
    }

    #[test]
    fn test_conformance_vector() {
        assert_eq!(
            sign(b"k", &vector_attrs(), b"{}"),
            "0b7b2163bbc7489eb7c49a37e7d40fa6ff90f74f39f1558bda6571a0928331a5"
        );
    }

    #[test]
    fn test_string_to_sign_layout() {
        assert_eq!(
            string_to_sign(&vector_attrs(), b"{}"),
            "HMAC-SHA256t1951e96d37926bdd6c01cb6933dcdebf5723295a5b23eda4df368b619f3aeba66"
        );
    }

    #[test]
    fn test_empty_inputs_still_sign() {
        let sig = sign(b"", &SigningAttributes::default(), b"");
        assert_eq!(
            sig,
            "9e096fcabf0519a477c890a7ae52baf2445b53c77241fccf20b17f5bea314756"
        );
    }

    #[test]
    fn test_signature_shape() {
        let sig = sign(b"secret", &vector_attrs(), b"payload");
        assert_eq!(sig.len(), SIGNATURE_HEX_LEN);
        assert!(sig.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_key_derivation_depends_on_each_step() {
        let base = derive_signing_key(b"k", "t1", "order", "v1");
        assert_eq!(base, derive_signing_key(b"k", "t1", "order", "v1"));
        assert_ne!(base, derive_signing_key(b"k2", "t1", "order", "v1"));
        assert_ne!(base, derive_signing_key(b"k", "t2", "order", "v1"));
        assert_ne!(base, derive_signing_key(b"k", "t1", "refund", "v1"));
        assert_ne!(base, derive_signing_key(b"k", "t1", "order", "v2"));
        // Name and version are keyed in distinct steps.
        assert_ne!(base, derive_signing_key(b"k", "t1", "v1", "order"));
    }

    #[test]
    fn test_verify() {
        let attrs = vector_attrs();
        let sig = sign(b"k", &attrs, b"{}");

        assert!(verify(b"k", &attrs, b"{}", &sig));
        assert!(verify(b"k", &attrs, b"{}", &sig.to_uppercase()));
        assert!(!verify(b"k", &attrs, b"{ }", &sig));
        assert!(!verify(b"other", &attrs, b"{}", &sig));
        assert!(!verify(b"k", &attrs, b"{}", "not-hex"));
        assert!(!verify(b"k", &attrs, b"{}", &sig[..32]));
    }

    #[test]
    fn test_attributes_header_roundtrip() {
        let mut headers = Headers::new();
        vector_attrs().to_headers(&mut headers);

        assert_eq!(headers.get("API-NAME"), Some("order"));
        assert_eq!(SigningAttributes::from_headers(&headers), vector_attrs());
    }

    #[test]
    fn test_missing_headers_read_empty() {
        let headers = Headers::new().with(headers::CHANNEL, "web");
        let attrs = SigningAttributes::from_headers(&headers);

        assert_eq!(attrs.channel, "web");
        assert_eq!(attrs.timestamp, "");
        assert_eq!(attrs.user_id, "");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let signer = Signer::new("hunter2");
        assert!(!format!("{:?}", signer).contains("hunter2"));

        let key = derive_signing_key(b"k", "t1", "order", "v1");
        assert_eq!(format!("{:?}", key), "SigningKey(..)");
    }
}
