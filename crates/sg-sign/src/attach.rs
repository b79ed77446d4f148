//! Attaching and checking signature headers.
//!
//! The signer sends the attribute headers alongside
//! `Authorization: HMAC-SHA256 Signature=<hex>` and an `x-signed-headers`
//! list naming the attributes covered. The receiver rebuilds the attributes
//! from the same headers and recomputes the chain.

use crate::headers::{self, Headers};
use crate::scheme::{SigningAttributes, Signer, ALGORITHM};
use thiserror::Error;

/// Attribute headers covered by the signature, in signing order.
pub const SIGNED_HEADER_NAMES: &str = "timestamp;api-name;api-version;channel;user-id";

const SIGNATURE_PARAM: &str = "Signature=";

/// Why an inbound signature was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("missing Authorization header")]
    MissingAuthorization,

    #[error("missing x-signed-headers header")]
    MissingSignedHeaders,

    /// The signed header list is not one this verifier understands.
    #[error("unsupported signed headers: {0}")]
    UnsupportedSignedHeaders(String),

    /// The Authorization header is not `HMAC-SHA256 Signature=<hex>`.
    #[error("malformed Authorization header")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,
}

/// Sign `payload` using the attribute headers already present on `headers`.
///
/// Sets `Authorization` and `x-signed-headers` and returns the signature.
pub fn attach_signature(headers: &mut Headers, signer: &Signer, payload: &[u8]) -> String {
    let attrs = SigningAttributes::from_headers(headers);
    let signature = signer.sign(&attrs, payload);

    headers.set(
        headers::AUTHORIZATION,
        format!("{} {}{}", ALGORITHM, SIGNATURE_PARAM, signature),
    );
    headers.set(headers::SIGNED_HEADERS, SIGNED_HEADER_NAMES);
    signature
}

/// Extract the hex signature from an `Authorization` value.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let rest = value.trim().strip_prefix(ALGORITHM)?;
    let signature = rest.trim_start().strip_prefix(SIGNATURE_PARAM)?.trim();
    if signature.is_empty() {
        None
    } else {
        Some(signature)
    }
}

/// Check the signature headers of an inbound request.
pub fn verify_headers(
    headers: &Headers,
    signer: &Signer,
    payload: &[u8],
) -> Result<(), VerifyError> {
    let authorization = headers
        .get(headers::AUTHORIZATION)
        .filter(|v| !v.is_empty())
        .ok_or(VerifyError::MissingAuthorization)?;
    let signed = headers
        .get(headers::SIGNED_HEADERS)
        .filter(|v| !v.is_empty())
        .ok_or(VerifyError::MissingSignedHeaders)?;

    if !signed.eq_ignore_ascii_case(SIGNED_HEADER_NAMES) {
        return Err(VerifyError::UnsupportedSignedHeaders(signed.to_string()));
    }

    let signature = parse_authorization(authorization).ok_or(VerifyError::Malformed)?;
    let attrs = SigningAttributes::from_headers(headers);

    if signer.verify(&attrs, payload, signature) {
        Ok(())
    } else {
        Err(VerifyError::Mismatch)
    }
}
