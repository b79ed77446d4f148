//! Request signing for outbound service calls.
//!
//! A shared secret is narrowed through a chain of HMAC-SHA256 operations into
//! a single-use key bound to the request timestamp and API identity, which
//! then signs a canonical string over the payload hash and the caller's
//! channel and user id. Everything here is a pure function of its inputs.
//!
//! # Example
//!
//! ```
//! use sg_sign::{sign, verify, SigningAttributes};
//!
//! let attrs = SigningAttributes::new("t1", "order", "v1", "web", "u1");
//! let signature = sign(b"k", &attrs, b"{}");
//!
//! assert_eq!(signature.len(), 64);
//! assert!(verify(b"k", &attrs, b"{}", &signature));
//! ```

pub mod attach;
pub mod headers;
pub mod scheme;

pub use attach::{
    attach_signature, parse_authorization, verify_headers, VerifyError, SIGNED_HEADER_NAMES,
};
pub use headers::Headers;
pub use scheme::{
    derive_signing_key, sign, string_to_sign, verify, Signer, SigningAttributes, SigningKey,
    ALGORITHM, SIGNATURE_HEX_LEN, TERMINATOR,
};
