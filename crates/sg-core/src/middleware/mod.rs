//! Transport-agnostic request middleware.
//!
//! A [`RequestContext`] carries what a transport would expose about one call:
//! which side of the call we are on, the operation, its headers and the
//! correlation id. The functions here are the steps a server or client chain
//! runs around a handler; [`LoggingMiddleware`] wraps the handler itself.

mod logging;

pub use logging::{extract_error, Loggable, LoggingMiddleware, ACCESS_LOG_TARGET};

use crate::error::ServiceError;
use sg_sign::headers;
use sg_sign::{attach_signature, verify_headers, Headers, Signer, VerifyError};

/// Which end of a call the middleware runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Client,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Server => "server",
            Side::Client => "client",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call transport information.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub side: Side,
    /// Transport kind, e.g. `http`.
    pub component: String,
    /// Operation name, e.g. `/order.v1.Orders/Create`.
    pub operation: String,
    pub headers: Headers,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(side: Side, component: &str, operation: &str) -> Self {
        RequestContext {
            side,
            component: component.to_string(),
            operation: operation.to_string(),
            headers: Headers::new(),
            correlation_id: None,
        }
    }

    pub fn server(component: &str, operation: &str) -> Self {
        Self::new(Side::Server, component, operation)
    }

    pub fn client(component: &str, operation: &str) -> Self {
        Self::new(Side::Client, component, operation)
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// The context's correlation id, or a fresh UUID v4 when it has none.
pub fn correlation_id(ctx: &RequestContext) -> String {
    match &ctx.correlation_id {
        Some(id) => id.clone(),
        None => uuid::Uuid::new_v4().to_string(),
    }
}

/// Client side: put the correlation id on the outbound headers.
///
/// A generated id is stored back on the context so later log lines for the
/// same call carry the same value.
pub fn inject_client_correlation_id(ctx: &mut RequestContext) {
    let id = correlation_id(ctx);
    ctx.headers.set(headers::CORRELATION_ID, id.as_str());
    ctx.correlation_id = Some(id);
}

/// Server side: adopt the caller's correlation id, if it sent one.
pub fn extract_server_correlation_id(ctx: &mut RequestContext) {
    ctx.correlation_id = ctx
        .headers
        .get(headers::CORRELATION_ID)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
}

/// Server side: reject calls that carry no signature headers.
///
/// Presence only; [`verify_inbound`] checks the signature itself.
pub fn validate_security_headers(ctx: &RequestContext) -> Result<(), ServiceError> {
    let present = |name: &str| ctx.headers.get(name).is_some_and(|v| !v.is_empty());

    if present(headers::AUTHORIZATION) && present(headers::SIGNED_HEADERS) {
        Ok(())
    } else {
        Err(ServiceError::unauthorized(
            "UNAUTHORIZED",
            "Missing authorization/signature headers",
        ))
    }
}

/// Client side: sign `payload` with the context's attribute headers.
///
/// Returns the signature that was attached.
pub fn sign_outbound(ctx: &mut RequestContext, signer: &Signer, payload: &[u8]) -> String {
    attach_signature(&mut ctx.headers, signer, payload)
}

/// Server side: verify the inbound signature.
pub fn verify_inbound(
    ctx: &RequestContext,
    signer: &Signer,
    payload: &[u8],
) -> Result<(), ServiceError> {
    verify_headers(&ctx.headers, signer, payload).map_err(|err| {
        tracing::warn!(
            operation = %ctx.operation,
            error = %err,
            "inbound signature rejected"
        );
        match err {
            VerifyError::MissingAuthorization | VerifyError::MissingSignedHeaders => {
                ServiceError::unauthorized(
                    "UNAUTHORIZED",
                    "Missing authorization/signature headers",
                )
            }
            _ => ServiceError::unauthorized("INVALID_SIGNATURE", err.to_string()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_sign::SigningAttributes;

    fn signed_headers() -> Headers {
        let mut headers = Headers::new();
        SigningAttributes::new("t1", "order", "v1", "web", "u1").to_headers(&mut headers);
        headers
    }

    #[test]
    fn test_correlation_id_prefers_context() {
        let ctx = RequestContext::server("http", "/op").with_correlation_id("abc");
        assert_eq!(correlation_id(&ctx), "abc");
    }

    #[test]
    fn test_correlation_id_generates_uuid() {
        let ctx = RequestContext::server("http", "/op");
        let a = correlation_id(&ctx);
        let b = correlation_id(&ctx);

        assert!(uuid::Uuid::parse_str(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_client_injects_header() {
        let mut ctx = RequestContext::client("http", "/op").with_correlation_id("cid-1");
        inject_client_correlation_id(&mut ctx);
        assert_eq!(ctx.headers.get("X-Correlation-Id"), Some("cid-1"));
    }

    #[test]
    fn test_client_generated_id_is_kept() {
        let mut ctx = RequestContext::client("http", "/op");
        inject_client_correlation_id(&mut ctx);

        let header = ctx.headers.get(headers::CORRELATION_ID).unwrap().to_string();
        assert_eq!(ctx.correlation_id.as_deref(), Some(header.as_str()));
        assert_eq!(correlation_id(&ctx), header);
    }

    #[test]
    fn test_server_extracts_header() {
        let headers = Headers::new().with(headers::CORRELATION_ID, "from-peer");
        let mut ctx = RequestContext::server("http", "/op").with_headers(headers);

        extract_server_correlation_id(&mut ctx);
        assert_eq!(ctx.correlation_id.as_deref(), Some("from-peer"));
    }

    #[test]
    fn test_server_without_header_has_no_id() {
        let headers = Headers::new().with(headers::CORRELATION_ID, "");
        let mut ctx = RequestContext::server("http", "/op")
            .with_headers(headers)
            .with_correlation_id("stale");

        extract_server_correlation_id(&mut ctx);
        assert!(ctx.correlation_id.is_none());
    }

    #[test]
    fn test_validate_security_headers() {
        let missing = ServiceError::unauthorized(
            "UNAUTHORIZED",
            "Missing authorization/signature headers",
        );

        let ctx = RequestContext::server("http", "/op");
        assert_eq!(validate_security_headers(&ctx), Err(missing.clone()));

        let ctx = RequestContext::server("http", "/op")
            .with_headers(Headers::new().with(headers::AUTHORIZATION, "HMAC-SHA256 Signature=00"));
        assert_eq!(validate_security_headers(&ctx), Err(missing.clone()));

        let ctx = RequestContext::server("http", "/op").with_headers(
            Headers::new()
                .with(headers::AUTHORIZATION, "")
                .with(headers::SIGNED_HEADERS, "timestamp"),
        );
        assert_eq!(validate_security_headers(&ctx), Err(missing));

        let ctx = RequestContext::server("http", "/op").with_headers(
            Headers::new()
                .with(headers::AUTHORIZATION, "HMAC-SHA256 Signature=00")
                .with(headers::SIGNED_HEADERS, "timestamp"),
        );
        assert_eq!(validate_security_headers(&ctx), Ok(()));
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = Signer::new("k");
        let mut client = RequestContext::client("http", "/order.v1.Orders/Create")
            .with_headers(signed_headers());

        let signature = sign_outbound(&mut client, &signer, b"{}");
        assert_eq!(
            signature,
            "0b7b2163bbc7489eb7c49a37e7d40fa6ff90f74f39f1558bda6571a0928331a5"
        );

        let server = RequestContext::server("http", "/order.v1.Orders/Create")
            .with_headers(client.headers.clone());
        assert_eq!(validate_security_headers(&server), Ok(()));
        assert_eq!(verify_inbound(&server, &signer, b"{}"), Ok(()));

        let err = verify_inbound(&server, &signer, b"{\"tampered\":true}").unwrap_err();
        assert_eq!(err.code, 401);
        assert_eq!(err.reason, "INVALID_SIGNATURE");
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Server.to_string(), "server");
        assert_eq!(Side::Client.as_str(), "client");
    }
}
