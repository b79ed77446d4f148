//! Access logging around a handler.
//!
//! Every call produces exactly one event under [`ACCESS_LOG_TARGET`]. Request
//! and response bodies are redacted before they are rendered, so a record
//! reaches the log only after its sensitive fields are cleared or masked.

use super::{correlation_id, RequestContext};
use crate::error::ServiceError;
use sg_redact::{record_to_json, redacted, Record, RecordView, SchemaRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;

/// Target of the per-call access event.
pub const ACCESS_LOG_TARGET: &str = "sg_core::access";

/// A value that can be written to the access log.
pub trait Loggable {
    /// Render for the log, redacting whatever `schemas` marks sensitive.
    fn to_log_string(&self, schemas: &SchemaRegistry) -> String;
}

impl Loggable for Record {
    fn to_log_string(&self, schemas: &SchemaRegistry) -> String {
        let out = redacted(self, schemas);
        for diagnostic in &out.report.diagnostics {
            tracing::warn!(
                record_type = %self.type_name(),
                diagnostic = %diagnostic,
                "redaction policy not applied"
            );
        }
        record_to_json(&out.record, schemas).to_string()
    }
}

impl Loggable for str {
    fn to_log_string(&self, _schemas: &SchemaRegistry) -> String {
        self.to_string()
    }
}

impl Loggable for String {
    fn to_log_string(&self, _schemas: &SchemaRegistry) -> String {
        self.clone()
    }
}

impl Loggable for () {
    fn to_log_string(&self, _schemas: &SchemaRegistry) -> String {
        String::new()
    }
}

impl<T: Loggable> Loggable for Option<T> {
    fn to_log_string(&self, schemas: &SchemaRegistry) -> String {
        match self {
            Some(value) => value.to_log_string(schemas),
            None => String::new(),
        }
    }
}

impl<T: Loggable + ?Sized> Loggable for &T {
    fn to_log_string(&self, schemas: &SchemaRegistry) -> String {
        (**self).to_log_string(schemas)
    }
}

/// Log level and error text for a handler outcome.
pub fn extract_error(err: Option<&ServiceError>) -> (Level, String) {
    match err {
        Some(err) => (Level::ERROR, err.to_string()),
        None => (Level::INFO, String::new()),
    }
}

macro_rules! access_event {
    ($level:ident, $($field:tt)*) => {
        tracing::$level!(target: ACCESS_LOG_TARGET, $($field)*)
    };
}

/// Wraps a handler with one redacted access log event per call.
#[derive(Clone)]
pub struct LoggingMiddleware {
    schemas: Arc<SchemaRegistry>,
}

impl LoggingMiddleware {
    pub fn new(schemas: Arc<SchemaRegistry>) -> Self {
        LoggingMiddleware { schemas }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Run `handler` and log the call.
    ///
    /// The handler's result is returned unchanged.
    pub fn call<Req, Resp, F>(
        &self,
        ctx: &RequestContext,
        req: &Req,
        handler: F,
    ) -> Result<Resp, ServiceError>
    where
        Req: Loggable + ?Sized,
        Resp: Loggable,
        F: FnOnce(&RequestContext, &Req) -> Result<Resp, ServiceError>,
    {
        let start = Instant::now();
        let result = handler(ctx, req);
        let latency = start.elapsed().as_secs_f64();

        let (code, reason) = match &result {
            Ok(_) => (0, String::new()),
            Err(err) => (err.code, err.reason.clone()),
        };
        let (level, stack) = extract_error(result.as_ref().err());
        let request = req.to_log_string(&self.schemas);
        let response = match &result {
            Ok(resp) => resp.to_log_string(&self.schemas),
            Err(_) => String::new(),
        };
        let correlation_id = correlation_id(ctx);

        if level == Level::ERROR {
            access_event!(
                error,
                kind = ctx.side.as_str(),
                component = %ctx.component,
                operation = %ctx.operation,
                correlation_id = %correlation_id,
                request = %request,
                response = %response,
                code,
                reason = %reason,
                stack = %stack,
                latency
            );
        } else {
            access_event!(
                info,
                kind = ctx.side.as_str(),
                component = %ctx.component,
                operation = %ctx.operation,
                correlation_id = %correlation_id,
                request = %request,
                response = %response,
                code,
                reason = %reason,
                stack = %stack,
                latency
            );
        }

        result
    }
}
