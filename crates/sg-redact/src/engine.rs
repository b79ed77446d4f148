//! Recursive redaction of records.
//!
//! Walks every present field depth-first. Nested records, list elements, map
//! values and record-typed map keys are visited before the field's own
//! policy is applied. Fields whose policy is `redact` are cleared without
//! being visited, since a cleared field carries no visible child state.

use crate::mask::mask_text;
use crate::record::{MapEntry, Record, RecordView, Value, ValueKind};
use crate::schema::{Disclosure, FieldId, FieldPolicyLookup, SchemaRegistry};
use std::fmt::Write as _;
use std::sync::Arc;

/// Why a policy could not be applied to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The policy does not fit the runtime value kind (e.g. `mask` on a number).
    SchemaMismatch { policy: Disclosure, found: ValueKind },
    /// The value kind is not recognised; it was passed through.
    UnsupportedValueKind { policy: Disclosure },
}

/// A non-fatal problem found during redaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted field path, e.g. `customer.cards[1].number`.
    pub path: String,
    pub kind: DiagnosticKind,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DiagnosticKind::SchemaMismatch { policy, found } => write!(
                f,
                "{}: policy '{}' does not apply to {} value",
                self.path, policy, found
            ),
            DiagnosticKind::UnsupportedValueKind { policy } => write!(
                f,
                "{}: policy '{}' skipped for unsupported value kind",
                self.path, policy
            ),
        }
    }
}

/// Outcome of one redaction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionReport {
    /// Number of fields cleared.
    pub cleared: usize,
    /// Number of text fields masked.
    pub masked: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RedactionReport {
    /// True when no diagnostics were recorded.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// True when any field was cleared or masked.
    pub fn was_modified(&self) -> bool {
        self.cleared > 0 || self.masked > 0
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: RedactionReport) {
        self.cleared += other.cleared;
        self.masked += other.masked;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// A redacted copy of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Redacted {
    pub record: Record,
    pub report: RedactionReport,
}

/// Redact `record` in place.
///
/// The caller owns `record` exclusively (usually a clone built only for a
/// log line). Never fails: policies that cannot be applied are reported as
/// [`Diagnostic`]s and the field is left unchanged.
pub fn redact<R, L>(record: &mut R, lookup: &L) -> RedactionReport
where
    R: RecordView + ?Sized,
    L: FieldPolicyLookup + ?Sized,
{
    let mut walker = Walker {
        lookup,
        report: RedactionReport::default(),
        path: String::new(),
    };
    walker.visit_record(record);
    walker.report
}

/// Redact a copy of `record`, leaving the original untouched.
pub fn redacted<L>(record: &Record, lookup: &L) -> Redacted
where
    L: FieldPolicyLookup + ?Sized,
{
    let mut copy = record.clone();
    let report = redact(&mut copy, lookup);
    Redacted {
        record: copy,
        report,
    }
}

struct Walker<'a, L: ?Sized> {
    lookup: &'a L,
    report: RedactionReport,
    path: String,
}

impl<L: FieldPolicyLookup + ?Sized> Walker<'_, L> {
    fn visit_record<R: RecordView + ?Sized>(&mut self, record: &mut R) {
        for field in record.field_ids() {
            let policy = self.lookup.disclosure(record.type_name(), field);
            let mark = self.path.len();
            self.push_field(record.type_name(), field);

            if policy == Disclosure::Redact {
                if record.clear(field).is_some() {
                    self.report.cleared += 1;
                }
            } else if let Some(value) = record.get_mut(field) {
                self.visit_children(value);
                if policy == Disclosure::Mask {
                    self.apply_mask(value);
                }
            }

            self.path.truncate(mark);
        }
    }

    fn visit_children(&mut self, value: &mut Value) {
        match value {
            Value::Record(nested) => self.visit_record(nested),
            Value::List(items) => {
                for (idx, item) in items.iter_mut().enumerate() {
                    if let Value::Record(nested) = item {
                        let mark = self.path.len();
                        let _ = write!(self.path, "[{}]", idx);
                        self.visit_record(nested);
                        self.path.truncate(mark);
                    }
                }
            }
            Value::Map(entries) => {
                for (idx, entry) in entries.iter_mut().enumerate() {
                    self.visit_entry(idx, entry);
                }
            }
            _ => {}
        }
    }

    fn visit_entry(&mut self, idx: usize, entry: &mut MapEntry) {
        let mark = self.path.len();

        if let Value::Record(nested) = &mut entry.value {
            push_map_key(&mut self.path, idx, &entry.key);
            self.visit_record(nested);
            self.path.truncate(mark);
        }

        if let Value::Record(key) = &mut entry.key {
            let _ = write!(self.path, "{{#{}:key}}", idx);
            self.visit_record(key);
            self.path.truncate(mark);
        }
    }

    fn apply_mask(&mut self, value: &mut Value) {
        match value {
            Value::String(text) => {
                *text = mask_text(text);
                self.report.masked += 1;
            }
            Value::Unknown(_) => self.diagnose(DiagnosticKind::UnsupportedValueKind {
                policy: Disclosure::Mask,
            }),
            other => {
                let found = other.kind();
                self.diagnose(DiagnosticKind::SchemaMismatch {
                    policy: Disclosure::Mask,
                    found,
                })
            }
        }
    }

    fn diagnose(&mut self, kind: DiagnosticKind) {
        self.report.diagnostics.push(Diagnostic {
            path: self.path.clone(),
            kind,
        });
    }

    fn push_field(&mut self, record_type: &str, field: FieldId) {
        if !self.path.is_empty() {
            self.path.push('.');
        }
        match self.lookup.field_name(record_type, field) {
            Some(name) => self.path.push_str(name),
            None => {
                let _ = write!(self.path, "{}", field);
            }
        }
    }
}

fn push_map_key(path: &mut String, idx: usize, key: &Value) {
    let _ = match key {
        Value::String(s) => write!(path, "{{{}}}", s),
        Value::Int(n) => write!(path, "{{{}}}", n),
        Value::Uint(n) => write!(path, "{{{}}}", n),
        Value::Bool(b) => write!(path, "{{{}}}", b),
        _ => write!(path, "{{#{}}}", idx),
    };
}

/// Redaction bound to a shared policy lookup.
///
/// Cheap to clone and safe to share across threads; each call works on a
/// record owned by the caller.
pub struct RedactionEngine<L: ?Sized = SchemaRegistry> {
    lookup: Arc<L>,
}

impl<L: ?Sized> Clone for RedactionEngine<L> {
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<L: FieldPolicyLookup + ?Sized> RedactionEngine<L> {
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// The policy lookup in use.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Redact a caller-owned record in place.
    pub fn redact_in_place<R: RecordView + ?Sized>(&self, record: &mut R) -> RedactionReport {
        redact(record, self.lookup.as_ref())
    }

    /// Redact a copy of `record`.
    pub fn redact_clone(&self, record: &Record) -> Redacted {
        redacted(record, self.lookup.as_ref())
    }
}
