use crate::rr::{RecordClass, RecordType};
use std::sync::Arc;
use thiserror::Error;

/// Fatal errors. Once one of these fires the zone being processed is
/// not considered valid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    // Aggregate invariants
    #[error("zone origin is required")]
    MissingOrigin,
    #[error("SOA must be set first, RFC 1035: {record}")]
    SoaRequiredFirst { record: String },
    #[error("all records in a zone must share one class (zone is {expected}, found {found}): {record}")]
    ClassMismatch {
        expected: RecordClass,
        found: RecordClass,
        record: String,
    },
    #[error("multiple identical records are not allowed, RFC 2181: {record}")]
    DuplicateRecord { record: String },
    #[error(
        "records with identical owner, class and type must have identical TTL, RFC 2181: {owner} {rtype} has {expected}, got {found}"
    )]
    TtlMismatchInRRset {
        owner: String,
        rtype: RecordType,
        expected: u32,
        found: u32,
    },
    #[error("exactly one SOA record may be present, RFC 1035")]
    DuplicateSoa,
    #[error("multiple CNAME records with the same owner are not allowed, RFC 1034: {owner}")]
    DuplicateCname { owner: String },
    #[error("owner {owner} already has a {existing} record, CNAME not allowed, RFC 1034, 2181 & 4035")]
    CnameIncompatibleCoexist { owner: String, existing: RecordType },
    #[error("owner {owner} exists as CNAME, {rtype} not allowed, RFC 1034, 2181 & 4035")]
    CnameConflict { owner: String, rtype: RecordType },
    #[error("zone has no SOA record")]
    MissingSoa,
    #[error("zone has no NS record at its apex {origin}")]
    MissingApexNs { origin: String },

    // Parsing and expansion
    #[error("zone origin ambiguous at line {line}, refusing to guess")]
    AmbiguousOrigin { line: usize },
    #[error("unrecognized line {line}: {text}")]
    UnrecognizedLine { line: usize, text: String },
    #[error("SOA at line {line} is incomplete, missing: {}", .missing.join(", "))]
    IncompleteSoa { line: usize, missing: Vec<String> },
    #[error("continuation opened at line {line} is never closed")]
    UnclosedContinuation { line: usize },
    #[error("invalid TTL value: {0}")]
    InvalidTtl(String),
    #[error("invalid directive at line {line}: {text}")]
    InvalidDirective { line: usize, text: String },
}

/// Why a single record could not be built from its fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("unknown record type: {0}")]
    UnknownType(String),
    #[error("{rtype} expects {expected} fields, got {found}")]
    FieldCount {
        rtype: RecordType,
        expected: usize,
        found: usize,
    },
    #[error("invalid IPv4 address: {0}")]
    InvalidIpv4(String),
    #[error("invalid IPv6 address: {0}")]
    InvalidIpv6(String),
    #[error("invalid {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid encoding in {field}: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },
    #[error("truncated wire data for {0}")]
    Truncated(RecordType),
    #[error("{rtype} cannot be represented in {dialect}")]
    Unrepresentable {
        rtype: RecordType,
        dialect: &'static str,
    },
}

/// A record dropped during expansion. Processing continues without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record at line {line} skipped ({error}): {entry}")]
pub struct RecordConstructionFailed {
    pub line: usize,
    pub entry: String,
    #[source]
    pub error: RecordError,
}

/// Errors from reading zone data off disk.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("$INCLUDE nesting deeper than {0} levels")]
    IncludeDepth(usize),
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

impl LoadError {
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),
    #[error("Invalid class: {0}")]
    InvalidClass(String),
    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, ZoneError>;

/// Errors from writing a zone back out.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
}
