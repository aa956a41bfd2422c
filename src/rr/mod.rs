//! Resource record model.
//!
//! A [`Record`] is the generic owner/ttl/class header plus a typed
//! [`Rdata`] variant. Records are immutable once built; the zone
//! aggregate only ever compares and stores them.

pub mod rdata;
pub mod render;
pub mod types;
pub mod wire;

pub use rdata::{Rdata, SOA_FIELDS, Soa, Value};
pub use render::BindStyle;
pub use types::{RecordClass, RecordType};

use crate::error::RecordError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Generic accessors the zone checks rely on, independent of rdata type.
pub trait ResourceRecord {
    fn owner(&self) -> &str;
    fn ttl(&self) -> u32;
    fn class(&self) -> RecordClass;
    fn rtype(&self) -> RecordType;
}

/// tinydns line extras, kept as written so they render back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TinydnsMeta {
    /// TAI64 label, 16 hex digits
    pub timestamp: Option<String>,
    /// Location code defined by a `%` line
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub owner: String,
    pub ttl: u32,
    pub class: RecordClass,
    pub rdata: Rdata,
    pub tinydns: TinydnsMeta,
}

const HEADER_FIELDS: [&str; 4] = ["owner", "ttl", "class", "type"];

impl Record {
    pub fn new(owner: impl Into<String>, ttl: u32, class: RecordClass, rdata: Rdata) -> Self {
        Self {
            owner: owner.into(),
            ttl,
            class,
            rdata,
            tinydns: TinydnsMeta::default(),
        }
    }

    pub fn with_tinydns(mut self, meta: TinydnsMeta) -> Self {
        self.tinydns = meta;
        self
    }

    /// Build a record from a type tag and presentation tokens.
    pub fn from_tokens(
        owner: impl Into<String>,
        ttl: u32,
        class: RecordClass,
        rtype: &str,
        tokens: &[String],
    ) -> Result<Self, RecordError> {
        let rtype: RecordType = rtype
            .parse()
            .map_err(|bad: String| RecordError::UnknownType(bad))?;
        let rdata = Rdata::from_tokens(rtype, tokens)?;
        Ok(Self::new(owner, ttl, class, rdata))
    }

    /// All field names, generic header first.
    pub fn field_names(&self) -> Vec<&'static str> {
        HEADER_FIELDS
            .iter()
            .chain(self.rdata.field_names())
            .copied()
            .collect()
    }

    pub fn rdata_field_names(&self) -> &'static [&'static str] {
        self.rdata.field_names()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            "owner" => Some(Value::Text(self.owner.clone())),
            "ttl" => Some(Value::Int(u64::from(self.ttl))),
            "class" => Some(Value::Text(self.class.to_string())),
            "type" => Some(Value::Text(self.rtype().to_string())),
            other => self.rdata.get(other),
        }
    }

    pub fn soa(&self) -> Option<&Soa> {
        match &self.rdata {
            Rdata::Soa(soa) => Some(soa),
            _ => None,
        }
    }
}

impl ResourceRecord for Record {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn ttl(&self) -> u32 {
        self.ttl
    }

    fn class(&self) -> RecordClass {
        self.class
    }

    fn rtype(&self) -> RecordType {
        self.rdata.rtype()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.owner,
            self.ttl,
            self.class,
            self.rtype(),
            self.rdata.to_presentation()
        )
    }
}

/// Flat JSON object: header fields, the rdata fields, then any tinydns
/// timestamp and location.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.field_names();
        let mut map = serializer.serialize_map(None)?;
        for name in names {
            if let Some(value) = self.get(name) {
                map.serialize_entry(name, &value)?;
            }
        }
        if let Some(timestamp) = &self.tinydns.timestamp {
            map.serialize_entry("timestamp", timestamp)?;
        }
        if let Some(location) = &self.tinydns.location {
            map.serialize_entry("location", location)?;
        }
        map.end()
    }
}
