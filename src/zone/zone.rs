use super::entry::Directive;
use super::expand::ZoneItem;
use crate::error::{Result, ZoneError};
use crate::rr::{Record, RecordClass, RecordType, ResourceRecord, Soa};
use crate::util::fully_qualify;
use std::collections::HashMap;
use tracing::debug;

/// A DNS zone: one SOA plus the records it is authoritative for.
///
/// Records are accepted one at a time and checked against what is
/// already present (RFC 1034, 1035, 2181 and 4035). The SOA is held
/// apart from the other records.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Zone origin, fully qualified (e.g. "example.com.")
    pub origin: String,
    /// Default TTL from `$TTL` or the caller
    pub default_ttl: Option<u32>,
    soa: Option<Record>,
    /// Non-SOA records in insertion order
    records: Vec<Record>,
    /// Owner name to positions in `records`
    owner_index: HashMap<String, Vec<usize>>,
}

impl Zone {
    /// Create an empty zone rooted at `origin`
    pub fn new(origin: &str, default_ttl: Option<u32>) -> Result<Self> {
        if origin.trim().is_empty() {
            return Err(ZoneError::MissingOrigin);
        }
        Ok(Self {
            origin: fully_qualify(origin, None),
            default_ttl,
            soa: None,
            records: Vec::new(),
            owner_index: HashMap::new(),
        })
    }

    /// Accept an expanded item. Directives update the zone settings,
    /// records go through [`Zone::add_record`].
    pub fn add(&mut self, item: &ZoneItem) -> Result<()> {
        match item {
            ZoneItem::Record(record) => self.add_record(record.clone()),
            ZoneItem::Directive(directive) => {
                self.apply_directive(directive);
                Ok(())
            }
            ZoneItem::Verbatim(_) => Ok(()),
        }
    }

    fn apply_directive(&mut self, directive: &Directive) {
        match directive {
            Directive::Ttl(ttl) => {
                debug!("Set default TTL to: {}", ttl);
                self.default_ttl = Some(*ttl);
            }
            Directive::Origin(origin) => {
                if !origin.is_empty() {
                    debug!("Set origin to: {}", origin);
                    self.origin = fully_qualify(origin, None);
                }
            }
            Directive::Include { .. } => {}
        }
    }

    /// Add a record to the zone
    pub fn add_record(&mut self, record: Record) -> Result<()> {
        let rtype = record.rtype();

        if rtype != RecordType::SOA {
            let soa = self.soa.as_ref().ok_or_else(|| ZoneError::SoaRequiredFirst {
                record: record.to_string(),
            })?;
            if record.class() != soa.class() {
                return Err(ZoneError::ClassMismatch {
                    expected: soa.class(),
                    found: record.class(),
                    record: record.to_string(),
                });
            }
        }

        self.check_not_duplicate(&record)?;
        self.check_rrset_ttl(&record)?;
        self.check_cname_label(&record)?;

        match rtype {
            RecordType::SOA => self.set_soa(record),
            RecordType::CNAME => self.add_cname(record),
            _ => {
                self.push(record);
                Ok(())
            }
        }
    }

    fn set_soa(&mut self, record: Record) -> Result<()> {
        if self.soa.is_some() {
            return Err(ZoneError::DuplicateSoa);
        }
        debug!("Zone {} SOA set from {}", self.origin, record.owner);
        self.soa = Some(record);
        Ok(())
    }

    fn add_cname(&mut self, record: Record) -> Result<()> {
        let owner_matches = self.owner_matches(&record.owner);

        if owner_matches.iter().any(|r| r.rtype() == RecordType::CNAME) {
            return Err(ZoneError::DuplicateCname {
                owner: record.owner.clone(),
            });
        }
        if let Some(existing) = owner_matches
            .iter()
            .map(|r| r.rtype())
            .find(|t| !t.coexists_with_cname())
        {
            return Err(ZoneError::CnameIncompatibleCoexist {
                owner: record.owner.clone(),
                existing,
            });
        }

        self.push(record);
        Ok(())
    }

    fn push(&mut self, record: Record) {
        self.owner_index
            .entry(record.owner.clone())
            .or_default()
            .push(self.records.len());
        self.records.push(record);
    }

    fn check_not_duplicate(&self, record: &Record) -> Result<()> {
        if !self.get_matches(record).is_empty() {
            return Err(ZoneError::DuplicateRecord {
                record: record.to_string(),
            });
        }
        Ok(())
    }

    /// RFC 2181: one TTL per RRset
    fn check_rrset_ttl(&self, record: &Record) -> Result<()> {
        let rtype = record.rtype();
        if let Some(existing) = self
            .owner_matches(&record.owner)
            .into_iter()
            .find(|r| r.class == record.class && r.rtype() == rtype)
        {
            if existing.ttl != record.ttl {
                return Err(ZoneError::TtlMismatchInRRset {
                    owner: record.owner.clone(),
                    rtype,
                    expected: existing.ttl,
                    found: record.ttl,
                });
            }
        }
        Ok(())
    }

    /// No data other than DNSSEC types may live at a CNAME owner
    fn check_cname_label(&self, record: &Record) -> Result<()> {
        let rtype = record.rtype();
        if rtype == RecordType::CNAME || rtype.coexists_with_cname() {
            return Ok(());
        }
        if self
            .owner_matches(&record.owner)
            .iter()
            .any(|r| r.rtype() == RecordType::CNAME)
        {
            return Err(ZoneError::CnameConflict {
                owner: record.owner.clone(),
                rtype,
            });
        }
        Ok(())
    }

    /// Records equal to `record` in every field
    pub fn get_matches(&self, record: &Record) -> Vec<&Record> {
        self.owner_matches(&record.owner)
            .into_iter()
            .filter(|r| *r == record)
            .collect()
    }

    /// All non-SOA records at `owner`
    pub fn owner_matches(&self, owner: &str) -> Vec<&Record> {
        self.owner_index
            .get(owner)
            .map(|positions| positions.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Get the SOA record for this zone
    pub fn soa(&self) -> Option<&Record> {
        self.soa.as_ref()
    }

    /// SOA fields, once set
    pub fn soa_data(&self) -> Option<&Soa> {
        self.soa.as_ref().and_then(Record::soa)
    }

    /// Zone class, taken from the SOA
    pub fn class(&self) -> Option<RecordClass> {
        self.soa.as_ref().map(|soa| soa.class)
    }

    /// Iterate over all records, SOA first
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.soa.iter().chain(self.records.iter())
    }

    pub fn len(&self) -> usize {
        self.records.len() + usize::from(self.soa.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A complete zone has an SOA and at least one NS at its apex
    pub fn validate(&self) -> Result<()> {
        let soa = self.soa.as_ref().ok_or(ZoneError::MissingSoa)?;

        let apex = soa.owner.as_str();
        let has_apex_ns = self
            .owner_matches(apex)
            .iter()
            .any(|r| r.rtype() == RecordType::NS);
        if !has_apex_ns {
            return Err(ZoneError::MissingApexNs {
                origin: apex.to_string(),
            });
        }

        Ok(())
    }

    /// Get zone statistics
    pub fn stats(&self) -> ZoneStats {
        let mut stats = ZoneStats {
            owners: self.owner_index.len(),
            ..Default::default()
        };

        for record in self.records() {
            stats.total_records += 1;
            match record.rtype() {
                RecordType::A => stats.a_records += 1,
                RecordType::AAAA => stats.aaaa_records += 1,
                RecordType::NS => stats.ns_records += 1,
                RecordType::CNAME => stats.cname_records += 1,
                RecordType::MX => stats.mx_records += 1,
                RecordType::TXT => stats.txt_records += 1,
                RecordType::SOA => stats.soa_records += 1,
                _ => stats.other_records += 1,
            }
        }

        stats
    }
}

/// Zone statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ZoneStats {
    pub total_records: usize,
    pub owners: usize,
    pub a_records: usize,
    pub aaaa_records: usize,
    pub ns_records: usize,
    pub cname_records: usize,
    pub mx_records: usize,
    pub txt_records: usize,
    pub soa_records: usize,
    pub other_records: usize,
}
