//! Shortcut expansion: turns parsed entries into concrete records.
//!
//! One left-to-right pass threading a [`ParseState`]. Owners and
//! embedded names are qualified against the current origin, missing
//! TTLs and classes are filled in, and each record is built through the
//! rdata constructors. A record that fails to build is skipped and
//! handed back in [`Expanded::skipped`]; everything else that goes wrong
//! is fatal.

use super::entry::{Directive, Entry, ParseState, PendingRecord};
use crate::config::{DEFAULT_TTL, ZoneOptions};
use crate::error::{RecordConstructionFailed, Result, ZoneError};
use crate::rr::{Rdata, Record, RecordType, SOA_FIELDS};
use crate::util::{fully_qualify, to_seconds};
use tracing::{debug, warn};

/// An expanded entry, ready for the zone aggregate or a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneItem {
    Record(Record),
    /// `$TTL` or a fully qualified `$ORIGIN`
    Directive(Directive),
    Verbatim(String),
}

#[derive(Debug, Default)]
pub struct Expanded {
    pub items: Vec<ZoneItem>,
    /// Records dropped because they could not be built
    pub skipped: Vec<RecordConstructionFailed>,
}

pub fn expand(entries: Vec<Entry>, state: &mut ParseState, options: &ZoneOptions) -> Result<Expanded> {
    let mut expanded = Expanded::default();

    for entry in entries {
        match entry {
            Entry::Verbatim(text) => expanded.items.push(ZoneItem::Verbatim(text)),
            Entry::Directive { directive, .. } => match directive {
                Directive::Ttl(ttl) => {
                    debug!("Set default TTL to: {}", ttl);
                    state.ttl = Some(ttl);
                    expanded.items.push(ZoneItem::Directive(Directive::Ttl(ttl)));
                }
                Directive::Origin(origin) => {
                    let origin = state.change_origin(&origin);
                    debug!("Set origin to: {}", origin);
                    expanded.items.push(ZoneItem::Directive(Directive::Origin(origin)));
                }
                Directive::Include { path, .. } => {
                    warn!("$INCLUDE {} left unresolved, load the file to follow includes", path);
                }
            },
            Entry::Record(pending) => match expand_record(pending, state, options)? {
                Ok(record) => expanded.items.push(ZoneItem::Record(record)),
                Err(failed) => {
                    debug!("Skipping record: {}", failed);
                    expanded.skipped.push(failed);
                }
            },
        }
    }

    debug!(
        "Expanded {} items, skipped {} records",
        expanded.items.len(),
        expanded.skipped.len()
    );
    Ok(expanded)
}

/// Outer error is fatal, inner error drops only this record.
fn expand_record(
    pending: PendingRecord,
    state: &mut ParseState,
    options: &ZoneOptions,
) -> Result<std::result::Result<Record, RecordConstructionFailed>> {
    let origin = state
        .origin
        .clone()
        .ok_or(ZoneError::AmbiguousOrigin { line: pending.line })?;

    let generic = pending.rdata.first().map(String::as_str) == Some("\\#");
    let rtype = pending.rtype.parse::<RecordType>().ok();

    if rtype == Some(RecordType::SOA) && !generic {
        if pending.rdata.len() < SOA_FIELDS.len() {
            return Err(ZoneError::IncompleteSoa {
                line: pending.line,
                missing: SOA_FIELDS[pending.rdata.len()..]
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            });
        }
        if state.ttl.is_none() {
            if let Ok(minimum) = to_seconds(&pending.rdata[6]) {
                debug!("Seeding default TTL from SOA minimum: {}", minimum);
                state.ttl = Some(minimum);
            }
        }
    }

    let ttl = pending.ttl.or(state.ttl).unwrap_or(DEFAULT_TTL);
    let class = pending.class.unwrap_or(options.class);

    let owner = match pending.owner.as_deref() {
        None => state
            .previous_owner
            .clone()
            .unwrap_or_else(|| origin.clone()),
        Some(owner) => fully_qualify(owner, Some(&origin)),
    };
    state.previous_owner = Some(owner.clone());

    let mut tokens = pending.rdata;
    if let (Some(rtype), false) = (rtype, generic) {
        for &pos in Rdata::name_positions(rtype) {
            if let Some(name) = tokens.get_mut(pos) {
                *name = fully_qualify(name, Some(&origin));
            }
        }
    }

    Ok(
        Record::from_tokens(owner, ttl, class, &pending.rtype, &tokens)
            .map(|record| record.with_tinydns(pending.tinydns))
            .map_err(|error| RecordConstructionFailed {
                line: pending.line,
                entry: pending.text,
                error,
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::rr::RecordClass;
    use crate::zone::bind;

    fn run(text: &str, origin: Option<&str>) -> Result<Expanded> {
        let options = ZoneOptions::default();
        let mut state = ParseState::new(&options);
        if let Some(origin) = origin {
            state.set_implicit_origin(origin);
        }
        expand(bind::parse(text)?, &mut state, &options)
    }

    fn records(expanded: &Expanded) -> Vec<&Record> {
        expanded
            .items
            .iter()
            .filter_map(|i| match i {
                ZoneItem::Record(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_owner_shortcuts() {
        let zone = "@ 3600 IN NS ns1\nwww A 192.0.2.1\n  A 192.0.2.2\nmail.other.net. A 192.0.2.3\n";
        let expanded = run(zone, Some("example.com.")).unwrap();
        let recs = records(&expanded);
        assert_eq!(recs[0].owner, "example.com.");
        assert_eq!(recs[0].rdata, Rdata::Ns { dname: "ns1.example.com.".to_string() });
        assert_eq!(recs[1].owner, "www.example.com.");
        assert_eq!(recs[2].owner, "www.example.com.");
        assert_eq!(recs[3].owner, "mail.other.net.");
    }

    #[test]
    fn test_ttl_inheritance() {
        let zone = "www A 192.0.2.1\n$TTL 300\nftp A 192.0.2.2\nmx 60 MX 10 mail\n";
        let expanded = run(zone, Some("example.com.")).unwrap();
        let recs = records(&expanded);
        assert_eq!(recs[0].ttl, DEFAULT_TTL);
        assert_eq!(recs[1].ttl, 300);
        assert_eq!(recs[2].ttl, 60);
        assert_eq!(recs[2].get("exchange").unwrap().to_string(), "mail.example.com.");
        assert_eq!(recs[2].class, RecordClass::IN);
    }

    #[test]
    fn test_soa_seeds_ttl() {
        let zone = "@ IN SOA ns1 hostmaster 1 2 3 4 2560\n@ NS ns1\n";
        let expanded = run(zone, Some("example.com.")).unwrap();
        let recs = records(&expanded);
        let soa = recs[0].soa().unwrap();
        assert_eq!(soa.mname, "ns1.example.com.");
        assert_eq!(soa.rname, "hostmaster.example.com.");
        assert_eq!(recs[0].ttl, 2560);
        assert_eq!(recs[1].ttl, 2560);
    }

    #[test]
    fn test_origin_directive_is_relative_to_implicit() {
        let zone = "$ORIGIN lab\nhost A 192.0.2.9\n";
        let expanded = run(zone, Some("example.com.")).unwrap();
        assert_eq!(
            expanded.items[0],
            ZoneItem::Directive(Directive::Origin("lab.example.com.".to_string()))
        );
        assert_eq!(records(&expanded)[0].owner, "host.lab.example.com.");
    }

    #[test]
    fn test_missing_origin_is_fatal() {
        let err = run("www A 192.0.2.1\n", None).unwrap_err();
        assert_eq!(err, ZoneError::AmbiguousOrigin { line: 1 });
    }

    #[test]
    fn test_origin_from_directive_alone() {
        let expanded = run("$ORIGIN example.org.\nwww A 192.0.2.1\n", None).unwrap();
        assert_eq!(records(&expanded)[0].owner, "www.example.org.");
    }

    #[test]
    fn test_incomplete_soa() {
        let err = run("@ SOA ns1 hostmaster 1 2\n", Some("example.com.")).unwrap_err();
        assert_eq!(
            err,
            ZoneError::IncompleteSoa {
                line: 1,
                missing: vec!["retry".to_string(), "expire".to_string(), "minimum".to_string()],
            }
        );
    }

    #[test]
    fn test_bad_record_is_skipped() {
        let zone = "www A 999.1.1.1\nftp A 192.0.2.2\n";
        let expanded = run(zone, Some("example.com.")).unwrap();
        assert_eq!(records(&expanded).len(), 1);
        assert_eq!(expanded.skipped.len(), 1);
        assert_eq!(expanded.skipped[0].line, 1);
        assert_eq!(expanded.skipped[0].entry, "www A 999.1.1.1");
        assert!(matches!(expanded.skipped[0].error, RecordError::InvalidIpv4(_)));
    }
}
