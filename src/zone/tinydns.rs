//! tinydns-data parser (<https://cr.yp.to/djbdns/tinydns-data.html>).
//!
//! Every line starts with a sigil naming the record shape; several
//! shapes fan out into more than one record. All names in tinydns data
//! are absolute.

use super::entry::{Entry, PendingRecord};
use crate::config::ZoneOptions;
use crate::error::{Result, ZoneError};
use crate::rr::TinydnsMeta;
use crate::rr::wire::octal_unescape;
use crate::util::{fully_qualify, reverse_ipv4_name, reverse_ipv6_name, to_seconds};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::trace;

/// tinydns-data defaults for NS lines, SOA records and everything else
const TTL_NS: u32 = 259_200;
const TTL_NEGATIVE: u32 = 2_560;
const TTL_POSITIVE: u32 = 86_400;

/// Colon separated fields of one line, octal escapes decoded
struct Fields {
    fields: Vec<String>,
}

impl Fields {
    fn new(body: &str) -> Self {
        Self {
            fields: body
                .split(':')
                .map(|f| String::from_utf8_lossy(&octal_unescape(f)).into_owned())
                .collect(),
        }
    }

    fn get(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }

    fn name(&self, idx: usize) -> String {
        fully_qualify(self.get(idx), None)
    }

    fn optional(&self, idx: usize) -> Option<String> {
        Some(self.get(idx)).filter(|f| !f.is_empty()).map(str::to_string)
    }

    fn ttl(&self, idx: usize) -> Result<Option<u32>> {
        match self.get(idx) {
            "" => Ok(None),
            ttl => to_seconds(ttl).map(Some),
        }
    }
}

/// `x` names a host under `fqdn` unless it already contains a dot.
fn host_name(x: &str, kind: &str, fqdn: &str) -> String {
    if x.contains('.') {
        fully_qualify(x, None)
    } else if x.is_empty() {
        format!("{}.{}", kind, fqdn)
    } else {
        format!("{}.{}.{}", x.to_lowercase(), kind, fqdn)
    }
}

/// tinydns writes IPv6 addresses as 32 hex digits
fn parse_v6(s: &str) -> Option<Ipv6Addr> {
    let bytes: [u8; 16] = hex::decode(s).ok()?.try_into().ok()?;
    Some(Ipv6Addr::from(bytes))
}

fn v6_token(s: &str) -> String {
    parse_v6(s).map(|ip| ip.to_string()).unwrap_or_else(|| s.to_string())
}

/// Split `text` into character strings of at most 255 bytes, never
/// inside a UTF-8 sequence.
fn character_strings(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if idx + ch.len_utf8() - start > 255 {
            chunks.push(text[start..idx].to_string());
            start = idx;
        }
    }
    if start < text.len() || chunks.is_empty() {
        chunks.push(text[start..].to_string());
    }
    chunks
}

pub fn parse(text: &str, options: &ZoneOptions) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.trim_end();

        let Some(sigil) = line.chars().next() else {
            entries.push(Entry::Verbatim(String::new()));
            continue;
        };
        trace!("Parsing line {}: {}", line_number, line);

        // Index of the ttl field; timestamp and location follow it
        let ttl_at = match sigil {
            '#' => {
                entries.push(Entry::Verbatim(line.to_string()));
                continue;
            }
            // location and disabled lines
            '%' | '-' => continue,
            '.' | '&' | ':' => 3,
            '@' => 4,
            'S' => 6,
            'Z' => 8,
            '=' | '+' | '\'' | '^' | 'C' | '3' | '6' => 2,
            _ => {
                return Err(ZoneError::UnrecognizedLine {
                    line: line_number,
                    text: line.to_string(),
                });
            }
        };

        let fields = Fields::new(&line[sigil.len_utf8()..]);
        let default_ttl = options.ttl.unwrap_or(match sigil {
            '.' | '&' => TTL_NS,
            'Z' => TTL_NEGATIVE,
            _ => TTL_POSITIVE,
        });
        let ttl = fields.ttl(ttl_at)?.unwrap_or(default_ttl);
        let meta = TinydnsMeta {
            timestamp: fields.optional(ttl_at + 1),
            location: fields.optional(ttl_at + 2),
        };
        let record = |rtype: &str, rdata: Vec<String>| {
            PendingRecord::new(rtype, rdata, line_number, line)
                .ttl(Some(ttl))
                .tinydns(meta.clone())
        };
        let fqdn = fields.name(0);

        match sigil {
            '.' | '&' => {
                // .fqdn:ip:x:ttl:timestamp:lo
                let ns = host_name(fields.get(2), "ns", &fqdn);
                entries.push(Entry::Record(record("NS", vec![ns.clone()]).owner(&fqdn)));
                if !fields.get(1).is_empty() {
                    entries.push(Entry::Record(
                        record("A", vec![fields.get(1).to_string()]).owner(&ns),
                    ));
                }
                if sigil == '.' {
                    let soa = &options.soa_defaults;
                    let soa_ttl = if ttl == 0 { 0 } else { TTL_NEGATIVE };
                    entries.push(Entry::Record(
                        record(
                            "SOA",
                            vec![
                                ns,
                                format!("hostmaster.{}", fqdn),
                                soa.serial().to_string(),
                                soa.refresh.to_string(),
                                soa.retry.to_string(),
                                soa.expire.to_string(),
                                soa.minimum.to_string(),
                            ],
                        )
                        .owner(&fqdn)
                        .ttl(Some(soa_ttl)),
                    ));
                }
            }
            '=' | '+' => {
                // =fqdn:ip:ttl:timestamp:lo
                let ip = fields.get(1);
                entries.push(Entry::Record(record("A", vec![ip.to_string()]).owner(&fqdn)));
                if sigil == '=' {
                    if let Ok(addr) = ip.parse::<Ipv4Addr>() {
                        entries.push(Entry::Record(
                            record("PTR", vec![fqdn.clone()]).owner(reverse_ipv4_name(&addr)),
                        ));
                    }
                }
            }
            '@' => {
                // @fqdn:ip:x:dist:ttl:timestamp:lo
                let mx = host_name(fields.get(2), "mx", &fqdn);
                let dist = match fields.get(3) {
                    "" => "0",
                    dist => dist,
                };
                entries.push(Entry::Record(
                    record("MX", vec![dist.to_string(), mx.clone()]).owner(&fqdn),
                ));
                if !fields.get(1).is_empty() {
                    entries.push(Entry::Record(
                        record("A", vec![fields.get(1).to_string()]).owner(mx),
                    ));
                }
            }
            '\'' => {
                // 'fqdn:s:ttl:timestamp:lo
                let chunks = character_strings(fields.get(1));
                entries.push(Entry::Record(record("TXT", chunks).owner(&fqdn)));
            }
            '^' | 'C' => {
                // ^fqdn:p:ttl:timestamp:lo
                let rtype = if sigil == '^' { "PTR" } else { "CNAME" };
                entries.push(Entry::Record(record(rtype, vec![fields.name(1)]).owner(&fqdn)));
            }
            'Z' => {
                // Zfqdn:mname:rname:ser:ref:ret:exp:min:ttl:timestamp:lo
                let soa = &options.soa_defaults;
                let number = |idx: usize, default: u32| match fields.get(idx) {
                    "" => default.to_string(),
                    n => n.to_string(),
                };
                entries.push(Entry::Record(
                    record(
                        "SOA",
                        vec![
                            fields.name(1),
                            fields.name(2),
                            number(3, soa.serial()),
                            number(4, soa.refresh),
                            number(5, soa.retry),
                            number(6, soa.expire),
                            number(7, soa.minimum),
                        ],
                    )
                    .owner(&fqdn),
                ));
            }
            ':' => {
                // :fqdn:n:rdata:ttl:timestamp:lo
                let rdata = octal_unescape(line[1..].splitn(4, ':').nth(2).unwrap_or(""));
                entries.push(Entry::Record(
                    record(
                        &format!("TYPE{}", fields.get(1)),
                        vec![
                            "\\#".to_string(),
                            rdata.len().to_string(),
                            hex::encode_upper(&rdata),
                        ],
                    )
                    .owner(&fqdn),
                ));
            }
            '3' | '6' => {
                // 6fqdn:ip:ttl:timestamp:lo
                let ip = fields.get(1);
                entries.push(Entry::Record(record("AAAA", vec![v6_token(ip)]).owner(&fqdn)));
                if sigil == '6' {
                    if let Some(addr) = parse_v6(ip) {
                        entries.push(Entry::Record(
                            record("PTR", vec![fqdn.clone()]).owner(reverse_ipv6_name(&addr)),
                        ));
                    }
                }
            }
            _ => {
                // Sfqdn:ip:x:port:priority:weight:ttl:timestamp:lo
                let target = host_name(fields.get(2), "srv", &fqdn);
                let number = |idx: usize| match fields.get(idx) {
                    "" => "0".to_string(),
                    n => n.to_string(),
                };
                entries.push(Entry::Record(
                    record(
                        "SRV",
                        vec![number(4), number(5), number(3), target.clone()],
                    )
                    .owner(&fqdn),
                ));
                if !fields.get(1).is_empty() {
                    entries.push(Entry::Record(
                        record("A", vec![fields.get(1).to_string()]).owner(target),
                    ));
                }
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(text: &str) -> Vec<PendingRecord> {
        parse(text, &ZoneOptions::default())
            .unwrap()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Record(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn types(recs: &[PendingRecord]) -> Vec<&str> {
        recs.iter().map(|r| r.rtype.as_str()).collect()
    }

    #[test]
    fn test_dot_line_fans_out() {
        let recs = records(".example.com:192.0.2.53:a:259200\n");
        assert_eq!(types(&recs), vec!["NS", "A", "SOA"]);
        assert_eq!(recs[0].rdata, vec!["a.ns.example.com."]);
        assert_eq!(recs[1].owner.as_deref(), Some("a.ns.example.com."));
        assert_eq!(recs[2].rdata[1], "hostmaster.example.com.");
        assert_eq!(recs[2].rdata[3], "16384");
        assert_eq!(recs[0].ttl, Some(259_200));
        assert_eq!(recs[1].ttl, Some(259_200));
        assert_eq!(recs[2].ttl, Some(2_560));
    }

    #[test]
    fn test_dot_line_without_ip() {
        let recs = records(".example.com::ns1.example.net\n");
        assert_eq!(types(&recs), vec!["NS", "SOA"]);
        assert_eq!(recs[0].rdata, vec!["ns1.example.net."]);
        assert_eq!(recs[0].ttl, Some(TTL_NS));
    }

    #[test]
    fn test_default_ttls_per_sigil() {
        let recs = records("&example.com::b\n+www.example.com:192.0.2.1\nZexample.com:a:b\n");
        assert_eq!(types(&recs), vec!["NS", "A", "SOA"]);
        assert_eq!(recs[0].ttl, Some(TTL_NS));
        assert_eq!(recs[1].ttl, Some(TTL_POSITIVE));
        assert_eq!(recs[2].ttl, Some(TTL_NEGATIVE));

        let options = ZoneOptions {
            ttl: Some(600),
            ..Default::default()
        };
        let entries = parse("&example.com::b\n", &options).unwrap();
        assert!(matches!(&entries[0], Entry::Record(r) if r.ttl == Some(600)));
    }

    #[test]
    fn test_timestamp_and_location_on_every_record() {
        let recs = records("=www.example.com:192.0.2.7:300:4000000060000000:in\n");
        assert_eq!(types(&recs), vec!["A", "PTR"]);
        for rec in &recs {
            assert_eq!(rec.tinydns.timestamp.as_deref(), Some("4000000060000000"));
            assert_eq!(rec.tinydns.location.as_deref(), Some("in"));
        }

        let recs = records("+www.example.com:192.0.2.8:300::ex\n");
        assert_eq!(recs[0].tinydns.timestamp, None);
        assert_eq!(recs[0].tinydns.location.as_deref(), Some("ex"));
    }

    #[test]
    fn test_long_text_split_on_char_boundaries() {
        let text = "é".repeat(200);
        let recs = records(&format!("'example.com:{}:300\n", text));
        let chunks = &recs[0].rdata;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() <= 255));
        assert_eq!(chunks.concat(), text);
        assert!(!chunks.concat().contains('\u{FFFD}'));

        assert_eq!(character_strings(""), vec![String::new()]);
        assert_eq!(character_strings(&"a".repeat(255)).len(), 1);
        assert_eq!(character_strings(&"a".repeat(256)).len(), 2);
    }

    #[test]
    fn test_equals_adds_ptr() {
        let recs = records("=www.example.com:192.0.2.7:86400\n");
        assert_eq!(types(&recs), vec!["A", "PTR"]);
        assert_eq!(recs[1].owner.as_deref(), Some("7.2.0.192.in-addr.arpa."));
        assert_eq!(recs[1].rdata, vec!["www.example.com."]);
    }

    #[test]
    fn test_six_adds_ptr() {
        let recs = records("6v6.example.com:20010db8000000000000000000000001\n");
        assert_eq!(types(&recs), vec!["AAAA", "PTR"]);
        assert_eq!(recs[0].rdata, vec!["2001:db8::1"]);
        assert!(recs[1]
            .owner
            .as_deref()
            .unwrap()
            .starts_with("1.0.0.0.0.0.0.0"));
        assert!(recs[1].owner.as_deref().unwrap().ends_with("8.b.d.0.1.0.0.2.ip6.arpa."));
    }

    #[test]
    fn test_mx_with_address() {
        let recs = records("@example.com:192.0.2.25:mail:10:3600\n");
        assert_eq!(types(&recs), vec!["MX", "A"]);
        assert_eq!(recs[0].rdata, vec!["10", "mail.mx.example.com."]);
        assert_eq!(recs[1].owner.as_deref(), Some("mail.mx.example.com."));
    }

    #[test]
    fn test_txt_octal_escapes() {
        let recs = records("'example.com:v=spf1 a\\072b -all:300\n");
        assert_eq!(recs[0].rdata, vec!["v=spf1 a:b -all"]);
        assert_eq!(recs[0].ttl, Some(300));
    }

    #[test]
    fn test_generic_line() {
        let recs = records(":example.com:257:\\000\\005issueca.example.net:3600\n");
        assert_eq!(recs[0].rtype, "TYPE257");
        assert_eq!(recs[0].rdata[0], "\\#");
        assert_eq!(recs[0].rdata[1], "21");
    }

    #[test]
    fn test_srv_line() {
        let recs = records("S_sip._tcp.example.com:192.0.2.9:sip.example.com:5060:10:20:600\n");
        assert_eq!(types(&recs), vec!["SRV", "A"]);
        assert_eq!(recs[0].rdata, vec!["10", "20", "5060", "sip.example.com."]);
    }

    #[test]
    fn test_ignored_and_garbage_lines() {
        assert!(records("%lo:192.0.2\n-www.example.com:1.2.3.4\n# note\n").is_empty());
        let err = parse("!bogus\n", &ZoneOptions::default()).unwrap_err();
        assert!(matches!(err, ZoneError::UnrecognizedLine { line: 1, .. }));
    }
}
