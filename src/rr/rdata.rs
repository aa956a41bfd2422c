use super::RecordType;
use crate::error::RecordError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// The positional SOA field names, in presentation order.
pub const SOA_FIELDS: [&str; 7] = [
    "mname", "rname", "serial", "refresh", "retry", "expire", "minimum",
];

/// Type specific record data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rdata {
    A { address: Ipv4Addr },
    Aaaa { address: Ipv6Addr },
    Ns { dname: String },
    Cname { cname: String },
    Dname { target: String },
    Ptr { dname: String },
    Mx { preference: u16, exchange: String },
    Soa(Soa),
    Txt { data: Vec<String> },
    Spf { data: Vec<String> },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Caa { flags: u8, tag: String, value: String },
    Hinfo { cpu: String, os: String },
    Ds {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: String,
    },
    Dnskey {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: String,
    },
    /// Known mnemonic whose fields are kept as presentation text
    Generic { rtype: RecordType, data: String },
    /// Opaque RFC 3597 data
    Unknown { code: u16, data: Vec<u8> },
}

/// One field value, as exposed by [`super::Record::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(u64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_u64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

fn expect_fields(rtype: RecordType, tokens: &[String], expected: usize) -> Result<(), RecordError> {
    if tokens.len() != expected {
        return Err(RecordError::FieldCount {
            rtype,
            expected,
            found: tokens.len(),
        });
    }
    Ok(())
}

fn expect_at_least(rtype: RecordType, tokens: &[String], expected: usize) -> Result<(), RecordError> {
    if tokens.len() < expected {
        return Err(RecordError::FieldCount {
            rtype,
            expected,
            found: tokens.len(),
        });
    }
    Ok(())
}

pub(crate) fn number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, RecordError> {
    value.parse().map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// SOA timers accept the same `1h30m` shorthand as TTLs
fn duration(field: &'static str, value: &str) -> Result<u32, RecordError> {
    crate::util::to_seconds(value).map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Quote a token for presentation if it would not survive tokenizing.
pub(crate) fn quote_if_needed(token: &str) -> String {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '"' || c == ';') {
        format!("\"{}\"", escape_quoted(token))
    } else {
        token.to_string()
    }
}

pub(crate) fn escape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl Rdata {
    pub fn rtype(&self) -> RecordType {
        match self {
            Rdata::A { .. } => RecordType::A,
            Rdata::Aaaa { .. } => RecordType::AAAA,
            Rdata::Ns { .. } => RecordType::NS,
            Rdata::Cname { .. } => RecordType::CNAME,
            Rdata::Dname { .. } => RecordType::DNAME,
            Rdata::Ptr { .. } => RecordType::PTR,
            Rdata::Mx { .. } => RecordType::MX,
            Rdata::Soa(_) => RecordType::SOA,
            Rdata::Txt { .. } => RecordType::TXT,
            Rdata::Spf { .. } => RecordType::SPF,
            Rdata::Srv { .. } => RecordType::SRV,
            Rdata::Caa { .. } => RecordType::CAA,
            Rdata::Hinfo { .. } => RecordType::HINFO,
            Rdata::Ds { .. } => RecordType::DS,
            Rdata::Dnskey { .. } => RecordType::DNSKEY,
            Rdata::Generic { rtype, .. } => *rtype,
            Rdata::Unknown { code, .. } => RecordType::from_code(*code),
        }
    }

    /// Positions of domain-name fields within the presentation tokens of
    /// `rtype`. Relative names at these positions are qualified against the
    /// current origin.
    pub fn name_positions(rtype: RecordType) -> &'static [usize] {
        match rtype {
            RecordType::NS | RecordType::CNAME | RecordType::DNAME | RecordType::PTR => &[0],
            RecordType::MX => &[1],
            RecordType::SOA => &[0, 1],
            RecordType::SRV => &[3],
            _ => &[],
        }
    }

    /// Build rdata from presentation tokens (quotes already removed).
    pub fn from_tokens(rtype: RecordType, tokens: &[String]) -> Result<Self, RecordError> {
        if tokens.first().map(String::as_str) == Some("\\#") {
            return Self::from_generic_hex(rtype, &tokens[1..]);
        }

        let rdata = match rtype {
            RecordType::A => {
                expect_fields(rtype, tokens, 1)?;
                Rdata::A {
                    address: tokens[0]
                        .parse()
                        .map_err(|_| RecordError::InvalidIpv4(tokens[0].clone()))?,
                }
            }
            RecordType::AAAA => {
                expect_fields(rtype, tokens, 1)?;
                Rdata::Aaaa {
                    address: tokens[0]
                        .parse()
                        .map_err(|_| RecordError::InvalidIpv6(tokens[0].clone()))?,
                }
            }
            RecordType::NS => {
                expect_fields(rtype, tokens, 1)?;
                Rdata::Ns {
                    dname: tokens[0].clone(),
                }
            }
            RecordType::CNAME => {
                expect_fields(rtype, tokens, 1)?;
                Rdata::Cname {
                    cname: tokens[0].clone(),
                }
            }
            RecordType::DNAME => {
                expect_fields(rtype, tokens, 1)?;
                Rdata::Dname {
                    target: tokens[0].clone(),
                }
            }
            RecordType::PTR => {
                expect_fields(rtype, tokens, 1)?;
                Rdata::Ptr {
                    dname: tokens[0].clone(),
                }
            }
            RecordType::MX => {
                expect_fields(rtype, tokens, 2)?;
                Rdata::Mx {
                    preference: number("preference", &tokens[0])?,
                    exchange: tokens[1].clone(),
                }
            }
            RecordType::SOA => {
                expect_fields(rtype, tokens, 7)?;
                Rdata::Soa(Soa {
                    mname: tokens[0].clone(),
                    rname: tokens[1].clone(),
                    serial: number("serial", &tokens[2])?,
                    refresh: duration("refresh", &tokens[3])?,
                    retry: duration("retry", &tokens[4])?,
                    expire: duration("expire", &tokens[5])?,
                    minimum: duration("minimum", &tokens[6])?,
                })
            }
            RecordType::TXT => {
                expect_at_least(rtype, tokens, 1)?;
                Rdata::Txt {
                    data: tokens.to_vec(),
                }
            }
            RecordType::SPF => {
                expect_at_least(rtype, tokens, 1)?;
                Rdata::Spf {
                    data: tokens.to_vec(),
                }
            }
            RecordType::SRV => {
                expect_fields(rtype, tokens, 4)?;
                Rdata::Srv {
                    priority: number("priority", &tokens[0])?,
                    weight: number("weight", &tokens[1])?,
                    port: number("port", &tokens[2])?,
                    target: tokens[3].clone(),
                }
            }
            RecordType::CAA => {
                expect_fields(rtype, tokens, 3)?;
                Rdata::Caa {
                    flags: number("flags", &tokens[0])?,
                    tag: tokens[1].to_ascii_lowercase(),
                    value: tokens[2].clone(),
                }
            }
            RecordType::HINFO => {
                expect_fields(rtype, tokens, 2)?;
                Rdata::Hinfo {
                    cpu: tokens[0].clone(),
                    os: tokens[1].clone(),
                }
            }
            RecordType::DS => {
                expect_at_least(rtype, tokens, 4)?;
                let digest = tokens[3..].concat().to_ascii_uppercase();
                hex::decode(&digest).map_err(|e| RecordError::InvalidEncoding {
                    field: "digest",
                    reason: e.to_string(),
                })?;
                Rdata::Ds {
                    key_tag: number("key tag", &tokens[0])?,
                    algorithm: number("algorithm", &tokens[1])?,
                    digest_type: number("digest type", &tokens[2])?,
                    digest,
                }
            }
            RecordType::DNSKEY => {
                expect_at_least(rtype, tokens, 4)?;
                let public_key = tokens[3..].concat();
                BASE64
                    .decode(&public_key)
                    .map_err(|e| RecordError::InvalidEncoding {
                        field: "publickey",
                        reason: e.to_string(),
                    })?;
                Rdata::Dnskey {
                    flags: number("flags", &tokens[0])?,
                    protocol: number("protocol", &tokens[1])?,
                    algorithm: number("algorithm", &tokens[2])?,
                    public_key,
                }
            }
            RecordType::Unknown(code) => {
                return Err(RecordError::UnknownType(format!(
                    "TYPE{} requires \\# generic rdata",
                    code
                )));
            }
            other => {
                expect_at_least(other, tokens, 1)?;
                let data = tokens
                    .iter()
                    .map(|t| quote_if_needed(t))
                    .collect::<Vec<_>>()
                    .join(" ");
                Rdata::Generic { rtype: other, data }
            }
        };
        Ok(rdata)
    }

    /// RFC 3597 `\# <length> <hex>` form.
    fn from_generic_hex(rtype: RecordType, tokens: &[String]) -> Result<Self, RecordError> {
        let (len, hex_parts) = tokens.split_first().ok_or(RecordError::FieldCount {
            rtype,
            expected: 1,
            found: 0,
        })?;
        let len: usize = number("length", len)?;
        let data = hex::decode(hex_parts.concat()).map_err(|e| RecordError::InvalidEncoding {
            field: "rdata",
            reason: e.to_string(),
        })?;
        if data.len() != len {
            return Err(RecordError::InvalidNumber {
                field: "length",
                value: len.to_string(),
            });
        }
        super::wire::decode(rtype, &data)
    }

    /// Names of the type specific fields, in presentation order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Rdata::A { .. } | Rdata::Aaaa { .. } => &["address"],
            Rdata::Ns { .. } | Rdata::Ptr { .. } => &["dname"],
            Rdata::Cname { .. } => &["cname"],
            Rdata::Dname { .. } => &["target"],
            Rdata::Mx { .. } => &["preference", "exchange"],
            Rdata::Soa(_) => &SOA_FIELDS,
            Rdata::Txt { .. } | Rdata::Spf { .. } => &["data"],
            Rdata::Srv { .. } => &["priority", "weight", "port", "target"],
            Rdata::Caa { .. } => &["flags", "tag", "value"],
            Rdata::Hinfo { .. } => &["cpu", "os"],
            Rdata::Ds { .. } => &["key tag", "algorithm", "digest type", "digest"],
            Rdata::Dnskey { .. } => &["flags", "protocol", "algorithm", "publickey"],
            Rdata::Generic { .. } => &["rdata"],
            Rdata::Unknown { .. } => &["typeid", "rdata"],
        }
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        let text = |s: &str| Some(Value::Text(s.to_string()));
        let int = |n: u64| Some(Value::Int(n));

        match (self, field) {
            (Rdata::A { address }, "address") => text(&address.to_string()),
            (Rdata::Aaaa { address }, "address") => text(&address.to_string()),
            (Rdata::Ns { dname }, "dname") | (Rdata::Ptr { dname }, "dname") => text(dname),
            (Rdata::Cname { cname }, "cname") => text(cname),
            (Rdata::Dname { target }, "target") => text(target),
            (Rdata::Mx { preference, .. }, "preference") => int(u64::from(*preference)),
            (Rdata::Mx { exchange, .. }, "exchange") => text(exchange),
            (Rdata::Soa(soa), _) => match field {
                "mname" => text(&soa.mname),
                "rname" => text(&soa.rname),
                "serial" => int(u64::from(soa.serial)),
                "refresh" => int(u64::from(soa.refresh)),
                "retry" => int(u64::from(soa.retry)),
                "expire" => int(u64::from(soa.expire)),
                "minimum" => int(u64::from(soa.minimum)),
                _ => None,
            },
            (Rdata::Txt { data }, "data") | (Rdata::Spf { data }, "data") => {
                Some(Value::List(data.clone()))
            }
            (Rdata::Srv { priority, .. }, "priority") => int(u64::from(*priority)),
            (Rdata::Srv { weight, .. }, "weight") => int(u64::from(*weight)),
            (Rdata::Srv { port, .. }, "port") => int(u64::from(*port)),
            (Rdata::Srv { target, .. }, "target") => text(target),
            (Rdata::Caa { flags, .. }, "flags") => int(u64::from(*flags)),
            (Rdata::Caa { tag, .. }, "tag") => text(tag),
            (Rdata::Caa { value, .. }, "value") => text(value),
            (Rdata::Hinfo { cpu, .. }, "cpu") => text(cpu),
            (Rdata::Hinfo { os, .. }, "os") => text(os),
            (Rdata::Ds { key_tag, .. }, "key tag") => int(u64::from(*key_tag)),
            (Rdata::Ds { algorithm, .. }, "algorithm") => int(u64::from(*algorithm)),
            (Rdata::Ds { digest_type, .. }, "digest type") => int(u64::from(*digest_type)),
            (Rdata::Ds { digest, .. }, "digest") => text(digest),
            (Rdata::Dnskey { flags, .. }, "flags") => int(u64::from(*flags)),
            (Rdata::Dnskey { protocol, .. }, "protocol") => int(u64::from(*protocol)),
            (Rdata::Dnskey { algorithm, .. }, "algorithm") => int(u64::from(*algorithm)),
            (Rdata::Dnskey { public_key, .. }, "publickey") => text(public_key),
            (Rdata::Generic { data, .. }, "rdata") => text(data),
            (Rdata::Unknown { code, .. }, "typeid") => int(u64::from(*code)),
            (Rdata::Unknown { data, .. }, "rdata") => text(&hex::encode_upper(data)),
            _ => None,
        }
    }

    /// Presentation (master file) form of the rdata.
    pub fn to_presentation(&self) -> String {
        match self {
            Rdata::A { address } => address.to_string(),
            Rdata::Aaaa { address } => address.to_string(),
            Rdata::Ns { dname } | Rdata::Ptr { dname } => dname.clone(),
            Rdata::Cname { cname } => cname.clone(),
            Rdata::Dname { target } => target.clone(),
            Rdata::Mx {
                preference,
                exchange,
            } => format!("{} {}", preference, exchange),
            Rdata::Soa(soa) => format!(
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            Rdata::Txt { data } | Rdata::Spf { data } => data
                .iter()
                .map(|s| format!("\"{}\"", escape_quoted(s)))
                .collect::<Vec<_>>()
                .join(" "),
            Rdata::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{} {} {} {}", priority, weight, port, target),
            Rdata::Caa { flags, tag, value } => {
                format!("{} {} \"{}\"", flags, tag, escape_quoted(value))
            }
            Rdata::Hinfo { cpu, os } => format!("{} {}", quote_if_needed(cpu), quote_if_needed(os)),
            Rdata::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => format!("{} {} {} {}", key_tag, algorithm, digest_type, digest),
            Rdata::Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
            } => format!("{} {} {} {}", flags, protocol, algorithm, public_key),
            Rdata::Generic { data, .. } => data.clone(),
            Rdata::Unknown { data, .. } => {
                if data.is_empty() {
                    "\\# 0".to_string()
                } else {
                    format!("\\# {} {}", data.len(), hex::encode_upper(data))
                }
            }
        }
    }
}
