//! Per-record dialect renderers.
//!
//! Each renderer returns one complete line including its terminator:
//! newline for BIND and tinydns, ` ~\n` for MaraDNS.

use super::wire;
use super::{Rdata, Record, ResourceRecord};
use crate::config::HideOptions;
use crate::error::RecordError;

/// Output state for BIND rendering. `previous_owner` is updated by the
/// caller after each record when same-owner suppression is wanted.
#[derive(Debug, Clone, Default)]
pub struct BindStyle {
    pub origin: Option<String>,
    pub previous_owner: Option<String>,
    pub hide: HideOptions,
}

impl BindStyle {
    pub fn new(origin: Option<String>, hide: HideOptions) -> Self {
        Self {
            origin,
            previous_owner: None,
            hide,
        }
    }

    /// Write `name` relative to the origin when origin hiding is on.
    fn name(&self, name: &str) -> String {
        match (&self.origin, self.hide.origin) {
            (Some(origin), true) => relative_name(name, origin),
            _ => name.to_string(),
        }
    }
}

fn relative_name(name: &str, origin: &str) -> String {
    let origin = if origin.ends_with('.') {
        origin.to_lowercase()
    } else {
        format!("{}.", origin.to_lowercase())
    };
    if name == origin {
        return "@".to_string();
    }
    match name.strip_suffix(origin.as_str()) {
        Some(prefix) if prefix.ends_with('.') && origin != "." => {
            prefix.trim_end_matches('.').to_string()
        }
        _ => name.to_string(),
    }
}

/// tinydns names carry no trailing dot
fn tiny_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

fn mara_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// MaraDNS RAW data: safe runs in single quotes, everything else `\xHH`.
fn mara_raw(bytes: &[u8]) -> String {
    let safe = |b: u8| {
        (0x20..0x7f).contains(&b) && !matches!(b, b'\'' | b'\\' | b'#' | b'~' | b'|' | b'%')
    };
    let mut out = String::new();
    let mut in_quotes = false;
    for &b in bytes {
        if safe(b) {
            if !in_quotes {
                out.push('\'');
                in_quotes = true;
            }
            out.push(b as char);
        } else {
            if in_quotes {
                out.push('\'');
                in_quotes = false;
            }
            out.push_str(&format!("\\x{:02x}", b));
        }
    }
    if in_quotes {
        out.push('\'');
    }
    out
}

impl Record {
    pub fn to_bind(&self, style: &BindStyle) -> String {
        let mut fields = Vec::with_capacity(5);

        let same_owner = style.hide.same_owner
            && style.previous_owner.as_deref() == Some(self.owner.as_str());
        fields.push(if same_owner {
            String::new()
        } else {
            style.name(&self.owner)
        });
        if !style.hide.ttl {
            fields.push(self.ttl.to_string());
        }
        if !style.hide.class {
            fields.push(self.class.to_string());
        }
        fields.push(self.rtype().to_string());

        let rdata = if style.hide.origin {
            self.rdata.map_names(|n| style.name(n))
        } else {
            self.rdata.clone()
        };
        fields.push(rdata.to_presentation());

        format!("{}\n", fields.join("\t"))
    }

    pub fn to_tinydns(&self) -> Result<String, RecordError> {
        let fqdn = tiny_name(&self.owner);
        let ttl = self.ttl;

        let line = match &self.rdata {
            Rdata::A { address } => format!("+{}:{}:{}", fqdn, address, ttl),
            Rdata::Aaaa { address } => {
                format!("3{}:{}:{}", fqdn, hex::encode(address.octets()), ttl)
            }
            Rdata::Ns { dname } => format!("&{}::{}:{}", fqdn, tiny_name(dname), ttl),
            Rdata::Mx {
                preference,
                exchange,
            } => format!(
                "@{}::{}:{}:{}",
                fqdn,
                tiny_name(exchange),
                preference,
                ttl
            ),
            Rdata::Ptr { dname } => format!("^{}:{}:{}", fqdn, tiny_name(dname), ttl),
            Rdata::Cname { cname } => format!("C{}:{}:{}", fqdn, tiny_name(cname), ttl),
            Rdata::Txt { data } => format!(
                "'{}:{}:{}",
                fqdn,
                wire::octal_escape(data.concat().as_bytes()),
                ttl
            ),
            Rdata::Soa(soa) => format!(
                "Z{}:{}:{}:{}:{}:{}:{}:{}:{}",
                fqdn,
                tiny_name(&soa.mname),
                tiny_name(&soa.rname),
                soa.serial,
                soa.refresh,
                soa.retry,
                soa.expire,
                soa.minimum,
                ttl
            ),
            Rdata::Srv {
                priority,
                weight,
                port,
                target,
            } => format!(
                "S{}::{}:{}:{}:{}:{}",
                fqdn,
                tiny_name(target),
                port,
                priority,
                weight,
                ttl
            ),
            Rdata::Generic { rtype, .. } => {
                return Err(RecordError::Unrepresentable {
                    rtype: *rtype,
                    dialect: "tinydns",
                });
            }
            other => format!(
                ":{}:{}:{}:{}",
                fqdn,
                other.rtype().code(),
                wire::octal_escape(&wire::encode(other)?),
                ttl
            ),
        };
        let meta = &self.tinydns;
        Ok(format!(
            "{}:{}:{}\n",
            line,
            meta.timestamp.as_deref().unwrap_or(""),
            meta.location.as_deref().unwrap_or("")
        ))
    }

    pub fn to_maradns(&self) -> Result<String, RecordError> {
        let rtype = self.rtype();
        let rdata = match &self.rdata {
            Rdata::A { .. }
            | Rdata::Aaaa { .. }
            | Rdata::Ns { .. }
            | Rdata::Cname { .. }
            | Rdata::Ptr { .. }
            | Rdata::Mx { .. }
            | Rdata::Srv { .. }
            | Rdata::Soa(_) => format!("{} {}", rtype, self.rdata.to_presentation()),
            Rdata::Txt { data } | Rdata::Spf { data } => {
                let parts: Vec<String> = data.iter().map(|s| mara_quote(s)).collect();
                format!("{} {}", rtype, parts.join(";"))
            }
            Rdata::Hinfo { cpu, os } => format!("HINFO {};{}", mara_quote(cpu), mara_quote(os)),
            Rdata::Generic { rtype, .. } => {
                return Err(RecordError::Unrepresentable {
                    rtype: *rtype,
                    dialect: "MaraDNS",
                });
            }
            other => format!(
                "RAW {} {}",
                rtype.code(),
                mara_raw(&wire::encode(other)?)
            ),
        };
        Ok(format!("{} +{} {} ~\n", self.owner, self.ttl, rdata))
    }
}

impl Rdata {
    /// Copy with every domain name field passed through `f`.
    pub fn map_names(&self, f: impl Fn(&str) -> String) -> Rdata {
        match self {
            Rdata::Ns { dname } => Rdata::Ns { dname: f(dname) },
            Rdata::Ptr { dname } => Rdata::Ptr { dname: f(dname) },
            Rdata::Cname { cname } => Rdata::Cname { cname: f(cname) },
            Rdata::Dname { target } => Rdata::Dname { target: f(target) },
            Rdata::Mx {
                preference,
                exchange,
            } => Rdata::Mx {
                preference: *preference,
                exchange: f(exchange),
            },
            Rdata::Srv {
                priority,
                weight,
                port,
                target,
            } => Rdata::Srv {
                priority: *priority,
                weight: *weight,
                port: *port,
                target: f(target),
            },
            Rdata::Soa(soa) => {
                let mut soa = soa.clone();
                soa.mname = f(&soa.mname);
                soa.rname = f(&soa.rname);
                Rdata::Soa(soa)
            }
            other => other.clone(),
        }
    }
}
