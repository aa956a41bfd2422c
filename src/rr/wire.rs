//! Uncompressed rdata wire encoding.
//!
//! tinydns generic (`:`) lines and MaraDNS `RAW` records carry rdata in
//! wire form, so both directions are needed for the types those dialects
//! have no native syntax for.

use super::rdata::{Rdata, Soa};
use super::RecordType;
use crate::error::RecordError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Encode a domain name as a sequence of labels
fn put_name(out: &mut Vec<u8>, name: &str) -> Result<(), RecordError> {
    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() {
            continue;
        }
        if label.len() > 63 {
            return Err(RecordError::InvalidEncoding {
                field: "name",
                reason: format!("label too long: {}", label),
            });
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(())
}

fn put_string(out: &mut Vec<u8>, s: &str) -> Result<(), RecordError> {
    let bytes = s.as_bytes();
    if bytes.len() > 255 {
        return Err(RecordError::InvalidEncoding {
            field: "character-string",
            reason: format!("{} bytes exceeds 255", bytes.len()),
        });
    }
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(())
}

/// Split long text into 255 byte character-strings
fn put_text(out: &mut Vec<u8>, s: &str) {
    if s.is_empty() {
        out.push(0);
        return;
    }
    for chunk in s.as_bytes().chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
}

pub fn encode(rdata: &Rdata) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::new();
    match rdata {
        Rdata::A { address } => out.extend_from_slice(&address.octets()),
        Rdata::Aaaa { address } => out.extend_from_slice(&address.octets()),
        Rdata::Ns { dname } | Rdata::Ptr { dname } => put_name(&mut out, dname)?,
        Rdata::Cname { cname } => put_name(&mut out, cname)?,
        Rdata::Dname { target } => put_name(&mut out, target)?,
        Rdata::Mx {
            preference,
            exchange,
        } => {
            out.extend_from_slice(&preference.to_be_bytes());
            put_name(&mut out, exchange)?;
        }
        Rdata::Soa(soa) => {
            put_name(&mut out, &soa.mname)?;
            put_name(&mut out, &soa.rname)?;
            for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                out.extend_from_slice(&value.to_be_bytes());
            }
        }
        Rdata::Txt { data } | Rdata::Spf { data } => {
            for s in data {
                put_text(&mut out, s);
            }
        }
        Rdata::Srv {
            priority,
            weight,
            port,
            target,
        } => {
            out.extend_from_slice(&priority.to_be_bytes());
            out.extend_from_slice(&weight.to_be_bytes());
            out.extend_from_slice(&port.to_be_bytes());
            put_name(&mut out, target)?;
        }
        Rdata::Caa { flags, tag, value } => {
            out.push(*flags);
            put_string(&mut out, tag)?;
            out.extend_from_slice(value.as_bytes());
        }
        Rdata::Hinfo { cpu, os } => {
            put_string(&mut out, cpu)?;
            put_string(&mut out, os)?;
        }
        Rdata::Ds {
            key_tag,
            algorithm,
            digest_type,
            digest,
        } => {
            out.extend_from_slice(&key_tag.to_be_bytes());
            out.push(*algorithm);
            out.push(*digest_type);
            let bytes = hex::decode(digest).map_err(|e| RecordError::InvalidEncoding {
                field: "digest",
                reason: e.to_string(),
            })?;
            out.extend_from_slice(&bytes);
        }
        Rdata::Dnskey {
            flags,
            protocol,
            algorithm,
            public_key,
        } => {
            out.extend_from_slice(&flags.to_be_bytes());
            out.push(*protocol);
            out.push(*algorithm);
            let bytes = BASE64
                .decode(public_key)
                .map_err(|e| RecordError::InvalidEncoding {
                    field: "publickey",
                    reason: e.to_string(),
                })?;
            out.extend_from_slice(&bytes);
        }
        Rdata::Unknown { data, .. } => out.extend_from_slice(data),
        Rdata::Generic { rtype, .. } => {
            return Err(RecordError::Unrepresentable {
                rtype: *rtype,
                dialect: "wire format",
            });
        }
    }
    Ok(out)
}

struct Reader<'a> {
    rtype: RecordType,
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(rtype: RecordType, data: &'a [u8]) -> Self {
        Self { rtype, data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], RecordError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(RecordError::Truncated(self.rtype));
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, RecordError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, RecordError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, RecordError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn name(&mut self) -> Result<String, RecordError> {
        let mut labels = Vec::new();
        loop {
            let len = self.u8()? as usize;
            if len == 0 {
                break;
            }
            if len > 63 {
                // compression pointers never appear in zone data
                return Err(RecordError::InvalidEncoding {
                    field: "name",
                    reason: format!("label length {}", len),
                });
            }
            labels.push(String::from_utf8_lossy(self.take(len)?).to_lowercase());
        }
        Ok(format!("{}.", labels.join(".")))
    }

    fn string(&mut self) -> Result<String, RecordError> {
        let len = self.u8()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Decode wire rdata of `rtype`. Types without a typed variant come back
/// as [`Rdata::Unknown`].
pub fn decode(rtype: RecordType, data: &[u8]) -> Result<Rdata, RecordError> {
    let mut r = Reader::new(rtype, data);
    let rdata = match rtype {
        RecordType::A => {
            let b = r.take(4)?;
            Rdata::A {
                address: Ipv4Addr::new(b[0], b[1], b[2], b[3]),
            }
        }
        RecordType::AAAA => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(r.take(16)?);
            Rdata::Aaaa {
                address: Ipv6Addr::from(octets),
            }
        }
        RecordType::NS => Rdata::Ns { dname: r.name()? },
        RecordType::PTR => Rdata::Ptr { dname: r.name()? },
        RecordType::CNAME => Rdata::Cname { cname: r.name()? },
        RecordType::DNAME => Rdata::Dname { target: r.name()? },
        RecordType::MX => Rdata::Mx {
            preference: r.u16()?,
            exchange: r.name()?,
        },
        RecordType::SOA => Rdata::Soa(Soa {
            mname: r.name()?,
            rname: r.name()?,
            serial: r.u32()?,
            refresh: r.u32()?,
            retry: r.u32()?,
            expire: r.u32()?,
            minimum: r.u32()?,
        }),
        RecordType::TXT | RecordType::SPF => {
            let mut strings = Vec::new();
            while !r.is_empty() {
                strings.push(r.string()?);
            }
            if rtype == RecordType::TXT {
                Rdata::Txt { data: strings }
            } else {
                Rdata::Spf { data: strings }
            }
        }
        RecordType::SRV => Rdata::Srv {
            priority: r.u16()?,
            weight: r.u16()?,
            port: r.u16()?,
            target: r.name()?,
        },
        RecordType::CAA => Rdata::Caa {
            flags: r.u8()?,
            tag: r.string()?.to_ascii_lowercase(),
            value: String::from_utf8_lossy(r.rest()).into_owned(),
        },
        RecordType::HINFO => Rdata::Hinfo {
            cpu: r.string()?,
            os: r.string()?,
        },
        RecordType::DS => Rdata::Ds {
            key_tag: r.u16()?,
            algorithm: r.u8()?,
            digest_type: r.u8()?,
            digest: hex::encode_upper(r.rest()),
        },
        RecordType::DNSKEY => Rdata::Dnskey {
            flags: r.u16()?,
            protocol: r.u8()?,
            algorithm: r.u8()?,
            public_key: BASE64.encode(r.rest()),
        },
        other => Rdata::Unknown {
            code: other.code(),
            data: r.rest().to_vec(),
        },
    };

    if !r.is_empty() {
        return Err(RecordError::InvalidEncoding {
            field: "rdata",
            reason: format!("{} trailing bytes", data.len() - r.pos),
        });
    }
    Ok(rdata)
}

/// tinydns escaping: printable ASCII except `:` and `\` passes through,
/// everything else becomes `\ooo`.
pub fn octal_escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b':' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:03o}", b));
        }
    }
    out
}

pub fn octal_unescape(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let digits: Vec<u8> = bytes[i + 1..]
                .iter()
                .take(3)
                .take_while(|b| (b'0'..=b'7').contains(*b))
                .copied()
                .collect();
            if digits.len() == 3 {
                let value = digits
                    .iter()
                    .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
                out.push(value as u8);
                i += 4;
                continue;
            }
            // lone backslash escapes the next byte
            if let Some(&next) = bytes.get(i + 1) {
                out.push(next);
                i += 2;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caa_wire() {
        let caa = Rdata::Caa {
            flags: 0,
            tag: "issue".to_string(),
            value: "letsencrypt.org".to_string(),
        };
        let wire = encode(&caa).unwrap();
        assert_eq!(&wire[..7], b"\x00\x05issue");
        assert_eq!(decode(RecordType::CAA, &wire).unwrap(), caa);
    }

    #[test]
    fn test_srv_wire() {
        let srv = Rdata::Srv {
            priority: 10,
            weight: 20,
            port: 5060,
            target: "sip.example.com.".to_string(),
        };
        let wire = encode(&srv).unwrap();
        assert_eq!(&wire[..6], &[0, 10, 0, 20, 0x13, 0xc4]);
        assert_eq!(decode(RecordType::SRV, &wire).unwrap(), srv);
    }

    #[test]
    fn test_truncated_wire() {
        assert_eq!(
            decode(RecordType::MX, &[0]).unwrap_err(),
            RecordError::Truncated(RecordType::MX)
        );
    }

    #[test]
    fn test_unsupported_type_stays_opaque() {
        let rdata = decode(RecordType::LOC, &[0, 1, 2]).unwrap();
        assert_eq!(
            rdata,
            Rdata::Unknown {
                code: 29,
                data: vec![0, 1, 2]
            }
        );
    }

    #[test]
    fn test_octal_escaping() {
        assert_eq!(octal_escape(b"a:b\x01"), "a\\072b\\001");
        assert_eq!(octal_unescape("a\\072b\\001"), b"a:b\x01".to_vec());
        assert_eq!(octal_unescape("v=spf1 -all"), b"v=spf1 -all".to_vec());
    }
}
