use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    MD,
    MF,
    CNAME,
    SOA,
    PTR,
    HINFO,
    MX,
    TXT,
    RP,
    SIG,
    KEY,
    AAAA,
    LOC,
    NXT,
    SRV,
    NAPTR,
    KX,
    CERT,
    DNAME,
    APL,
    DS,
    SSHFP,
    IPSECKEY,
    RRSIG,
    NSEC,
    DNSKEY,
    DHCID,
    NSEC3,
    NSEC3PARAM,
    TLSA,
    SMIMEA,
    HIP,
    OPENPGPKEY,
    SVCB,
    HTTPS,
    SPF,
    URI,
    CAA,
    /// Any type without a mnemonic here, written `TYPEnnn`
    Unknown(u16),
}

const MNEMONICS: &[(RecordType, &str, u16)] = &[
    (RecordType::A, "A", 1),
    (RecordType::NS, "NS", 2),
    (RecordType::MD, "MD", 3),
    (RecordType::MF, "MF", 4),
    (RecordType::CNAME, "CNAME", 5),
    (RecordType::SOA, "SOA", 6),
    (RecordType::PTR, "PTR", 12),
    (RecordType::HINFO, "HINFO", 13),
    (RecordType::MX, "MX", 15),
    (RecordType::TXT, "TXT", 16),
    (RecordType::RP, "RP", 17),
    (RecordType::SIG, "SIG", 24),
    (RecordType::KEY, "KEY", 25),
    (RecordType::AAAA, "AAAA", 28),
    (RecordType::LOC, "LOC", 29),
    (RecordType::NXT, "NXT", 30),
    (RecordType::SRV, "SRV", 33),
    (RecordType::NAPTR, "NAPTR", 35),
    (RecordType::KX, "KX", 36),
    (RecordType::CERT, "CERT", 37),
    (RecordType::DNAME, "DNAME", 39),
    (RecordType::APL, "APL", 42),
    (RecordType::DS, "DS", 43),
    (RecordType::SSHFP, "SSHFP", 44),
    (RecordType::IPSECKEY, "IPSECKEY", 45),
    (RecordType::RRSIG, "RRSIG", 46),
    (RecordType::NSEC, "NSEC", 47),
    (RecordType::DNSKEY, "DNSKEY", 48),
    (RecordType::DHCID, "DHCID", 49),
    (RecordType::NSEC3, "NSEC3", 50),
    (RecordType::NSEC3PARAM, "NSEC3PARAM", 51),
    (RecordType::TLSA, "TLSA", 52),
    (RecordType::SMIMEA, "SMIMEA", 53),
    (RecordType::HIP, "HIP", 55),
    (RecordType::OPENPGPKEY, "OPENPGPKEY", 61),
    (RecordType::SVCB, "SVCB", 64),
    (RecordType::HTTPS, "HTTPS", 65),
    (RecordType::SPF, "SPF", 99),
    (RecordType::URI, "URI", 256),
    (RecordType::CAA, "CAA", 257),
];

impl RecordType {
    /// Numeric type code as used on the wire and in tinydns generic lines
    pub fn code(self) -> u16 {
        match self {
            RecordType::Unknown(code) => code,
            known => MNEMONICS
                .iter()
                .find(|(t, _, _)| *t == known)
                .map(|(_, _, code)| *code)
                .unwrap_or_default(),
        }
    }

    pub fn from_code(code: u16) -> Self {
        MNEMONICS
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(t, _, _)| *t)
            .unwrap_or(RecordType::Unknown(code))
    }

    /// Types that may share an owner with a CNAME when DNSSEC is in use
    /// (RFC 2181, RFC 4035).
    pub fn coexists_with_cname(self) -> bool {
        matches!(
            self,
            RecordType::SIG | RecordType::NXT | RecordType::KEY | RecordType::NSEC | RecordType::RRSIG
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Unknown(code) => write!(f, "TYPE{}", code),
            known => {
                let name = MNEMONICS
                    .iter()
                    .find(|(t, _, _)| t == known)
                    .map(|(_, name, _)| *name)
                    .unwrap_or("TYPE0");
                f.write_str(name)
            }
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        if let Some((rtype, _, _)) = MNEMONICS.iter().find(|(_, name, _)| *name == upper) {
            return Ok(*rtype);
        }
        // RFC 3597 generic type names
        if let Some(num) = upper.strip_prefix("TYPE") {
            if let Ok(code) = num.parse::<u16>() {
                return Ok(RecordType::from_code(code));
            }
        }
        Err(s.to_string())
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RecordClass {
    #[default]
    IN,
    CS,
    CH,
    HS,
    NONE,
    ANY,
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            2 => RecordClass::CS,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            254 => RecordClass::NONE,
            255 => RecordClass::ANY,
            _ => RecordClass::IN,
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(class: RecordClass) -> u16 {
        match class {
            RecordClass::IN => 1,
            RecordClass::CS => 2,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::NONE => 254,
            RecordClass::ANY => 255,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordClass::IN => "IN",
            RecordClass::CS => "CS",
            RecordClass::CH => "CH",
            RecordClass::HS => "HS",
            RecordClass::NONE => "NONE",
            RecordClass::ANY => "ANY",
        };
        f.write_str(name)
    }
}

impl FromStr for RecordClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(RecordClass::IN),
            "CS" => Ok(RecordClass::CS),
            "CH" => Ok(RecordClass::CH),
            "HS" => Ok(RecordClass::HS),
            "NONE" => Ok(RecordClass::NONE),
            "ANY" => Ok(RecordClass::ANY),
            _ => Err(s.to_string()),
        }
    }
}

impl Serialize for RecordClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|bad| serde::de::Error::custom(format!("unknown class: {}", bad)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_and_codes() {
        assert_eq!("cname".parse::<RecordType>().unwrap(), RecordType::CNAME);
        assert_eq!("TYPE257".parse::<RecordType>().unwrap(), RecordType::CAA);
        assert_eq!("TYPE65280".parse::<RecordType>().unwrap(), RecordType::Unknown(65280));
        assert_eq!(RecordType::Unknown(65280).to_string(), "TYPE65280");
        assert_eq!(RecordType::DNSKEY.code(), 48);
        assert_eq!(RecordType::from_code(43), RecordType::DS);
        assert!("BOGUS".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_cname_compatible_types() {
        assert!(RecordType::RRSIG.coexists_with_cname());
        assert!(RecordType::NSEC.coexists_with_cname());
        assert!(!RecordType::A.coexists_with_cname());
        assert!(!RecordType::CNAME.coexists_with_cname());
    }

    #[test]
    fn test_class_round_trip() {
        for class in ["IN", "CS", "CH", "HS", "NONE", "ANY"] {
            assert_eq!(class.parse::<RecordClass>().unwrap().to_string(), class);
        }
        assert_eq!(u16::from(RecordClass::CH), 3);
        assert_eq!(RecordClass::from(255), RecordClass::ANY);
    }
}
