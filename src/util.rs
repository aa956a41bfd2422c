//! Quote-aware scanning helpers shared by the dialect parsers.
//!
//! Quote awareness is always scoped to one quote character per dialect:
//! `"` for BIND, `'` for MaraDNS.

use crate::error::{Result, ZoneError};
use chrono::{Datelike, Local};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Returns true if `needle` occurs in `s` outside of quotes.
pub fn has_unquoted(s: &str, quote: char, needle: char) -> bool {
    let mut in_quotes = false;
    for ch in s.chars() {
        if ch == quote {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            return true;
        }
    }
    false
}

/// Removes unquoted occurrences of `target`. Quote marks themselves pass
/// through.
pub fn remove_char(s: &str, quote: char, target: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_quotes = false;
    for ch in s.chars() {
        if ch == quote {
            in_quotes = !in_quotes;
            out.push(ch);
        } else if ch == target && !in_quotes {
            continue;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Substitutes unquoted occurrences of `target` with `replacement`.
pub fn replace_char(s: &str, quote: char, target: char, replacement: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_quotes = false;
    for ch in s.chars() {
        if ch == quote {
            in_quotes = !in_quotes;
            out.push(ch);
        } else if ch == target && !in_quotes {
            out.push_str(replacement);
        } else {
            out.push(ch);
        }
    }
    out
}

/// Returns the part of `s` before the first unquoted `start`.
pub fn strip_comment<'a>(s: &'a str, quote: char, start: char) -> &'a str {
    let mut in_quotes = false;
    for (idx, ch) in s.char_indices() {
        if ch == quote {
            in_quotes = !in_quotes;
        } else if ch == start && !in_quotes {
            return &s[..idx];
        }
    }
    s
}

/// Split on unquoted whitespace. Quote marks are removed; inside quotes
/// `\DDD` is the byte with that decimal value and `\x` yields `x`. An
/// empty quoted string is kept as an empty token.
pub fn tokenize(s: &str, quote: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                let digits: String = chars.clone().take(3).collect();
                let decimal = if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) {
                    digits.parse::<u8>().ok()
                } else {
                    None
                };
                if let Some(byte) = decimal {
                    current.push(char::from(byte));
                    chars.nth(2);
                } else if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c == quote => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    tokens
}

/// `in-addr.arpa.` owner for a PTR record
pub fn reverse_ipv4_name(ip: &Ipv4Addr) -> String {
    let o = ip.octets();
    format!("{}.{}.{}.{}.in-addr.arpa.", o[3], o[2], o[1], o[0])
}

/// Nibble-reversed `ip6.arpa.` owner for a PTR record
pub fn reverse_ipv6_name(ip: &Ipv6Addr) -> String {
    let nibbles: Vec<String> = hex::encode(ip.octets())
        .chars()
        .rev()
        .map(String::from)
        .collect();
    format!("{}.ip6.arpa.", nibbles.join("."))
}

/// A directive argument after [`value_cleanup`].
#[derive(Debug, Clone, PartialEq)]
pub enum CleanValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Strips one layer of surrounding double quotes and converts numeric
/// literals that survive a print round trip unchanged.
pub fn value_cleanup(s: &str) -> CleanValue {
    let s = s
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s);

    if let Ok(n) = s.parse::<i64>() {
        if n.to_string() == s {
            return CleanValue::Integer(n);
        }
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f.to_string() == s {
            return CleanValue::Float(f);
        }
    }
    CleanValue::Text(s.to_string())
}

/// A TTL directive argument: plain or quoted seconds, or unit shorthand
pub fn directive_ttl(value: &str) -> Result<u32> {
    let invalid = || ZoneError::InvalidTtl(value.to_string());
    match value_cleanup(value) {
        CleanValue::Integer(n) => u32::try_from(n).map_err(|_| invalid()),
        CleanValue::Text(text) => to_seconds(&text),
        CleanValue::Float(_) => Err(invalid()),
    }
}

/// Generate a serial number from the local date (YYYYMMDDNN format)
pub fn serial_by_date(increment: u8) -> u32 {
    let now = Local::now();
    now.year() as u32 * 1_000_000 + now.month() * 10_000 + now.day() * 100 + u32::from(increment % 100)
}

/// Parse a TTL: either plain seconds or `<n>w<n>d<n>h<n>m<n>s` with any
/// subset of the units, in that order.
pub fn to_seconds(s: &str) -> Result<u32> {
    let invalid = || ZoneError::InvalidTtl(s.to_string());

    if s.is_empty() {
        return Err(invalid());
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<u32>().map_err(|_| invalid());
    }

    const UNITS: [(char, u64); 5] = [
        ('w', 604_800),
        ('d', 86_400),
        ('h', 3_600),
        ('m', 60),
        ('s', 1),
    ];

    let mut total: u64 = 0;
    let mut next_unit = 0;
    let mut digits = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if digits.is_empty() {
            return Err(invalid());
        }
        let unit = ch.to_ascii_lowercase();
        let pos = UNITS[next_unit..]
            .iter()
            .position(|(u, _)| *u == unit)
            .ok_or_else(invalid)?;
        let value: u64 = digits.parse().map_err(|_| invalid())?;
        total = value
            .checked_mul(UNITS[next_unit + pos].1)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(invalid)?;
        next_unit += pos + 1;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(invalid());
    }
    u32::try_from(total).map_err(|_| invalid())
}

/// Qualify `name` against `origin` and fold it to lowercase.
///
/// Absolute names (trailing dot) are only lowercased; `@` is the origin;
/// relative names get the origin appended. Without an origin a relative
/// name is treated as rooted.
pub fn fully_qualify(name: &str, origin: Option<&str>) -> String {
    let name = name.trim();
    if name == "@" {
        if let Some(origin) = origin {
            return fully_qualify(origin, None);
        }
    }
    if name.ends_with('.') {
        return name.to_lowercase();
    }
    match origin {
        Some(".") | None => format!("{}.", name.to_lowercase()),
        Some(origin) => {
            let origin = origin.trim_end_matches('.');
            if name.is_empty() {
                format!("{}.", origin.to_lowercase())
            } else {
                format!("{}.{}.", name.to_lowercase(), origin.to_lowercase())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_unquoted() {
        assert!(has_unquoted("a(b", '"', '('));
        assert!(!has_unquoted("a\"(\"b", '"', '('));
        assert!(has_unquoted("\"x\" ( y", '"', '('));
        assert!(!has_unquoted("abc", '"', '('));
    }

    #[test]
    fn test_remove_char() {
        assert_eq!(remove_char("a(b", '"', '('), "ab");
        assert_eq!(remove_char("a\"(\"b", '"', '('), "a\"(\"b");
        assert_eq!(remove_char("( x \"(\" )", '"', '('), " x \"(\" )");
    }

    #[test]
    fn test_replace_char() {
        assert_eq!(replace_char("a%b'%'", '\'', '%', "example.com."), "aexample.com.b'%'");
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("www A 1.2.3.4 ; web", '"', ';'), "www A 1.2.3.4 ");
        assert_eq!(strip_comment("t TXT \"a;b\" ; c", '"', ';'), "t TXT \"a;b\" ");
        assert_eq!(strip_comment("no comment", '"', ';'), "no comment");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize(r#"www  IN TXT "hello world" "" "say \"hi\"""#, '"'),
            vec!["www", "IN", "TXT", "hello world", "", "say \"hi\""]
        );
        assert_eq!(
            tokenize("a 'b c' 'it\\'s'", '\''),
            vec!["a", "b c", "it's"]
        );
        assert_eq!(
            tokenize(r#"TXT "\065\066C" "a\059b" "\999""#, '"'),
            vec!["TXT", "ABC", "a;b", "999"]
        );
    }

    #[test]
    fn test_reverse_names() {
        assert_eq!(
            reverse_ipv4_name(&Ipv4Addr::new(192, 0, 2, 7)),
            "7.2.0.192.in-addr.arpa."
        );
        let name = reverse_ipv6_name(&"2001:db8::1".parse().unwrap());
        assert!(name.starts_with("1.0.0.0."));
        assert!(name.ends_with(".8.b.d.0.1.0.0.2.ip6.arpa."));
        assert_eq!(name.split('.').count(), 32 + 3);
    }

    #[test]
    fn test_value_cleanup() {
        assert_eq!(value_cleanup("86400"), CleanValue::Integer(86400));
        assert_eq!(value_cleanup("\"3600\""), CleanValue::Integer(3600));
        assert_eq!(value_cleanup("1.5"), CleanValue::Float(1.5));
        assert_eq!(value_cleanup("007"), CleanValue::Text("007".to_string()));
        assert_eq!(
            value_cleanup("example.com."),
            CleanValue::Text("example.com.".to_string())
        );
    }

    #[test]
    fn test_to_seconds() {
        assert_eq!(to_seconds("3600").unwrap(), 3600);
        assert_eq!(to_seconds("1w2d3h4m5s").unwrap(), 788_645);
        assert_eq!(to_seconds("1H").unwrap(), 3600);
        assert_eq!(to_seconds("2d12h").unwrap(), 216_000);
        assert_eq!(to_seconds("90m").unwrap(), 5400);
        assert!(to_seconds("garbage").is_err());
        assert!(to_seconds("").is_err());
        assert!(to_seconds("5s1m").is_err());
        assert!(to_seconds("1h2").is_err());
        assert!(to_seconds("h").is_err());
        assert!(to_seconds("99999999999999999w").is_err());
        assert!(to_seconds("4294967296").is_err());
        assert!(to_seconds("8000w").is_err());
    }

    #[test]
    fn test_directive_ttl() {
        assert_eq!(directive_ttl("3600").unwrap(), 3600);
        assert_eq!(directive_ttl("\"1d\"").unwrap(), 86_400);
        assert!(directive_ttl("1.5").is_err());
        assert!(directive_ttl("-5").is_err());
    }

    #[test]
    fn test_serial_by_date() {
        let serial = serial_by_date(3);
        assert!(serial > 2024_00_00_00);
        assert_eq!(serial % 100, 3);
    }

    #[test]
    fn test_fully_qualify() {
        assert_eq!(fully_qualify("www", Some("example.com.")), "www.example.com.");
        assert_eq!(fully_qualify("WWW.Example.COM.", Some("x.")), "www.example.com.");
        assert_eq!(fully_qualify("@", Some("example.com")), "example.com.");
        assert_eq!(fully_qualify("host", None), "host.");
        assert_eq!(fully_qualify("host", Some(".")), "host.");
    }
}
