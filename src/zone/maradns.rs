//! MaraDNS csv2 zone parser.
//!
//! Records end at a newline unless the file uses tildes, in which case
//! every record ends with an unquoted `~` and may span lines. Quoting
//! uses `'` with backslash escapes; `#` starts a comment; `%` stands for
//! the current origin.

use super::entry::{Directive, Entry, ParseState, PendingRecord};
use crate::error::{Result, ZoneError};
use crate::rr::{RecordType, TinydnsMeta};
use crate::util::{
    directive_ttl, has_unquoted, replace_char, reverse_ipv4_name, reverse_ipv6_name, to_seconds, tokenize,
};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, trace, warn};

const QUOTE: char = '\'';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    Record,
    Directive,
    Comment,
    Blank,
}

#[derive(Debug)]
struct Unit {
    kind: UnitKind,
    line: usize,
    text: String,
}

/// Splits text into records, directives and (outside tilde mode) layout
/// lines.
struct Scanner {
    tilde: bool,
    units: Vec<Unit>,
    buffer: String,
    start: usize,
    line: usize,
    directive: bool,
}

impl Scanner {
    fn new(tilde: bool) -> Self {
        Self {
            tilde,
            units: Vec::new(),
            buffer: String::new(),
            start: 1,
            line: 1,
            directive: false,
        }
    }

    fn at_start(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    fn push(&mut self, c: char) {
        if self.at_start() && !c.is_whitespace() {
            self.start = self.line;
        }
        self.buffer.push(c);
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        let kind = if self.directive {
            UnitKind::Directive
        } else if text.trim().is_empty() {
            UnitKind::Blank
        } else {
            UnitKind::Record
        };
        self.directive = false;

        if kind == UnitKind::Blank && self.tilde {
            return;
        }
        let line = if kind == UnitKind::Blank {
            self.line
        } else {
            self.start
        };
        self.units.push(Unit { kind, line, text });
    }

    fn scan(mut self, text: &str) -> Result<Vec<Unit>> {
        let mut chars = text.chars().peekable();
        let mut in_quotes = false;

        while let Some(ch) = chars.next() {
            if in_quotes {
                self.buffer.push(ch);
                match ch {
                    '\\' => {
                        if let Some(next) = chars.next() {
                            if next == '\n' {
                                self.line += 1;
                            }
                            self.buffer.push(next);
                        }
                    }
                    QUOTE => in_quotes = false,
                    '\n' => self.line += 1,
                    _ => {}
                }
                continue;
            }

            match ch {
                QUOTE => {
                    in_quotes = true;
                    self.push(ch);
                }
                '#' => {
                    let mut comment = String::from("#");
                    while let Some(&c) = chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        comment.push(c);
                        chars.next();
                    }
                    if !self.tilde && !self.directive && self.at_start() {
                        self.buffer.clear();
                        self.units.push(Unit {
                            kind: UnitKind::Comment,
                            line: self.line,
                            text: comment.trim_end().to_string(),
                        });
                        if chars.next_if_eq(&'\n').is_some() {
                            self.line += 1;
                        }
                    }
                }
                '\n' => {
                    if !self.tilde || self.directive {
                        self.flush();
                    } else {
                        self.buffer.push(' ');
                    }
                    self.line += 1;
                }
                '~' if self.tilde => self.flush(),
                '/' if self.at_start() => {
                    self.directive = true;
                    self.push(ch);
                }
                c => self.push(c),
            }
        }

        if in_quotes || (self.tilde && !self.directive && !self.at_start()) {
            return Err(ZoneError::UnclosedContinuation { line: self.start });
        }
        if !self.at_start() {
            self.flush();
        }
        Ok(self.units)
    }
}

/// True when an unquoted, uncommented `~` occurs anywhere in `text`.
fn uses_tilde(text: &str) -> bool {
    let mut chars = text.chars();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            '#' if !in_quotes => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '~' if !in_quotes => return true,
            _ => {}
        }
    }
    false
}

/// Split quoted string data on unquoted `;`. Adjacent pieces are
/// concatenated: `'a''b';'c'` is `["ab", "c"]`.
fn split_strings(s: &str) -> Vec<String> {
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            QUOTE => in_quotes = !in_quotes,
            ';' if !in_quotes => strings.push(std::mem::take(&mut current)),
            c if c.is_whitespace() && !in_quotes => {}
            c => current.push(c),
        }
    }
    strings.push(current);
    strings
}

/// `RAW` data: `'quoted text'` and `\xHH` bytes, whitespace ignored.
fn decode_raw(s: &str) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                QUOTE => in_quotes = false,
                '\\' => {
                    let next = chars.next()?;
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
                }
                c => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
            continue;
        }
        match ch {
            QUOTE => in_quotes = true,
            '\\' => {
                if chars.next()? != 'x' {
                    return None;
                }
                let hex: String = [chars.next()?, chars.next()?].iter().collect();
                bytes.push(u8::from_str_radix(&hex, 16).ok()?);
            }
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }
    if in_quotes {
        return None;
    }
    Some(bytes)
}

/// First whitespace separated word and the rest
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    }
}

pub fn parse(text: &str, state: &ParseState) -> Result<Vec<Entry>> {
    let tilde = uses_tilde(text);
    debug!("Parsing csv2 data, tilde mode: {}", tilde);

    let mut state = state.clone();
    let mut entries = Vec::new();

    for unit in Scanner::new(tilde).scan(text)? {
        trace!("Parsing line {}: {}", unit.line, unit.text.trim());
        match unit.kind {
            UnitKind::Blank => entries.push(Entry::Verbatim(String::new())),
            UnitKind::Comment => entries.push(Entry::Verbatim(unit.text)),
            UnitKind::Directive => {
                if let Some(entry) = parse_directive(&unit, &mut state)? {
                    entries.push(entry);
                }
            }
            UnitKind::Record => {
                let text = substitute_origin(&unit, &state)?;
                let owner_omitted = !tilde && text.starts_with(char::is_whitespace);
                entries.extend(
                    parse_record(&text, owner_omitted, unit.line)?
                        .into_iter()
                        .map(Entry::Record),
                );
            }
        }
    }

    Ok(entries)
}

/// Replace unquoted `%` with the current origin
fn substitute_origin(unit: &Unit, state: &ParseState) -> Result<String> {
    if !has_unquoted(&unit.text, QUOTE, '%') {
        return Ok(unit.text.trim_end().to_string());
    }
    let origin = state
        .origin
        .as_deref()
        .ok_or(ZoneError::AmbiguousOrigin { line: unit.line })?;
    Ok(replace_char(unit.text.trim_end(), QUOTE, '%', origin))
}

fn parse_directive(unit: &Unit, state: &mut ParseState) -> Result<Option<Entry>> {
    let text = substitute_origin(unit, state)?;
    let invalid = || ZoneError::InvalidDirective {
        line: unit.line,
        text: text.trim().to_string(),
    };
    let (name, rest) = split_word(&text);
    let value = rest.trim();

    let directive = match name.to_ascii_lowercase().as_str() {
        "/ttl" => {
            if value.is_empty() {
                return Err(invalid());
            }
            Directive::Ttl(directive_ttl(value)?)
        }
        "/origin" => {
            if value.is_empty() {
                return Err(invalid());
            }
            state.change_origin(value);
            Directive::Origin(value.to_string())
        }
        _ => {
            warn!("Unknown directive at line {}: {}", unit.line, text.trim());
            return Ok(None);
        }
    };
    debug!("Directive at line {}: {}", unit.line, directive);

    Ok(Some(Entry::Directive {
        directive,
        line: unit.line,
        comment: None,
    }))
}

/// `owner [+ttl] [type] rdata`. A record without a type whose data is an
/// IPv4 address is an A record.
fn parse_record(text: &str, owner_omitted: bool, line: usize) -> Result<Vec<PendingRecord>> {
    let unrecognized = || ZoneError::UnrecognizedLine {
        line,
        text: text.trim().to_string(),
    };

    let (owner, mut rest) = if owner_omitted {
        (None, text)
    } else {
        let (owner, rest) = split_word(text);
        (Some(owner.to_string()), rest)
    };

    let mut ttl = None;
    let (word, after) = split_word(rest);
    if let Some(value) = word.strip_prefix('+') {
        ttl = Some(to_seconds(value)?);
        rest = after;
    }

    let (word, after) = split_word(rest);
    if word.is_empty() {
        return Err(unrecognized());
    }
    let rtype = word.to_ascii_uppercase();
    let rdata = after.trim();

    let record = |rtype: &str, rdata: Vec<String>| PendingRecord {
        owner: owner.clone(),
        ttl,
        class: None,
        rtype: rtype.to_string(),
        rdata,
        line,
        text: text.trim().to_string(),
        tinydns: TinydnsMeta::default(),
    };

    let records = match rtype.as_str() {
        "TXT" | "SPF" => vec![record(&rtype, split_strings(rdata))],
        "HINFO" => vec![record("HINFO", split_strings(rdata))],
        "SOA" => {
            let mut tokens = tokenize(rdata, QUOTE);
            if let Some(rname) = tokens.get_mut(1) {
                *rname = rname.replacen('@', ".", 1);
            }
            vec![record("SOA", tokens)]
        }
        "FQDN4" => {
            let target = owner.clone().ok_or_else(unrecognized)?;
            let mut records = vec![record("A", vec![rdata.to_string()])];
            if let Ok(addr) = rdata.parse::<Ipv4Addr>() {
                let mut ptr = record("PTR", vec![target]);
                ptr.owner = Some(reverse_ipv4_name(&addr));
                records.push(ptr);
            }
            records
        }
        "FQDN6" => {
            let target = owner.clone().ok_or_else(unrecognized)?;
            let mut records = vec![record("AAAA", vec![rdata.to_string()])];
            if let Ok(addr) = rdata.parse::<Ipv6Addr>() {
                let mut ptr = record("PTR", vec![target]);
                ptr.owner = Some(reverse_ipv6_name(&addr));
                records.push(ptr);
            }
            records
        }
        "RAW" => {
            let (code, data) = split_word(rdata);
            let code: u16 = code.parse().map_err(|_| unrecognized())?;
            let bytes = decode_raw(data).ok_or_else(unrecognized)?;
            vec![record(
                &RecordType::from_code(code).to_string(),
                vec![
                    "\\#".to_string(),
                    bytes.len().to_string(),
                    hex::encode_upper(&bytes),
                ],
            )]
        }
        _ if rtype.parse::<RecordType>().is_ok() => {
            vec![record(&rtype, tokenize(rdata, QUOTE))]
        }
        _ if word.parse::<Ipv4Addr>().is_ok() && rdata.is_empty() => {
            vec![record("A", vec![word.to_string()])]
        }
        _ => return Err(unrecognized()),
    };

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(origin: &str) -> ParseState {
        let mut state = ParseState::default();
        state.set_implicit_origin(origin);
        state
    }

    fn records(entries: &[Entry]) -> Vec<&PendingRecord> {
        entries
            .iter()
            .filter_map(|e| match e {
                Entry::Record(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_line_mode() {
        let text = "# header\nexample.net. +86400 A 10.1.2.3\n\nwww.% 10.1.2.4\n";
        let entries = parse(text, &state("example.net.")).unwrap();
        assert_eq!(entries[0], Entry::Verbatim("# header".to_string()));
        let recs = records(&entries);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].ttl, Some(86_400));
        assert_eq!(recs[1].owner.as_deref(), Some("www.example.net."));
        assert_eq!(recs[1].rtype, "A");
        assert_eq!(recs[1].rdata, vec!["10.1.2.4"]);
    }

    #[test]
    fn test_tilde_mode_spans_lines() {
        let text = "x.org. SOA x.org. hostmaster@x.org. 1 7200 3600 604800\n   1800 ~\nx.org. NS ns.x.org. ~ # trailing\n";
        let entries = parse(text, &ParseState::default()).unwrap();
        let recs = records(&entries);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].rdata.len(), 7);
        assert_eq!(recs[0].rdata[1], "hostmaster.x.org.");
        assert_eq!(recs[0].rdata[6], "1800");
        assert_eq!(recs[1].line, 3);
    }

    #[test]
    fn test_tilde_inside_quotes_is_data() {
        assert!(!uses_tilde("t.example. TXT 'a~b'\n"));
        assert!(!uses_tilde("t.example. A 1.2.3.4 # not ~ here\n"));
        assert!(uses_tilde("t.example. A 1.2.3.4 ~\n"));
    }

    #[test]
    fn test_unterminated_tilde_record() {
        let err = parse("a.example. A 1.2.3.4 ~\nb.example. A 1.2.3.5\n", &ParseState::default())
            .unwrap_err();
        assert_eq!(err, ZoneError::UnclosedContinuation { line: 2 });
    }

    #[test]
    fn test_txt_segments() {
        assert_eq!(split_strings("'a''b';'c'"), vec!["ab", "c"]);
        assert_eq!(split_strings("'it\\'s; fine'"), vec!["it's; fine"]);
        assert_eq!(split_strings("'cpu' ; 'os'"), vec!["cpu", "os"]);
    }

    #[test]
    fn test_fqdn4_fans_out() {
        let entries = parse("h.example.com. FQDN4 10.0.0.9\n", &ParseState::default()).unwrap();
        let recs = records(&entries);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].rtype, "A");
        assert_eq!(recs[1].rtype, "PTR");
        assert_eq!(recs[1].owner.as_deref(), Some("9.0.0.10.in-addr.arpa."));
        assert_eq!(recs[1].rdata, vec!["h.example.com."]);
    }

    #[test]
    fn test_raw_record() {
        assert_eq!(
            decode_raw("\\x00\\x05'issue' 'ca.example'"),
            Some(b"\x00\x05issueca.example".to_vec())
        );
        assert_eq!(decode_raw("\\q"), None);

        let entries =
            parse("e.example. RAW 257 \\x00\\x05'issue''ca'\n", &ParseState::default()).unwrap();
        let recs = records(&entries);
        assert_eq!(recs[0].rtype, "CAA");
        assert_eq!(recs[0].rdata, vec!["\\#", "9", "000569737375656361"]);
    }

    #[test]
    fn test_directives_track_origin() {
        let text = "/origin sub\nhost.% A 10.0.0.1\n/ttl 600\n";
        let entries = parse(text, &state("example.com.")).unwrap();
        assert!(matches!(
            &entries[0],
            Entry::Directive { directive: Directive::Origin(o), .. } if o == "sub"
        ));
        assert_eq!(records(&entries)[0].owner.as_deref(), Some("host.sub.example.com."));
        assert!(matches!(
            &entries[2],
            Entry::Directive { directive: Directive::Ttl(600), .. }
        ));
    }

    #[test]
    fn test_percent_without_origin() {
        let err = parse("www.% A 10.0.0.1\n", &ParseState::default()).unwrap_err();
        assert_eq!(err, ZoneError::AmbiguousOrigin { line: 1 });
    }
}
