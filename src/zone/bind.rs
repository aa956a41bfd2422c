//! BIND master file parser (RFC 1035 section 5).
//!
//! Produces [`Entry`] values in source order. Names are left as written;
//! qualification against the origin happens in the expander.

use super::entry::{Directive, Entry, PendingRecord};
use crate::error::{Result, ZoneError};
use crate::rr::{RecordClass, RecordType, TinydnsMeta};
use crate::util::{directive_ttl, has_unquoted, remove_char, strip_comment, to_seconds, tokenize};
use tracing::{debug, trace, warn};

const QUOTE: char = '"';

/// An open `( ... )` group
struct Continuation {
    start_line: usize,
    owner_omitted: bool,
    buffer: String,
}

pub fn parse(text: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut pending: Option<Continuation> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let line = strip_comment(raw, QUOTE, ';');

        if let Some(cont) = pending.as_mut() {
            if line.trim().is_empty() {
                continue;
            }
            cont.buffer.push(' ');
            cont.buffer.push_str(line.trim());
            if has_unquoted(line, QUOTE, ')') {
                if let Some(cont) = pending.take() {
                    let joined = remove_parens(&cont.buffer);
                    entries.push(Entry::Record(parse_record(
                        &joined,
                        cont.owner_omitted,
                        cont.start_line,
                    )?));
                }
            }
            continue;
        }

        if raw.trim().is_empty() {
            entries.push(Entry::Verbatim(String::new()));
            continue;
        }

        let trimmed = raw.trim_start();
        if trimmed.starts_with(';') || trimmed.starts_with("//") {
            entries.push(Entry::Verbatim(raw.trim_end().to_string()));
            continue;
        }

        trace!("Parsing line {}: {}", line_number, line);

        if trimmed.starts_with('$') {
            entries.extend(parse_directive(raw, line_number)?);
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        let owner_omitted = line.starts_with(' ') || line.starts_with('\t');

        if has_unquoted(line, QUOTE, '(') && !has_unquoted(line, QUOTE, ')') {
            pending = Some(Continuation {
                start_line: line_number,
                owner_omitted,
                buffer: line.trim_end().to_string(),
            });
            continue;
        }

        let line = remove_parens(line);
        entries.push(Entry::Record(parse_record(&line, owner_omitted, line_number)?));
    }

    if let Some(cont) = pending {
        return Err(ZoneError::UnclosedContinuation {
            line: cont.start_line,
        });
    }

    Ok(entries)
}

fn remove_parens(s: &str) -> String {
    remove_char(&remove_char(s, QUOTE, '('), QUOTE, ')')
}

/// Split a record line into owner, ttl, class, type and rdata. TTL and
/// class may come in either order.
fn parse_record(text: &str, owner_omitted: bool, line: usize) -> Result<PendingRecord> {
    let unrecognized = || ZoneError::UnrecognizedLine {
        line,
        text: text.trim().to_string(),
    };

    let tokens = tokenize(text, QUOTE);
    let mut idx = 0;
    let owner = if owner_omitted {
        None
    } else {
        idx = 1;
        Some(tokens.first().ok_or_else(unrecognized)?.clone())
    };

    let mut ttl = None;
    let mut class = None;
    let mut rtype = None;

    while let Some(token) = tokens.get(idx) {
        idx += 1;
        if ttl.is_none() && token.starts_with(|c: char| c.is_ascii_digit()) {
            ttl = Some(to_seconds(token)?);
            continue;
        }
        if class.is_none() {
            if let Ok(parsed) = token.parse::<RecordClass>() {
                class = Some(parsed);
                continue;
            }
        }
        if token.parse::<RecordType>().is_ok() {
            rtype = Some(token.to_ascii_uppercase());
            break;
        }
        return Err(unrecognized());
    }

    let rtype = rtype.ok_or_else(unrecognized)?;
    let rdata = tokens[idx..].to_vec();
    if rdata.is_empty() {
        return Err(unrecognized());
    }

    Ok(PendingRecord {
        owner,
        ttl,
        class,
        rtype,
        rdata,
        line,
        text: text.trim().to_string(),
        tinydns: TinydnsMeta::default(),
    })
}

fn parse_directive(raw: &str, line: usize) -> Result<Vec<Entry>> {
    let invalid = || ZoneError::InvalidDirective {
        line,
        text: raw.trim().to_string(),
    };

    let body = strip_comment(raw, QUOTE, ';');
    let comment = raw
        .get(body.len() + 1..)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let parts = tokenize(body, QUOTE);
    let name = parts.first().map(|p| p.to_ascii_uppercase()).unwrap_or_default();

    let directive = match name.as_str() {
        "$TTL" => {
            let value = parts.get(1).ok_or_else(invalid)?;
            let ttl = directive_ttl(value)?;
            debug!("Set default TTL to: {}", ttl);
            Directive::Ttl(ttl)
        }
        "$ORIGIN" => {
            let origin = parts.get(1).ok_or_else(invalid)?;
            debug!("Set origin to: {}", origin);
            Directive::Origin(origin.clone())
        }
        "$INCLUDE" => {
            let path = parts.get(1).ok_or_else(invalid)?;
            debug!("Found $INCLUDE {} {:?}", path, parts.get(2));
            Directive::Include {
                path: path.clone(),
                origin: parts.get(2).cloned(),
            }
        }
        "$GENERATE" => return generate(&parts, raw, line),
        _ => {
            warn!("Unknown directive at line {}: {}", line, raw.trim());
            return Ok(Vec::new());
        }
    };

    Ok(vec![Entry::Directive {
        directive,
        line,
        comment,
    }])
}

/// `$GENERATE start-stop[/step] lhs [ttl] [class] type rhs`
fn generate(parts: &[String], raw: &str, line: usize) -> Result<Vec<Entry>> {
    let invalid = || ZoneError::InvalidDirective {
        line,
        text: raw.trim().to_string(),
    };

    if parts.len() < 5 {
        return Err(invalid());
    }
    let (start, stop, step) = parse_generate_range(&parts[1]).ok_or_else(invalid)?;
    let lhs = &parts[2];

    let mut idx = 3;
    let mut ttl = None;
    let mut class = None;
    if parts[idx].starts_with(|c: char| c.is_ascii_digit()) {
        ttl = Some(to_seconds(&parts[idx])?);
        idx += 1;
    }
    if let Some(parsed) = parts.get(idx).and_then(|p| p.parse::<RecordClass>().ok()) {
        class = Some(parsed);
        idx += 1;
    }
    let rtype = parts.get(idx).ok_or_else(invalid)?;
    rtype.parse::<RecordType>().map_err(|_| invalid())?;
    let rhs = parts.get(idx + 1..).filter(|r| !r.is_empty()).ok_or_else(invalid)?.join(" ");

    debug!(
        "Processing $GENERATE {}-{}/{} {} {} {}",
        start, stop, step, lhs, rtype, rhs
    );

    let mut entries = Vec::new();
    let mut i = start;
    while i <= stop {
        let owner = expand_generate_format(lhs, i).ok_or_else(invalid)?;
        let rdata = expand_generate_format(&rhs, i).ok_or_else(invalid)?;
        entries.push(Entry::Record(PendingRecord {
            owner: Some(owner),
            ttl,
            class,
            rtype: rtype.to_ascii_uppercase(),
            rdata: tokenize(&rdata, QUOTE),
            line,
            text: raw.trim().to_string(),
            tinydns: TinydnsMeta::default(),
        }));
        i += step;
    }

    debug!("Generated {} records from $GENERATE", entries.len());
    Ok(entries)
}

/// `start-stop[/step]`
fn parse_generate_range(range: &str) -> Option<(u32, u32, u32)> {
    let (bounds, step) = match range.split_once('/') {
        Some((bounds, step)) => (bounds, step.parse::<u32>().ok()?),
        None => (range, 1),
    };
    let (start, stop) = bounds.split_once('-')?;
    let start = start.parse::<u32>().ok()?;
    let stop = stop.parse::<u32>().ok()?;

    if start > stop || step == 0 {
        return None;
    }
    Some((start, stop, step))
}

/// Replace `$` with the iterator value and `${offset,width,base}` with
/// the offset value formatted in `base` (d, o, x or X). `\$` is a
/// literal dollar sign.
fn expand_generate_format(template: &str, value: u32) -> Option<String> {
    let mut result = String::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'$') => {
                chars.next();
                result.push('$');
            }
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut modifier = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    modifier.push(c);
                }
                if !closed {
                    return None;
                }

                let mut fields = modifier.split(',');
                let offset = fields.next().unwrap_or("0").trim().parse::<i64>().ok()?;
                let width = fields.next().unwrap_or("0").trim().parse::<usize>().ok()?;
                let base = fields.next().unwrap_or("d").trim();
                let adjusted = u64::try_from(i64::from(value) + offset).ok()?;

                let formatted = match base {
                    "d" => format!("{:0width$}", adjusted, width = width),
                    "o" => format!("{:0width$o}", adjusted, width = width),
                    "x" => format!("{:0width$x}", adjusted, width = width),
                    "X" => format!("{:0width$X}", adjusted, width = width),
                    _ => return None,
                };
                result.push_str(&formatted);
            }
            '$' => result.push_str(&value.to_string()),
            c => result.push(c),
        }
    }

    Some(result)
}
