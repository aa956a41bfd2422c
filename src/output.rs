//! Zone writers for every export format.

use crate::config::ZoneOptions;
use crate::error::OutputError;
use crate::rr::{BindStyle, Record, ResourceRecord};
use crate::zone::{Directive, ZoneItem};
use clap::ValueEnum;
use serde_json::json;
use std::io::Write;

/// Columns available to the human table when the terminal width is unknown
pub const DEFAULT_WIDTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Bind,
    Tinydns,
    Maradns,
    Json,
    Human,
}

/// Write `items` in `format`. `origin` is the zone origin, used for
/// relative names when origin hiding is on.
pub fn write_zone<W: Write>(
    out: &mut W,
    items: &[ZoneItem],
    origin: &str,
    format: OutputFormat,
    options: &ZoneOptions,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Bind => write_bind(out, items, origin, options),
        OutputFormat::Tinydns => write_tinydns(out, items, options),
        OutputFormat::Maradns => write_maradns(out, items, options),
        OutputFormat::Json => write_json(out, items),
        OutputFormat::Human => write_human(out, items, options, DEFAULT_WIDTH),
    }
}

/// Blank and comment lines, re-marked with the dialect's comment prefix.
fn write_verbatim<W: Write>(out: &mut W, text: &str, marker: &str, options: &ZoneOptions) -> Result<(), OutputError> {
    if text.is_empty() {
        if options.show_blank {
            writeln!(out)?;
        }
        return Ok(());
    }
    if options.show_comment {
        let body = text
            .trim_start()
            .trim_start_matches(|c: char| c == ';' || c == '#' || c == '/');
        writeln!(out, "{}{}", marker, body)?;
    }
    Ok(())
}

pub fn write_bind<W: Write>(out: &mut W, items: &[ZoneItem], origin: &str, options: &ZoneOptions) -> Result<(), OutputError> {
    let mut style = BindStyle::new(Some(origin.to_string()), options.hide);

    let leading_origin = matches!(items.first(), Some(ZoneItem::Directive(Directive::Origin(_))));
    if options.hide.origin && !leading_origin {
        writeln!(out, "{}", Directive::Origin(origin.to_string()))?;
    }

    for item in items {
        match item {
            ZoneItem::Verbatim(text) => write_verbatim(out, text, ";", options)?,
            ZoneItem::Directive(directive) => {
                if let Directive::Origin(origin) = directive {
                    style.origin = Some(origin.clone());
                }
                writeln!(out, "{}", directive)?;
            }
            ZoneItem::Record(record) => {
                out.write_all(record.to_bind(&style).as_bytes())?;
                style.previous_owner = Some(record.owner.clone());
            }
        }
    }
    Ok(())
}

pub fn write_tinydns<W: Write>(out: &mut W, items: &[ZoneItem], options: &ZoneOptions) -> Result<(), OutputError> {
    for item in items {
        match item {
            ZoneItem::Verbatim(text) => write_verbatim(out, text, "#", options)?,
            ZoneItem::Directive(_) => {}
            ZoneItem::Record(record) => out.write_all(record.to_tinydns()?.as_bytes())?,
        }
    }
    Ok(())
}

pub fn write_maradns<W: Write>(out: &mut W, items: &[ZoneItem], options: &ZoneOptions) -> Result<(), OutputError> {
    for item in items {
        match item {
            ZoneItem::Verbatim(text) => write_verbatim(out, text, "#", options)?,
            ZoneItem::Directive(Directive::Ttl(ttl)) => writeln!(out, "/ttl {}", ttl)?,
            ZoneItem::Directive(Directive::Origin(origin)) => writeln!(out, "/origin {}", origin)?,
            ZoneItem::Directive(Directive::Include { .. }) => {}
            ZoneItem::Record(record) => out.write_all(record.to_maradns()?.as_bytes())?,
        }
    }
    Ok(())
}

/// One JSON object per line
pub fn write_json<W: Write>(out: &mut W, items: &[ZoneItem]) -> Result<(), OutputError> {
    for item in items {
        let line = match item {
            ZoneItem::Verbatim(_) => continue,
            ZoneItem::Directive(Directive::Ttl(ttl)) => json!({ "$TTL": ttl }).to_string(),
            ZoneItem::Directive(Directive::Origin(origin)) => json!({ "$ORIGIN": origin }).to_string(),
            ZoneItem::Directive(Directive::Include { .. }) => continue,
            ZoneItem::Record(record) => serde_json::to_string(record)?,
        };
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn rdata_text(record: &Record) -> String {
    record
        .rdata_field_names()
        .iter()
        .filter_map(|f| record.get(f))
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Aligned columns; rdata longer than the space left is cut off with `...`
pub fn write_human<W: Write>(out: &mut W, items: &[ZoneItem], options: &ZoneOptions, width: usize) -> Result<(), OutputError> {
    let records = items.iter().filter_map(|item| match item {
        ZoneItem::Record(record) => Some(record),
        _ => None,
    });

    let (mut owner_w, mut ttl_w, mut type_w) = (0, 0, 0);
    for record in records {
        owner_w = owner_w.max(record.owner.len());
        ttl_w = ttl_w.max(record.ttl.to_string().len());
        type_w = type_w.max(record.rtype().to_string().len());
    }

    let mut rdata_w = width.saturating_sub(owner_w + type_w + 10);
    if !options.hide.ttl {
        rdata_w = rdata_w.saturating_sub(ttl_w);
    }

    for item in items {
        match item {
            ZoneItem::Verbatim(text) => write_verbatim(out, text, ";", options)?,
            ZoneItem::Directive(directive) => writeln!(out, "{}", directive)?,
            ZoneItem::Record(record) => {
                write!(out, "{:<width$}", record.owner, width = owner_w + 2)?;
                if !options.hide.ttl {
                    write!(out, "{:>width$}  ", record.ttl, width = ttl_w)?;
                }
                write!(out, "{:<width$}", record.rtype().to_string(), width = type_w + 2)?;

                let rdata = rdata_text(record);
                if rdata.chars().count() > rdata_w {
                    let cut: String = rdata.chars().take(rdata_w).collect();
                    writeln!(out, "{}...", cut)?;
                } else {
                    writeln!(out, "{}", rdata)?;
                }
            }
        }
    }
    Ok(())
}
