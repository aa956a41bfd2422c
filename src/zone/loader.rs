//! Parse, expand and ingest zone text.

use super::Dialect;
use super::constants::{MAX_INCLUDE_DEPTH, MAX_ZONE_FILE_SIZE};
use super::entry::{Directive, Entry, ParseState};
use super::expand::{ZoneItem, expand};
use super::zone::Zone;
use super::{bind, maradns, tinydns};
use crate::config::ZoneOptions;
use crate::error::{LoadError, RecordConstructionFailed, Result, ZoneError};
use crate::rr::{RecordType, ResourceRecord};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A validated zone together with everything needed to render it again
#[derive(Debug)]
pub struct LoadedZone {
    /// Origin the zone was built for
    pub origin: String,
    pub zone: Zone,
    /// Records, directives and layout lines in source order
    pub items: Vec<ZoneItem>,
    /// Records dropped during expansion
    pub skipped: Vec<RecordConstructionFailed>,
}

impl LoadedZone {
    pub fn records(&self) -> impl Iterator<Item = &crate::rr::Record> {
        self.items.iter().filter_map(|item| match item {
            ZoneItem::Record(record) => Some(record),
            _ => None,
        })
    }
}

fn parse_entries(text: &str, dialect: Dialect, state: &ParseState, options: &ZoneOptions) -> Result<Vec<Entry>> {
    match dialect {
        Dialect::Bind => bind::parse(text),
        Dialect::Tinydns => tinydns::parse(text, options),
        Dialect::Maradns => maradns::parse(text, state),
    }
}

/// Run zone text through the whole pipeline. `$INCLUDE` directives are
/// not followed; use [`load_file`] for that.
pub fn parse_zone(text: &str, dialect: Dialect, options: &ZoneOptions) -> Result<LoadedZone> {
    let state = ParseState::new(options);
    let entries = parse_entries(text, dialect, &state, options)?;
    ingest(entries, state, options)
}

/// Read a zone file (`-` for stdin), following `$INCLUDE`. Without a
/// configured origin the file name is used, except for tinydns data
/// where every name is absolute.
pub fn load_file(path: impl AsRef<Path>, dialect: Dialect, options: &ZoneOptions) -> std::result::Result<LoadedZone, LoadError> {
    let path = path.as_ref();
    let mut options = options.clone();

    if options.origin.is_none() && dialect != Dialect::Tinydns && !is_stdin(path) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            debug!("Using file name {} as zone origin", name);
            options.set_origin(name);
        }
    }

    info!("Loading {} zone from {}", dialect, path.display());
    let state = ParseState::new(&options);
    let entries = read_entries(path, dialect, &state, &options, 0)?;
    Ok(ingest(entries, state, &options)?)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_source(path: &Path) -> std::result::Result<String, LoadError> {
    let display = path.display().to_string();

    if is_stdin(path) {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| LoadError::io(display, e))?;
        return Ok(text);
    }

    let metadata = std::fs::metadata(path).map_err(|e| LoadError::io(display.clone(), e))?;
    if metadata.len() > MAX_ZONE_FILE_SIZE as u64 {
        return Err(LoadError::io(
            display,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("zone file larger than {} bytes", MAX_ZONE_FILE_SIZE),
            ),
        ));
    }
    std::fs::read_to_string(path).map_err(|e| LoadError::io(display, e))
}

/// Parse one file and splice the entries of every file it includes in
/// place of the `$INCLUDE` line.
fn read_entries(
    path: &Path,
    dialect: Dialect,
    state: &ParseState,
    options: &ZoneOptions,
    depth: usize,
) -> std::result::Result<Vec<Entry>, LoadError> {
    let text = read_source(path)?;
    let parsed = parse_entries(&text, dialect, state, options)?;

    let base = if is_stdin(path) {
        PathBuf::from(".")
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let mut entries = Vec::with_capacity(parsed.len());
    let mut current_origin: Option<String> = None;

    for entry in parsed {
        if let Entry::Directive {
            directive: Directive::Origin(origin),
            ..
        } = &entry
        {
            current_origin = Some(origin.clone());
        }

        let (include_path, include_origin, line) = match entry {
            Entry::Directive {
                directive: Directive::Include { path, origin },
                line,
                ..
            } => (path, origin, line),
            other => {
                entries.push(other);
                continue;
            }
        };

        if depth + 1 > MAX_INCLUDE_DEPTH {
            return Err(LoadError::IncludeDepth(MAX_INCLUDE_DEPTH));
        }

        let include = base.join(&include_path);
        debug!("Including {} at line {}", include.display(), line);
        let included = read_entries(&include, dialect, state, options, depth + 1)?;

        let changes_origin = included.iter().any(|e| {
            matches!(
                e,
                Entry::Directive {
                    directive: Directive::Origin(_),
                    ..
                }
            )
        });

        if let Some(origin) = include_origin.as_ref() {
            entries.push(origin_entry(origin, line));
        }
        entries.extend(included);

        if include_origin.is_some() || changes_origin {
            // back to the origin in effect before the include
            match current_origin.as_deref() {
                Some(origin) => entries.push(origin_entry(origin, line)),
                None if state.implicit_origin.is_some() => entries.push(origin_entry("@", line)),
                None => {}
            }
        }
    }

    Ok(entries)
}

fn origin_entry(origin: &str, line: usize) -> Entry {
    Entry::Directive {
        directive: Directive::Origin(origin.to_string()),
        line,
        comment: None,
    }
}

/// Without an origin from the caller, a zone whose first SOA has an
/// absolute owner is rooted there. An `$ORIGIN` seen first wins.
fn seed_origin(entries: &[Entry], state: &mut ParseState) {
    if state.origin.is_some() {
        return;
    }
    for entry in entries {
        match entry {
            Entry::Directive {
                directive: Directive::Origin(_),
                ..
            } => return,
            Entry::Record(record) if record.rtype.eq_ignore_ascii_case("SOA") => {
                if let Some(owner) = record.owner.as_deref().filter(|o| o.ends_with('.')) {
                    debug!("Using SOA owner {} as zone origin", owner);
                    state.set_implicit_origin(owner);
                }
                return;
            }
            _ => {}
        }
    }
}

fn ingest(entries: Vec<Entry>, mut state: ParseState, options: &ZoneOptions) -> Result<LoadedZone> {
    seed_origin(&entries, &mut state);
    let expanded = expand(entries, &mut state, options)?;

    let origin = state
        .implicit_origin
        .clone()
        .or_else(|| {
            expanded.items.iter().find_map(|item| match item {
                ZoneItem::Directive(Directive::Origin(origin)) => Some(origin.clone()),
                _ => None,
            })
        })
        .or_else(|| {
            expanded.items.iter().find_map(|item| match item {
                ZoneItem::Record(r) if r.rtype() == RecordType::SOA => Some(r.owner.clone()),
                _ => None,
            })
        })
        .ok_or(ZoneError::MissingOrigin)?;

    let mut zone = Zone::new(&origin, options.ttl)?;

    let is_soa = |item: &ZoneItem| matches!(item, ZoneItem::Record(r) if r.rtype() == RecordType::SOA);
    for item in expanded.items.iter().filter(|i| is_soa(i)) {
        zone.add(item)?;
    }
    for item in expanded.items.iter().filter(|i| !is_soa(i)) {
        zone.add(item)?;
    }
    zone.validate()?;

    let stats = zone.stats();
    info!(
        "Loaded zone {} with {} records ({} owners), {} skipped",
        origin,
        stats.total_records,
        stats.owners,
        expanded.skipped.len()
    );

    Ok(LoadedZone {
        origin,
        zone,
        items: expanded.items,
        skipped: expanded.skipped,
    })
}
