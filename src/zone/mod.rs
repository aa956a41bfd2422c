pub mod bind;
pub mod entry;
pub mod expand;
pub mod loader;
pub mod maradns;
pub mod tinydns;
#[allow(clippy::module_inception)]
pub mod zone;

pub use entry::{Directive, Entry, ParseState, PendingRecord};
pub use expand::{Expanded, ZoneItem, expand};
pub use loader::{LoadedZone, load_file, parse_zone};
pub use zone::{Zone, ZoneStats};

use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Zone constants
pub mod constants {
    /// Maximum `$INCLUDE` nesting
    pub const MAX_INCLUDE_DEPTH: usize = 16;

    /// Maximum zone file size (10MB)
    pub const MAX_ZONE_FILE_SIZE: usize = 10 * 1024 * 1024;
}

/// Zone file syntaxes that can be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    /// RFC 1035 master file
    Bind,
    /// djbdns tinydns-data
    Tinydns,
    /// MaraDNS csv2
    Maradns,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Bind => "bind",
            Dialect::Tinydns => "tinydns",
            Dialect::Maradns => "maradns",
        })
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bind" => Ok(Dialect::Bind),
            "tinydns" => Ok(Dialect::Tinydns),
            "maradns" => Ok(Dialect::Maradns),
            other => Err(format!("unknown zone dialect: {}", other)),
        }
    }
}
