pub mod config;
pub mod error;
pub mod output;
pub mod rr;
pub mod util;
pub mod zone;

pub use config::ZoneOptions;
pub use error::{LoadError, RecordConstructionFailed, RecordError, ZoneError};
pub use output::{OutputFormat, write_zone};
pub use rr::{Rdata, Record, RecordClass, RecordType, ResourceRecord};
pub use zone::{Dialect, LoadedZone, Zone, load_file, parse_zone};
