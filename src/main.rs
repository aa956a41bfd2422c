use clap::Parser;
use dns_zone::config::ZoneOptions;
use dns_zone::error::ConfigError;
use dns_zone::output::{OutputFormat, write_zone};
use dns_zone::util::to_seconds;
use dns_zone::zone::{Dialect, load_file};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

/// Convert DNS zone files between BIND, tinydns and MaraDNS formats
#[derive(Parser, Debug)]
#[command(name = "dns-zone", author, version, about, long_about = None)]
struct Args {
    /// Format of the input files
    #[arg(short, long = "import", value_enum)]
    import: Dialect,

    /// Output format
    #[arg(short, long = "export", value_enum, default_value = "bind")]
    export: OutputFormat,

    /// Zone origin, defaults to the file name
    #[arg(short, long)]
    origin: Option<String>,

    /// Default TTL (seconds or 1h30m style)
    #[arg(short, long)]
    ttl: Option<String>,

    /// Class for records without one
    #[arg(short, long)]
    class: Option<String>,

    /// TOML file with zone options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write names relative to the origin
    #[arg(long)]
    hide_origin: bool,

    #[arg(long)]
    hide_class: bool,

    #[arg(long)]
    hide_ttl: bool,

    /// Leave the owner blank when it repeats
    #[arg(long)]
    hide_same_owner: bool,

    /// Keep blank lines in the output
    #[arg(long)]
    show_blank: bool,

    /// Keep comment lines in the output
    #[arg(long)]
    show_comment: bool,

    /// Log what is being parsed
    #[arg(short, long)]
    verbose: bool,

    /// Zone files to read, `-` for stdin
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Args {
    /// Defaults, then the config file, then `DNS_ZONE_*` variables, then flags
    fn options(&self) -> Result<ZoneOptions, ConfigError> {
        let options = match &self.config {
            Some(path) => ZoneOptions::from_toml_file(path)?,
            None => ZoneOptions::default(),
        };
        let mut options = options.with_env()?;

        if let Some(origin) = &self.origin {
            options.set_origin(origin);
        }
        if let Some(ttl) = &self.ttl {
            options.ttl = Some(to_seconds(ttl).map_err(|_| ConfigError::InvalidTtl(ttl.clone()))?);
        }
        if let Some(class) = &self.class {
            options.class = class.parse().map_err(ConfigError::InvalidClass)?;
        }

        options.hide.origin |= self.hide_origin;
        options.hide.class |= self.hide_class;
        options.hide.ttl |= self.hide_ttl;
        options.hide.same_owner |= self.hide_same_owner;
        options.show_blank |= self.show_blank;
        options.show_comment |= self.show_comment;
        options.verbose |= self.verbose;

        options.validate()?;
        Ok(options)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "dns_zone=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = args.options()?;
    debug!("Zone options: {:?}", options);

    // one independent pipeline per file
    let handles: Vec<_> = args
        .files
        .iter()
        .cloned()
        .map(|path| {
            let options = options.clone();
            let dialect = args.import;
            tokio::task::spawn_blocking(move || {
                let loaded = load_file(&path, dialect, &options);
                (path, loaded)
            })
        })
        .collect();

    let mut failed = false;
    for handle in handles {
        let (path, loaded) = handle.await?;
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failed = true;
                continue;
            }
        };

        for skipped in &loaded.skipped {
            warn!("{}: {}", path.display(), skipped);
        }

        let mut out = std::io::stdout().lock();
        if let Err(e) = write_zone(&mut out, &loaded.items, &loaded.origin, args.export, &options) {
            error!("{}: {}", path.display(), e);
            failed = true;
        }
        out.flush()?;
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
