use crate::config::ZoneOptions;
use crate::rr::{RecordClass, TinydnsMeta};
use crate::util::fully_qualify;
use std::fmt;

/// A zone file directive (`$TTL`, `$ORIGIN`, `$INCLUDE`, `/ttl`, `/origin`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Ttl(u32),
    /// Argument as written, possibly relative
    Origin(String),
    Include {
        path: String,
        origin: Option<String>,
    },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Ttl(ttl) => write!(f, "$TTL {}", ttl),
            Directive::Origin(origin) => write!(f, "$ORIGIN {}", origin),
            Directive::Include {
                path,
                origin: Some(origin),
            } => write!(f, "$INCLUDE {} {}", path, origin),
            Directive::Include { path, origin: None } => write!(f, "$INCLUDE {}", path),
        }
    }
}

/// A record line split into its slots, before defaults are applied.
///
/// `owner`, `ttl` and `class` are `None` when the line left them out.
/// `rdata` holds the remaining tokens with quoting removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub owner: Option<String>,
    pub ttl: Option<u32>,
    pub class: Option<RecordClass>,
    pub rtype: String,
    pub rdata: Vec<String>,
    /// First physical line of the record
    pub line: usize,
    /// The logical line as read, for error reports
    pub text: String,
    pub tinydns: TinydnsMeta,
}

impl PendingRecord {
    pub fn new(rtype: impl Into<String>, rdata: Vec<String>, line: usize, text: impl Into<String>) -> Self {
        Self {
            owner: None,
            ttl: None,
            class: None,
            rtype: rtype.into(),
            rdata,
            line,
            text: text.into(),
            tinydns: TinydnsMeta::default(),
        }
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn ttl(mut self, ttl: Option<u32>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn tinydns(mut self, meta: TinydnsMeta) -> Self {
        self.tinydns = meta;
        self
    }
}

/// One parsed unit of zone text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directive {
        directive: Directive,
        line: usize,
        comment: Option<String>,
    },
    Record(PendingRecord),
    /// Blank line (empty string) or comment line, kept for layout
    Verbatim(String),
}

/// Running context of one parse. Never shared between zone files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    /// Current default TTL
    pub ttl: Option<u32>,
    /// Current `$ORIGIN`
    pub origin: Option<String>,
    /// Zone root from the file name or options, set once
    pub implicit_origin: Option<String>,
    /// Owner of the last record, for blank-owner continuation
    pub previous_owner: Option<String>,
}

impl ParseState {
    pub fn new(options: &ZoneOptions) -> Self {
        let mut state = Self {
            ttl: options.ttl,
            ..Default::default()
        };
        if let Some(origin) = &options.origin {
            state.set_implicit_origin(origin);
        }
        state
    }

    /// Seeds both origins the first time it is called; later calls are
    /// ignored.
    pub fn set_implicit_origin(&mut self, origin: &str) {
        if self.implicit_origin.is_some() {
            return;
        }
        let origin = fully_qualify(origin, None);
        self.origin = Some(origin.clone());
        self.implicit_origin = Some(origin);
    }

    /// Apply an `$ORIGIN` argument. Relative names are taken relative to
    /// the implicit origin.
    pub fn change_origin(&mut self, origin: &str) -> String {
        let origin = fully_qualify(origin, self.implicit_origin.as_deref());
        self.origin = Some(origin.clone());
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_origin_set_once() {
        let mut state = ParseState::default();
        state.set_implicit_origin("Example.com");
        state.set_implicit_origin("other.net.");
        assert_eq!(state.implicit_origin.as_deref(), Some("example.com."));
        assert_eq!(state.origin.as_deref(), Some("example.com."));
    }

    #[test]
    fn test_relative_origin_change() {
        let mut state = ParseState::default();
        state.set_implicit_origin("example.com.");
        assert_eq!(state.change_origin("sub"), "sub.example.com.");
        assert_eq!(state.change_origin("other.org."), "other.org.");
        assert_eq!(state.implicit_origin.as_deref(), Some("example.com."));
    }

    #[test]
    fn test_state_from_options() {
        let options = ZoneOptions {
            ttl: Some(300),
            origin: Some("example.com.".to_string()),
            ..Default::default()
        };
        let state = ParseState::new(&options);
        assert_eq!(state.ttl, Some(300));
        assert_eq!(state.origin.as_deref(), Some("example.com."));
        assert_eq!(state.previous_owner, None);
    }

    #[test]
    fn test_directive_display() {
        assert_eq!(Directive::Ttl(3600).to_string(), "$TTL 3600");
        assert_eq!(
            Directive::Include {
                path: "hosts.db".to_string(),
                origin: Some("lab.example.com.".to_string())
            }
            .to_string(),
            "$INCLUDE hosts.db lab.example.com."
        );
    }
}
