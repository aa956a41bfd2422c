use dns_zone::config::ZoneOptions;
use dns_zone::output::{OutputFormat, write_zone};
use dns_zone::rr::{Rdata, RecordType, ResourceRecord};
use dns_zone::zone::{Dialect, parse_zone};
use dns_zone::ZoneError;

const EXAMPLE_ZONE: &str = r#"
$ORIGIN example.com.
$TTL 3600

@   IN  SOA ns1.example.com. admin.example.com. (
            2024010101 ; serial
            3600       ; refresh
            900        ; retry
            604800     ; expire
            86400 )    ; minimum

@   IN  NS  ns1.example.com.
@   IN  NS  ns2.example.com.

@       IN  A   192.0.2.1
www     IN  A   192.0.2.2
mail    IN  A   192.0.2.3
ftp     IN  CNAME www
@       IN  MX  10 mail
@       IN  TXT "v=spf1 mx -all"
_sip._tcp   IN  SRV 10 60 5060 sip
"#;

fn options() -> ZoneOptions {
    ZoneOptions::default()
}

#[test]
fn test_simple_zone_parsing() {
    let loaded = parse_zone(EXAMPLE_ZONE, Dialect::Bind, &options()).unwrap();

    assert_eq!(loaded.origin, "example.com.");
    assert_eq!(loaded.zone.default_ttl, Some(3600));
    assert!(loaded.skipped.is_empty());

    let stats = loaded.zone.stats();
    assert_eq!(stats.soa_records, 1);
    assert_eq!(stats.ns_records, 2);
    assert_eq!(stats.a_records, 3);
    assert_eq!(stats.cname_records, 1);
    assert_eq!(stats.mx_records, 1);
    assert_eq!(stats.txt_records, 1);
    assert_eq!(stats.other_records, 1);
}

#[test]
fn test_names_are_qualified() {
    let loaded = parse_zone(EXAMPLE_ZONE, Dialect::Bind, &options()).unwrap();
    let zone = &loaded.zone;

    let ftp = zone.owner_matches("ftp.example.com.");
    assert_eq!(ftp[0].rdata, Rdata::Cname { cname: "www.example.com.".to_string() });

    let mx = zone
        .owner_matches("example.com.")
        .into_iter()
        .find(|r| r.rtype() == RecordType::MX)
        .unwrap();
    assert_eq!(mx.get("exchange").unwrap().to_string(), "mail.example.com.");

    let srv = zone.owner_matches("_sip._tcp.example.com.");
    assert_eq!(srv[0].get("target").unwrap().to_string(), "sip.example.com.");
}

#[test]
fn test_single_line_soa_end_to_end() {
    let text = "example.com. 86400 IN SOA ns1.example.com. hostmaster.example.com. 2021102100 16384 2048 604800 2560\nexample.com. 86400 IN NS ns1.example.com.\n";
    let loaded = parse_zone(text, Dialect::Bind, &options()).unwrap();

    let soa = loaded.zone.soa_data().unwrap();
    assert_eq!(soa.mname, "ns1.example.com.");
    assert_eq!(soa.rname, "hostmaster.example.com.");
    assert_eq!(soa.serial, 2021102100);
    assert_eq!(loaded.zone.stats().soa_records, 1);
}

#[test]
fn test_duplicate_record_in_text() {
    let text = "$ORIGIN example.com.\n@ SOA ns1 hm 1 2 3 4 5\n@ NS ns1\n@ NS ns1\n";
    let err = parse_zone(text, Dialect::Bind, &options()).unwrap_err();
    assert!(matches!(err, ZoneError::DuplicateRecord { .. }));
}

#[test]
fn test_malformed_record_is_skipped() {
    let text = "$ORIGIN example.com.\n@ SOA ns1 hm 1 2 3 4 5\n@ NS ns1\nbad MX ten mail\ngood A 192.0.2.10\n";
    let loaded = parse_zone(text, Dialect::Bind, &options()).unwrap();
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].line, 4);
    assert_eq!(loaded.zone.owner_matches("good.example.com.").len(), 1);
}

#[test]
fn test_unrecognized_line_is_fatal() {
    let text = "$ORIGIN example.com.\n@ SOA ns1 hm 1 2 3 4 5\nwww IN\n";
    let err = parse_zone(text, Dialect::Bind, &options()).unwrap_err();
    assert!(matches!(err, ZoneError::UnrecognizedLine { line: 3, .. }));
}

#[test]
fn test_oversized_ttl_is_an_error() {
    let text = "$ORIGIN example.com.\n@ SOA ns1 hm 1 2 3 4 5\n@ NS ns1\nwww 99999999999999999w A 192.0.2.1\n";
    let err = parse_zone(text, Dialect::Bind, &options()).unwrap_err();
    assert_eq!(err, ZoneError::InvalidTtl("99999999999999999w".to_string()));

    let text = "$TTL 99999999999999999w\n";
    assert!(matches!(
        parse_zone(text, Dialect::Bind, &options()),
        Err(ZoneError::InvalidTtl(_))
    ));
}

#[test]
fn test_decimal_escapes_in_text() {
    let text = "$ORIGIN example.com.\n@ SOA ns1 hm 1 2 3 4 5\n@ NS ns1\n@ TXT \"\\065\\066C\" \"a\\059b\"\n";
    let loaded = parse_zone(text, Dialect::Bind, &options()).unwrap();
    let txt = loaded.records().find(|r| r.rtype() == RecordType::TXT).unwrap();
    assert_eq!(
        txt.rdata,
        Rdata::Txt {
            data: vec!["ABC".to_string(), "a;b".to_string()]
        }
    );
}

#[test]
fn test_generic_rdata() {
    let text = "$ORIGIN example.com.\n@ SOA ns1 hm 1 2 3 4 5\n@ NS ns1\nh TYPE1 \\# 4 C0000201\n";
    let loaded = parse_zone(text, Dialect::Bind, &options()).unwrap();
    let h = loaded.zone.owner_matches("h.example.com.");
    assert_eq!(h[0].rtype(), RecordType::A);
    assert_eq!(h[0].get("address").unwrap().to_string(), "192.0.2.1");
}

#[test]
fn test_bind_round_trip() {
    let first = parse_zone(EXAMPLE_ZONE, Dialect::Bind, &options()).unwrap();

    let mut out = Vec::new();
    write_zone(&mut out, &first.items, &first.origin, OutputFormat::Bind, &options()).unwrap();
    let text = String::from_utf8(out).unwrap();

    let second = parse_zone(&text, Dialect::Bind, &options()).unwrap();
    let a: Vec<_> = first.zone.records().collect();
    let b: Vec<_> = second.zone.records().collect();
    assert_eq!(a, b);
}

#[test]
fn test_bind_round_trip_relative() {
    let first = parse_zone(EXAMPLE_ZONE, Dialect::Bind, &options()).unwrap();

    let mut render_options = options();
    render_options.hide.origin = true;
    render_options.hide.same_owner = true;
    render_options.hide.class = true;

    let mut out = Vec::new();
    write_zone(&mut out, &first.items, &first.origin, OutputFormat::Bind, &render_options).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("www\t3600\tA\t192.0.2.2"));

    let second = parse_zone(&text, Dialect::Bind, &options()).unwrap();
    let a: Vec<_> = first.zone.records().collect();
    let b: Vec<_> = second.zone.records().collect();
    assert_eq!(a, b);
}
