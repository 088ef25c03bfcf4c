// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the v2 list parser
//!
//! - Entries are returned in list order with their descriptions
//! - Invalid entries are skipped and reported, the rest still register
//! - Input with no sections is rejected as a whole

use stampsync_core::source::{parse_v2, EntryError, FormatError};
use stampsync_core::stamp::{ServerStamp, StampError, StampProperties, StampProtocol};

use super::support::{dnscrypt_stamp, list};

fn doh_stamp() -> ServerStamp {
    ServerStamp {
        protocol: StampProtocol::DoH,
        props: StampProperties(StampProperties::NO_LOG | StampProperties::NO_FILTER),
        server_addr: "[2001:db8::1]:443".to_string(),
        server_pk: Vec::new(),
        hashes: vec![vec![0xAB; 32]],
        provider_name: "doh.example.org".to_string(),
        path: "/dns-query".to_string(),
        bootstrap_ips: Vec::new(),
    }
}

#[test]
fn test_parse_published_list() {
    let text = String::from_utf8(list(1)).unwrap();
    let parsed = parse_v2("public-resolvers", "", &text).unwrap();

    assert!(parsed.is_complete());
    assert_eq!(parsed.servers.len(), 2);
    assert_eq!(parsed.servers[0].name, "example-one");
    assert_eq!(parsed.servers[0].description, "First resolver");
    assert_eq!(parsed.servers[0].stamp, dnscrypt_stamp("192.0.2.1:443"));
    assert_eq!(parsed.servers[1].name, "example-two");
    assert_eq!(parsed.servers[1].stamp, dnscrypt_stamp("192.0.2.2:443"));
}

#[test]
fn test_parse_mixed_protocols() {
    let text = format!(
        "## crypt\nDNSCrypt server\n{}\n\n## doh\nDoH server over IPv6\n{}\n",
        dnscrypt_stamp("192.0.2.3:8443"),
        doh_stamp()
    );
    let parsed = parse_v2("s", "", &text).unwrap();

    assert_eq!(parsed.servers.len(), 2);
    let doh = &parsed.servers[1].stamp;
    assert_eq!(doh.protocol, StampProtocol::DoH);
    assert_eq!(doh.server_addr, "[2001:db8::1]:443");
    assert_eq!(doh.provider_name, "doh.example.org");
    assert_eq!(doh.path, "/dns-query");
    assert!(doh.props.no_log());
    assert!(!doh.props.dnssec());
}

#[test]
fn test_invalid_stamp_is_reported() {
    let text = format!(
        "## broken\nsdns://AQ\n## good\n{}\n",
        dnscrypt_stamp("192.0.2.4:443")
    );
    let parsed = parse_v2("s", "x-", &text).unwrap();

    assert_eq!(parsed.servers.len(), 1);
    assert_eq!(parsed.servers[0].name, "x-good");
    assert_eq!(
        parsed.errors,
        [EntryError::InvalidStamp {
            name: "x-broken".to_string(),
            stamp: "sdns://AQ".to_string(),
            source: StampError::TooShort,
        }]
    );
    let message = parsed.joined_error().unwrap();
    assert!(message.contains("x-broken"));
    assert!(message.contains("sdns://AQ"));
}

#[test]
fn test_every_entry_invalid_still_parses() {
    let parsed = parse_v2("s", "", "## a\nno stamp here\n## b\nsdns://AQ\n").unwrap();

    assert!(parsed.servers.is_empty());
    assert_eq!(parsed.errors.len(), 2);
    assert!(!parsed.is_complete());
}

#[test]
fn test_text_without_sections_is_rejected() {
    let err = parse_v2("relays", "", "# Relays\n\nNothing to see.\n").unwrap_err();

    assert_eq!(
        err,
        FormatError::NoSections {
            source_name: "relays".to_string()
        }
    );
    assert!(err.to_string().contains("relays"));
}
