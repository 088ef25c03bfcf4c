// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for source and transport configuration

use std::path::PathBuf;
use std::time::Duration;

use stampsync_core::source::{
    HttpTransport, SourceConfig, TransportConfig, DEFAULT_PREFETCH_DELAY, DEFAULT_TIMEOUT,
    MAX_BODY_SIZE,
};

#[test]
fn test_source_config_defaults() {
    let config = SourceConfig::default();

    assert_eq!(config.format, "v2");
    assert_eq!(config.refresh_delay, DEFAULT_PREFETCH_DELAY);
    assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    assert_eq!(config.max_body_size, MAX_BODY_SIZE);
    assert!(config.urls.is_empty());
}

#[test]
fn test_source_config_from_json() {
    let json = r#"{
        "name": "public-resolvers",
        "urls": [
            "https://a.example.org/public-resolvers.md",
            "https://b.example.org/public-resolvers.md"
        ],
        "minisign_key": "RWQf6LRCGA9i53mlYecO4IzT51TGPpvWucNSCh1CBM0QTaLn73Y7GFO3",
        "cache_file": "/var/cache/stampsync/public-resolvers.md",
        "refresh_delay": 259200
    }"#;
    let config: SourceConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.name, "public-resolvers");
    assert_eq!(config.urls.len(), 2);
    assert_eq!(
        config.cache_file,
        PathBuf::from("/var/cache/stampsync/public-resolvers.md")
    );
    assert_eq!(config.refresh_delay, Duration::from_secs(72 * 3600));
    // Omitted fields fall back to defaults
    assert_eq!(config.format, "v2");
    assert_eq!(config.timeout, DEFAULT_TIMEOUT);
}

#[test]
fn test_source_config_builder() {
    let config = SourceConfig::new("relays", "RWQ...", "/tmp/relays.md")
        .with_url("https://a.example.org/relays.md")
        .with_refresh_delay(Duration::from_secs(3600));

    assert_eq!(config.name, "relays");
    assert_eq!(config.urls, ["https://a.example.org/relays.md"]);
    assert_eq!(config.refresh_delay, Duration::from_secs(3600));
}

#[test]
fn test_transport_config_with_tor() {
    let config = TransportConfig::default().with_tor();

    assert_eq!(config.proxy_url.as_deref(), Some("socks5h://127.0.0.1:9050"));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert!(HttpTransport::new(&config).is_ok());
}

#[test]
fn test_transport_config_with_proxy() {
    let config = TransportConfig::default().with_proxy("http://proxy.local:3128".to_string());

    assert_eq!(config.proxy_url.as_deref(), Some("http://proxy.local:3128"));
    assert!(config.user_agent.starts_with("stampsync/"));
    assert!(HttpTransport::new(&config).is_ok());
}
