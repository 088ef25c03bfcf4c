// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! DNS stamps
//!
//! A stamp is a compact `sdns://` string describing how to reach a
//! resolver: protocol, properties, address, keys or certificate hashes,
//! and protocol-specific names. This module decodes and validates stamps
//! and re-encodes them; it does not interpret them any further.
//!
//! Layout after the URL-safe unpadded base64 payload is decoded:
//!
//! ```text
//! protocol(1) [props(8, LE)] fields...
//! LP(x)  = len(1) || x
//! VLP(x) = len(1) | 0x80 if more follow || x, repeated
//! ```

use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

const STAMP_SCHEME: &str = "sdns:";
const DNSCRYPT_PUBLIC_KEY_LEN: usize = 32;
const HASH_LEN: usize = 32;
const VLP_MORE: u8 = 0x80;

/// Transport protocol of a stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StampProtocol {
    /// Plain DNS over UDP/TCP
    Plain,
    /// DNSCrypt
    DnsCrypt,
    /// DNS-over-HTTPS
    DoH,
    /// DNS-over-TLS
    Tls,
    /// DNS-over-QUIC
    DoQ,
    /// Oblivious DoH target
    ODoHTarget,
    /// Anonymized DNSCrypt relay
    DnsCryptRelay,
    /// Oblivious DoH relay
    ODoHRelay,
}

impl StampProtocol {
    /// Wire identifier
    pub fn id(self) -> u8 {
        match self {
            StampProtocol::Plain => 0x00,
            StampProtocol::DnsCrypt => 0x01,
            StampProtocol::DoH => 0x02,
            StampProtocol::Tls => 0x03,
            StampProtocol::DoQ => 0x04,
            StampProtocol::ODoHTarget => 0x05,
            StampProtocol::DnsCryptRelay => 0x81,
            StampProtocol::ODoHRelay => 0x85,
        }
    }

    /// Port assumed when an address does not carry one
    pub fn default_port(self) -> u16 {
        match self {
            StampProtocol::Plain => 53,
            StampProtocol::Tls | StampProtocol::DoQ => 853,
            _ => 443,
        }
    }

    fn from_id(id: u8) -> Result<Self, StampError> {
        Ok(match id {
            0x00 => StampProtocol::Plain,
            0x01 => StampProtocol::DnsCrypt,
            0x02 => StampProtocol::DoH,
            0x03 => StampProtocol::Tls,
            0x04 => StampProtocol::DoQ,
            0x05 => StampProtocol::ODoHTarget,
            0x81 => StampProtocol::DnsCryptRelay,
            0x85 => StampProtocol::ODoHRelay,
            other => return Err(StampError::UnsupportedProtocol(other)),
        })
    }
}

impl std::fmt::Display for StampProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StampProtocol::Plain => "Plain",
            StampProtocol::DnsCrypt => "DNSCrypt",
            StampProtocol::DoH => "DoH",
            StampProtocol::Tls => "DoT",
            StampProtocol::DoQ => "DoQ",
            StampProtocol::ODoHTarget => "ODoH target",
            StampProtocol::DnsCryptRelay => "Anonymized DNSCrypt relay",
            StampProtocol::ODoHRelay => "ODoH relay",
        };
        f.write_str(name)
    }
}

/// Informational properties advertised by a resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StampProperties(pub u64);

impl StampProperties {
    /// Resolver validates DNSSEC
    pub const DNSSEC: u64 = 1;
    /// Resolver does not keep logs
    pub const NO_LOG: u64 = 1 << 1;
    /// Resolver does not filter responses
    pub const NO_FILTER: u64 = 1 << 2;

    /// Whether DNSSEC validation is advertised
    pub fn dnssec(self) -> bool {
        self.0 & Self::DNSSEC != 0
    }

    /// Whether a no-logs policy is advertised
    pub fn no_log(self) -> bool {
        self.0 & Self::NO_LOG != 0
    }

    /// Whether unfiltered responses are advertised
    pub fn no_filter(self) -> bool {
        self.0 & Self::NO_FILTER != 0
    }
}

/// Decoded and validated DNS stamp
///
/// Fields a protocol does not use stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerStamp {
    /// Transport protocol
    pub protocol: StampProtocol,
    /// Advertised properties (always empty for DNSCrypt relays)
    pub props: StampProperties,
    /// `host:port` address; may be empty for DoH and DoT
    pub server_addr: String,
    /// DNSCrypt provider public key
    pub server_pk: Vec<u8>,
    /// SHA-256 hashes of certificates in the TLS chain
    pub hashes: Vec<Vec<u8>>,
    /// DNSCrypt provider name, or TLS host name
    pub provider_name: String,
    /// HTTP path for DoH and ODoH
    pub path: String,
    /// Bootstrap resolver addresses
    pub bootstrap_ips: Vec<String>,
}

impl ServerStamp {
    fn empty(protocol: StampProtocol) -> Self {
        Self {
            protocol,
            props: StampProperties::default(),
            server_addr: String::new(),
            server_pk: Vec::new(),
            hashes: Vec::new(),
            provider_name: String::new(),
            path: String::new(),
            bootstrap_ips: Vec::new(),
        }
    }

    fn decode(bin: &[u8]) -> Result<Self, StampError> {
        let mut reader = Reader::new(bin);
        let protocol = StampProtocol::from_id(reader.byte()?)?;
        let mut stamp = Self::empty(protocol);

        if protocol != StampProtocol::DnsCryptRelay {
            stamp.props = StampProperties(reader.props()?);
        }

        match protocol {
            StampProtocol::Plain | StampProtocol::DnsCryptRelay => {
                stamp.server_addr = reader.addr(protocol)?;
            }
            StampProtocol::DnsCrypt => {
                stamp.server_addr = reader.addr(protocol)?;
                stamp.server_pk = reader.lp()?.to_vec();
                if stamp.server_pk.len() != DNSCRYPT_PUBLIC_KEY_LEN {
                    return Err(StampError::InvalidPublicKeyLength(stamp.server_pk.len()));
                }
                stamp.provider_name = reader.lp_string()?;
            }
            StampProtocol::DoH | StampProtocol::ODoHRelay => {
                stamp.server_addr = reader.addr(protocol)?;
                stamp.hashes = reader.hashes()?;
                stamp.provider_name = reader.lp_string()?;
                stamp.path = reader.lp_string()?;
                stamp.bootstrap_ips = reader.bootstrap_ips()?;
            }
            StampProtocol::Tls | StampProtocol::DoQ => {
                stamp.server_addr = reader.addr(protocol)?;
                stamp.hashes = reader.hashes()?;
                stamp.provider_name = reader.lp_string()?;
                stamp.bootstrap_ips = reader.bootstrap_ips()?;
            }
            StampProtocol::ODoHTarget => {
                stamp.provider_name = reader.lp_string()?;
                stamp.path = reader.lp_string()?;
            }
        }

        reader.finish()?;
        Ok(stamp)
    }

    fn encode(&self) -> Vec<u8> {
        let mut bin = vec![self.protocol.id()];
        if self.protocol != StampProtocol::DnsCryptRelay {
            bin.extend_from_slice(&self.props.0.to_le_bytes());
        }

        let addr = strip_default_port(&self.server_addr, self.protocol.default_port());
        match self.protocol {
            StampProtocol::Plain | StampProtocol::DnsCryptRelay => push_lp(&mut bin, addr.as_bytes()),
            StampProtocol::DnsCrypt => {
                push_lp(&mut bin, addr.as_bytes());
                push_lp(&mut bin, &self.server_pk);
                push_lp(&mut bin, self.provider_name.as_bytes());
            }
            StampProtocol::DoH | StampProtocol::ODoHRelay => {
                push_lp(&mut bin, addr.as_bytes());
                push_vlp(&mut bin, self.hashes.iter().map(Vec::as_slice));
                push_lp(&mut bin, self.provider_name.as_bytes());
                push_lp(&mut bin, self.path.as_bytes());
                if !self.bootstrap_ips.is_empty() {
                    push_vlp(&mut bin, self.bootstrap_ips.iter().map(String::as_bytes));
                }
            }
            StampProtocol::Tls | StampProtocol::DoQ => {
                push_lp(&mut bin, addr.as_bytes());
                push_vlp(&mut bin, self.hashes.iter().map(Vec::as_slice));
                push_lp(&mut bin, self.provider_name.as_bytes());
                if !self.bootstrap_ips.is_empty() {
                    push_vlp(&mut bin, self.bootstrap_ips.iter().map(String::as_bytes));
                }
            }
            StampProtocol::ODoHTarget => {
                push_lp(&mut bin, self.provider_name.as_bytes());
                push_lp(&mut bin, self.path.as_bytes());
            }
        }
        bin
    }
}

impl FromStr for ServerStamp {
    type Err = StampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = s
            .strip_prefix(STAMP_SCHEME)
            .ok_or(StampError::MissingScheme)?;
        let payload = payload.strip_prefix("//").unwrap_or(payload);
        let bin = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| StampError::InvalidEncoding)?;
        if bin.is_empty() {
            return Err(StampError::TooShort);
        }
        Self::decode(&bin)
    }
}

impl std::fmt::Display for ServerStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{STAMP_SCHEME}//{}", URL_SAFE_NO_PAD.encode(self.encode()))
    }
}

struct Reader<'a> {
    bin: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bin: &'a [u8]) -> Self {
        Self { bin, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], StampError> {
        let end = self.pos.checked_add(len).ok_or(StampError::TooShort)?;
        let slice = self.bin.get(self.pos..end).ok_or(StampError::TooShort)?;
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, StampError> {
        Ok(self.take(1)?[0])
    }

    fn props(&mut self) -> Result<u64, StampError> {
        let mut le = [0u8; 8];
        le.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(le))
    }

    fn lp(&mut self) -> Result<&'a [u8], StampError> {
        let len = self.byte()? as usize;
        self.take(len)
    }

    fn lp_string(&mut self) -> Result<String, StampError> {
        utf8(self.lp()?)
    }

    fn addr(&mut self, protocol: StampProtocol) -> Result<String, StampError> {
        let addr = self.lp_string()?;
        Ok(with_default_port(addr, protocol.default_port()))
    }

    fn vlp(&mut self) -> Result<Vec<&'a [u8]>, StampError> {
        let mut items = Vec::new();
        loop {
            let vlen = self.byte()?;
            let item = self.take((vlen & !VLP_MORE) as usize)?;
            if !item.is_empty() {
                items.push(item);
            }
            if vlen & VLP_MORE == 0 {
                return Ok(items);
            }
        }
    }

    fn hashes(&mut self) -> Result<Vec<Vec<u8>>, StampError> {
        self.vlp()?
            .into_iter()
            .map(|hash| {
                if hash.len() == HASH_LEN {
                    Ok(hash.to_vec())
                } else {
                    Err(StampError::InvalidHashLength(hash.len()))
                }
            })
            .collect()
    }

    fn bootstrap_ips(&mut self) -> Result<Vec<String>, StampError> {
        if self.pos == self.bin.len() {
            return Ok(Vec::new());
        }
        self.vlp()?.into_iter().map(utf8).collect()
    }

    fn finish(self) -> Result<(), StampError> {
        if self.pos == self.bin.len() {
            Ok(())
        } else {
            Err(StampError::TrailingGarbage)
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<String, StampError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| StampError::InvalidUtf8)
}

fn push_lp(bin: &mut Vec<u8>, item: &[u8]) {
    bin.push(item.len() as u8);
    bin.extend_from_slice(item);
}

fn push_vlp<'a>(bin: &mut Vec<u8>, items: impl ExactSizeIterator<Item = &'a [u8]>) {
    let count = items.len();
    if count == 0 {
        bin.push(0);
        return;
    }
    for (i, item) in items.enumerate() {
        let more = if i + 1 < count { VLP_MORE } else { 0 };
        bin.push(item.len() as u8 | more);
        bin.extend_from_slice(item);
    }
}

fn has_port(addr: &str) -> bool {
    match addr.strip_prefix('[') {
        Some(rest) => rest.contains("]:"),
        None => addr.matches(':').count() == 1,
    }
}

fn with_default_port(addr: String, port: u16) -> String {
    if addr.is_empty() || has_port(&addr) {
        addr
    } else if addr.contains(':') && !addr.starts_with('[') {
        format!("[{addr}]:{port}")
    } else {
        format!("{addr}:{port}")
    }
}

fn strip_default_port(addr: &str, port: u16) -> &str {
    addr.strip_suffix(&format!(":{port}")).unwrap_or(addr)
}

/// Errors that can occur while decoding a stamp
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    /// String does not start with `sdns:`
    #[error("stamp must start with \"sdns:\"")]
    MissingScheme,

    /// Payload is not URL-safe base64
    #[error("stamp is not valid base64")]
    InvalidEncoding,

    /// Payload ends before all fields were read
    #[error("stamp is too short")]
    TooShort,

    /// Bytes remain after the last field
    #[error("garbage after end of stamp")]
    TrailingGarbage,

    /// Unknown protocol identifier
    #[error("unsupported stamp protocol: {0:#04x}")]
    UnsupportedProtocol(u8),

    /// DNSCrypt key is not 32 bytes
    #[error("invalid DNSCrypt public key length: {0}")]
    InvalidPublicKeyLength(usize),

    /// Certificate hash is not a SHA-256 digest
    #[error("invalid certificate hash length: {0}")]
    InvalidHashLength(usize),

    /// A text field is not UTF-8
    #[error("stamp field is not valid UTF-8")]
    InvalidUtf8,
}
