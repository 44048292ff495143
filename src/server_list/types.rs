//! Core types for the server list pipeline.

/// One volunteer relay as published in the VPN Gate export.
///
/// Immutable once parsed. Every record handed downstream has a non-empty
/// `ip`/`host_name` and a successfully decoded `openvpn_config`; lines
/// that fail those checks are dropped during parsing with a recorded
/// warning.
///
/// The `operator` and `message` fields are free-form text supplied by the
/// volunteer and may contain PII. They must never be logged verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRecord {
    pub host_name: String,
    pub ip: String,
    /// Volunteer-network quality metric; higher is better.
    pub score: i64,
    /// Round-trip time in milliseconds; 0 when unknown.
    pub ping: i64,
    /// Self-reported line speed in bits/sec.
    pub speed: i64,
    pub country_long: String,
    /// ISO-3166 alpha-2 code.
    pub country_short: String,
    pub num_vpn_sessions: i64,
    /// Milliseconds since the relay came online.
    pub uptime: i64,
    pub total_users: i64,
    pub total_traffic: i64,
    pub log_policy: String,
    /// Operator-supplied text. PII: keep out of logs.
    pub operator: String,
    /// Operator-supplied message. PII: keep out of logs.
    pub message: String,
    /// Decoded OpenVPN client configuration bundle (certificates, remotes,
    /// protocol), ready to be written to disk for the external process.
    pub openvpn_config: Vec<u8>,
}

impl ServerRecord {
    /// Short loggable identity: hostname, IP and country only.
    pub fn endpoint_label(&self) -> String {
        format!("{} ({}, {})", self.host_name, self.ip, self.country_short)
    }
}
