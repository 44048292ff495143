//! Client for the VPN Gate volunteer relay network.
//!
//! Discovers publicly listed OpenVPN relays from the published server
//! list, ranks them under a configurable policy, and drives an external
//! OpenVPN process through the ranked candidates with timeout, failure
//! detection and automatic failover.
//!
//! Pipeline: [`server_list`] (fetch + parse) -> [`ranking`] ->
//! [`connection`] (supervisor, state machine, reporter), glued together by
//! [`controller`].

pub mod configuration;
pub mod connection;
pub mod controller;
pub mod error_handling;
pub mod ranking;
pub mod server_list;
