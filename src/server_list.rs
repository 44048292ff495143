//! Server list discovery pipeline.
//!
//! Fetches the published VPN Gate export and parses it into structured
//! [`ServerRecord`]s, decoding each record's embedded OpenVPN config blob.
//!
//! Re-exports:
//! - [`ListFetcher`]: one-shot HTTP download of the raw list.
//! - [`parser::parse`]: line-oriented CSV parsing with per-record warnings.
//! - [`ServerRecord`]: the parsed relay entity.

pub mod fetcher;
pub mod parser;
pub mod types;

pub use fetcher::{ListFetcher, DEFAULT_LIST_URL};
pub use types::ServerRecord;
