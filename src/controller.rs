//! Top-level run orchestration.

pub mod controller_handler;

pub use controller_handler::Controller;
