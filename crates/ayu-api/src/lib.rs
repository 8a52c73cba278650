//! ayu-api: Typed client for the Ayu intake backend
//!
//! This crate owns the wire contract with the remote intake service: the
//! turn-by-turn exchange call, speech synthesis, and appointment booking.
//! Loosely-typed wire responses are validated into closed domain types at
//! the boundary.

pub mod client;
pub mod error;
pub mod types;

pub use client::IntakeClient;
pub use error::{Error, Result};
pub use types::*;
