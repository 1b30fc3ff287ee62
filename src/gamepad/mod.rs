//! Physical controller subsystem: a gilrs-backed poll loop that turns
//! backend events into the shared raw event vocabulary, including
//! connect and disconnect notifications the arbitrator reacts to.

pub mod collector;

pub use collector::{CollectorError, CollectorHandle, CollectorSettings};
