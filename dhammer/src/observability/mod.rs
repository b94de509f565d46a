//! Structured logging vocabulary.
//!
//! The crate logs through `tracing`. Library code emits events and never installs a
//! global subscriber; binaries and tests own subscriber initialization.

pub mod events;
pub mod fields;
