//! btwatch library: portable presence detection engine.
//!
//! Turns raw inquiry-scan text into sightings, reconciles them against a
//! registry of known devices with a debounce window, and keeps a rolling
//! buffer of event lines for a small status display. Everything here is
//! `no_std` with no allocator and is testable on any host with `cargo test`.
//! Platform binaries (the Linux daemon under `daemon/`) are thin consumers
//! that provide the scan command, the backing store and the output devices.
//!
//! Module map:
//! - `scanner`: scan text parser, device identifiers
//! - `registry`: device records and the storage contract
//! - `reconciler`: new / known / ignored policy, name conflicts
//! - `display`: bounded newest-first line buffer
//! - `driver`: one polling cycle over pluggable collaborators
//! - `protocol`: JSON encodings for stored records and status reports
//! - `board`, `defaults`: compile-time constants

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod defaults;
pub mod display;
pub mod driver;
pub mod protocol;
pub mod reconciler;
pub mod registry;
pub mod scanner;
