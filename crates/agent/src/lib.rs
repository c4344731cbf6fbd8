//! `rendermail-agent` library crate.
//!
//! Re-exports the host bridge for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod bridge;
