//! Domain types for the render email notifier.
//!
//! Nothing in this crate performs I/O. The lifecycle tracker, the SMTP
//! dispatcher and the host bridge live in `rendermail-events` and
//! `rendermail-agent` and build on the types defined here.

pub mod config;
pub mod duration;
pub mod error;
pub mod message;
pub mod render;
pub mod types;
