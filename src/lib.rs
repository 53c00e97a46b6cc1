//! dtviz: decision tree layout and dashboard view models for a remote
//! modeling service.
//!
//! Layers:
//! - `domain`: tree builder, layout, chart view models (no I/O)
//! - `application`: dashboard service, model registry
//! - `infrastructure`: HTTP service, document decoding, filesystem, DI
//! - `cli`: argument parsing, commands, terminal rendering

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
