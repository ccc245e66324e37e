//! # nscalar
//!
//! Command-line front end for `nscalar-core`: TOML graph descriptions in,
//! evaluations and packed blueprint files out.

pub mod cli;
pub mod config;
