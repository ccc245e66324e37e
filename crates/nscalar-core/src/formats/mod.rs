//! # Formats
//!
//! Byte-level encodings of graph state.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, blueprints_from_bytes, blueprints_to_bytes,
};
