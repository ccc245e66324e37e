//! # Engine Primitives
//!
//! Hardcoded runtime constants for the nscalar engine.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Magic bytes for the nscalar blueprint format header.
///
/// - File Header = Magic Bytes ("NSCL") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"NSCL";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Width of the output layer added when a node gains its first input.
pub const OUTPUT_WIDTH: usize = 1;

/// Seed used by `Initialization` when a network has not been given one.
///
/// Keeps freshly connected networks reproducible across runs.
pub const DEFAULT_SEED: u64 = 0x6e73_6361_6c61_7221;

/// Maximum depth of a single evaluation pull.
///
/// - Evaluation recurses through the input chain.
/// - This bounds the recursion so very deep graphs fail cleanly instead of
///   overflowing the stack.
pub const MAX_EVALUATION_DEPTH: usize = 512;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for node and blueprint names.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum number of upstream names a single blueprint may list.
pub const MAX_BLUEPRINT_INPUTS: usize = 4096;
