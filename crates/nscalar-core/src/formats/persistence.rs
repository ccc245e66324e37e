//! # Persistence Format
//!
//! Binary serialization for blueprint registries.
//!
//! File I/O operations are in the app layer.
//!
//! Format: Header (5 bytes) + postcard-serialized blueprint list.
//! - 4 bytes: Magic ("NSCL")
//! - 1 byte: Version
//!
//! Only blueprints are persisted. Canonical holders are handles into one
//! particular graph and mean nothing outside it.
//!
//! ## Validation
//!
//! Size and header are checked before the payload is parsed:
//! - Maximum payload size limit (`MAX_PERSISTENCE_PAYLOAD_SIZE`)
//! - Header magic and version
//! - Every decoded network must have consistent layer shapes
//! - Every decoded blueprint goes through `Registry::register_blueprint`

use crate::network::TinyNetwork;
use crate::primitives;
use crate::registry::{Blueprint, Registry};
use crate::types::ScalarError;
use serde::{Deserialize, Serialize};

/// Maximum allowed payload size for persistence format (64 MB).
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all blueprint data.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), ScalarError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(ScalarError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(ScalarError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScalarError> {
        if bytes.len() < HEADER_LEN {
            return Err(ScalarError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct PackedBlueprint {
    name: String,
    blueprint: Blueprint<TinyNetwork>,
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize the blueprints of a registry (header + payload).
///
/// Blueprints are written in name order, so equal registries produce equal
/// bytes.
pub fn blueprints_to_bytes(registry: &Registry<TinyNetwork>) -> Result<Vec<u8>, ScalarError> {
    let packed: Vec<PackedBlueprint> = registry
        .blueprints()
        .map(|(name, blueprint)| PackedBlueprint {
            name: name.to_string(),
            blueprint: blueprint.clone(),
        })
        .collect();

    let payload =
        postcard::to_stdvec(&packed).map_err(|e| ScalarError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a blueprint registry from bytes.
pub fn blueprints_from_bytes(bytes: &[u8]) -> Result<Registry<TinyNetwork>, ScalarError> {
    if bytes.len() < HEADER_LEN {
        return Err(ScalarError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(ScalarError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let packed: Vec<PackedBlueprint> = postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        ScalarError::DeserializationError(format!("Failed to deserialize blueprints: {}", e))
    })?;

    let mut registry = Registry::new();
    for entry in packed {
        entry.blueprint.network.validate().map_err(|e| {
            ScalarError::DeserializationError(format!(
                "Malformed network for blueprint '{}': {}",
                entry.name, e
            ))
        })?;
        registry.register_blueprint(
            &entry.name,
            entry.blueprint.input_names,
            entry.blueprint.network,
        )?;
    }
    Ok(registry)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{DenseLayer, NetworkSpec};
    use crate::types::Activation;

    // Same field layout as `PackedBlueprint`, with the network unchecked.
    #[derive(Serialize)]
    struct RawNetwork {
        input_dim: usize,
        use_bias: bool,
        seed: u64,
        layers: Vec<DenseLayer>,
    }

    #[derive(Serialize)]
    struct RawPacked {
        name: String,
        input_names: Vec<String>,
        network: RawNetwork,
    }

    fn raw_bytes(layer: DenseLayer) -> Vec<u8> {
        let packed = vec![RawPacked {
            name: "b".to_string(),
            input_names: vec!["a".to_string()],
            network: RawNetwork {
                input_dim: 1,
                use_bias: true,
                seed: 3,
                layers: vec![layer],
            },
        }];
        let mut bytes = PersistenceHeader::new().to_bytes().to_vec();
        bytes.extend(postcard::to_stdvec(&packed).expect("encode"));
        bytes
    }

    fn sample_registry() -> Registry<TinyNetwork> {
        let mut registry = Registry::new();
        registry
            .register_blueprint(
                "b",
                vec!["a".to_string()],
                NetworkSpec::new(1).layer(Activation::Tanh, 1).seed(3).build(),
            )
            .expect("register");
        registry
            .register_blueprint(
                "c",
                vec!["a".to_string(), "b".to_string()],
                NetworkSpec::new(2)
                    .layer(Activation::Relu, 4)
                    .layer(Activation::Identity, 1)
                    .build(),
            )
            .expect("register");
        registry
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let restored = PersistenceHeader::from_bytes(&header.to_bytes()).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn blueprints_survive_roundtrip() {
        let registry = sample_registry();
        let bytes = blueprints_to_bytes(&registry).expect("serialize");
        let restored = blueprints_from_bytes(&bytes).expect("deserialize");

        assert_eq!(restored.blueprint_count(), 2);
        assert_eq!(restored.lookup_blueprint("c"), registry.lookup_blueprint("c"));
        // save -> load -> save is bit-exact
        assert_eq!(blueprints_to_bytes(&restored).expect("serialize"), bytes);
    }

    #[test]
    fn canonical_entries_are_not_persisted() {
        let mut registry = sample_registry();
        registry.register_canonical("a", crate::NodeId::new(0, 0));

        let bytes = blueprints_to_bytes(&registry).expect("serialize");
        let restored = blueprints_from_bytes(&bytes).expect("deserialize");

        assert_eq!(restored.lookup_canonical("a"), None);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");

        assert!(blueprints_from_bytes(&bytes).is_err());
    }

    #[test]
    fn wrong_version_rejected() {
        let mut bytes = blueprints_to_bytes(&sample_registry()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION.wrapping_add(1);

        assert!(matches!(
            blueprints_from_bytes(&bytes),
            Err(ScalarError::DeserializationError(_))
        ));
    }

    #[test]
    fn truncated_data_rejected() {
        assert!(blueprints_from_bytes(b"NSC").is_err());

        let bytes = blueprints_to_bytes(&sample_registry()).expect("serialize");
        assert!(blueprints_from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn well_formed_raw_layer_accepted() {
        let layer = DenseLayer::zeroed(Activation::Tanh, 1, 1);
        let registry = blueprints_from_bytes(&raw_bytes(layer)).expect("deserialize");

        assert_eq!(registry.blueprint_count(), 1);
    }

    #[test]
    fn short_weight_buffer_rejected() {
        let mut layer = DenseLayer::zeroed(Activation::Identity, 1, 4);
        layer.weights.truncate(1);

        assert!(matches!(
            blueprints_from_bytes(&raw_bytes(layer)),
            Err(ScalarError::DeserializationError(_))
        ));
    }

    #[test]
    fn unchained_layer_width_rejected() {
        // declared input width 3 against a network input of 1
        let layer = DenseLayer::zeroed(Activation::Identity, 3, 1);

        assert!(matches!(
            blueprints_from_bytes(&raw_bytes(layer)),
            Err(ScalarError::DeserializationError(_))
        ));
    }

    #[test]
    fn overflowing_layer_shape_rejected() {
        let layer = DenseLayer {
            activation: Activation::Identity,
            inputs: usize::MAX,
            outputs: 2,
            weights: Vec::new(),
            biases: vec![0.0; 2],
        };

        assert!(blueprints_from_bytes(&raw_bytes(layer)).is_err());
    }
}
