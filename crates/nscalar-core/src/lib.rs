//! # nscalar-core
//!
//! Lazily evaluated scalars whose values come from small feed-forward
//! networks over other scalars.
//!
//! A `ScalarGraph` owns every node. A node is either plain (it reports the
//! value it was assigned) or wired (its value is its network applied to the
//! evaluations of its inputs, plus the assigned value when residual).
//! Results are memoized until the node is marked dirty.
//!
//! ## Naming
//!
//! Assigning a name makes a node the canonical holder of that name. Every
//! node with the same name evaluates through the canonical holder's network.
//! Blueprints registered under a name are applied to whichever node claims
//! that name later.
//!
//! ## Constraints
//!
//! - Single-threaded: evaluation takes `&mut self`
//! - Deterministic: ordered registry, seeded weight initialization
//! - Pure Rust: no async, no I/O

// =============================================================================
// MODULES
// =============================================================================

pub mod facade;
pub mod formats;
pub mod graph;
pub mod network;
pub mod node;
pub mod ops;
pub mod primitives;
pub mod registry;
pub mod scalar;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Activation, Initialization, NodeId, ScalarError};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use facade::ScalarUtils;
pub use graph::ScalarGraph;
pub use network::{DenseLayer, LayerSpec, Network, NetworkSpec, TinyNetwork};
pub use node::NeuralScalar;
pub use ops::ArithOp;
pub use registry::{Blueprint, Registry};
pub use scalar::Scalar;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, blueprints_from_bytes, blueprints_to_bytes};
