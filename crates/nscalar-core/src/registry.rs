//! # Name Registry
//!
//! Name → canonical node, and name → blueprint.
//!
//! The registry is owned by a `ScalarGraph`: there is no process-wide state,
//! and dropping or resetting the graph drops every entry.
//!
//! The registry stores handles only. Whether a canonical handle still points
//! at a live node is decided by the graph that owns both.

use crate::primitives::{MAX_BLUEPRINT_INPUTS, MAX_NAME_LENGTH};
use crate::types::{NodeId, ScalarError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deferred topology for a named node.
///
/// Once a node claims `name`, its inputs become the nodes currently holding
/// `input_names` (in order) and its network becomes a copy of `network`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint<N> {
    pub input_names: Vec<String>,
    pub network: N,
}

impl<N> Blueprint<N> {
    #[must_use]
    pub fn new(input_names: Vec<String>, network: N) -> Self {
        Self {
            input_names,
            network,
        }
    }
}

/// Canonical holders and pending blueprints, keyed by name.
///
/// Uses `BTreeMap` so iteration (and therefore persistence) is ordered.
#[derive(Debug, Clone)]
pub struct Registry<N> {
    canonical: BTreeMap<String, NodeId>,
    blueprints: BTreeMap<String, Blueprint<N>>,
}

impl<N> Default for Registry<N> {
    fn default() -> Self {
        Self {
            canonical: BTreeMap::new(),
            blueprints: BTreeMap::new(),
        }
    }
}

impl<N> Registry<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `name` can be used as a registry key.
    pub fn validate_name(name: &str) -> Result<(), ScalarError> {
        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(ScalarError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // CANONICAL HOLDERS
    // =========================================================================

    /// Make `node` the canonical holder of `name`. Returns the previous holder.
    pub fn register_canonical(&mut self, name: &str, node: NodeId) -> Option<NodeId> {
        self.canonical.insert(name.to_string(), node)
    }

    #[must_use]
    pub fn lookup_canonical(&self, name: &str) -> Option<NodeId> {
        self.canonical.get(name).copied()
    }

    /// Forget the canonical holder of `name`.
    pub fn remove_canonical(&mut self, name: &str) -> Option<NodeId> {
        self.canonical.remove(name)
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.canonical.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of canonical holders. Blueprints are counted by
    /// `blueprint_count`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// True when there are no canonical holders and no blueprints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty() && self.blueprints.is_empty()
    }

    // =========================================================================
    // BLUEPRINTS
    // =========================================================================

    /// Insert or replace the blueprint for `name`.
    pub fn register_blueprint(
        &mut self,
        name: &str,
        input_names: Vec<String>,
        network: N,
    ) -> Result<(), ScalarError> {
        Self::validate_name(name)?;
        if input_names.len() > MAX_BLUEPRINT_INPUTS {
            return Err(ScalarError::InvariantViolation(format!(
                "blueprint \"{}\" lists {} inputs (maximum {})",
                name,
                input_names.len(),
                MAX_BLUEPRINT_INPUTS
            )));
        }
        for input in &input_names {
            Self::validate_name(input)?;
        }
        self.blueprints
            .insert(name.to_string(), Blueprint::new(input_names, network));
        Ok(())
    }

    #[must_use]
    pub fn lookup_blueprint(&self, name: &str) -> Option<&Blueprint<N>> {
        self.blueprints.get(name)
    }

    pub fn remove_blueprint(&mut self, name: &str) -> Option<Blueprint<N>> {
        self.blueprints.remove(name)
    }

    /// Blueprint names in order.
    pub fn blueprint_names(&self) -> impl Iterator<Item = &str> {
        self.blueprints.keys().map(String::as_str)
    }

    pub fn blueprints(&self) -> impl Iterator<Item = (&str, &Blueprint<N>)> {
        self.blueprints.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume the registry, yielding its blueprints in name order.
    pub fn into_blueprints(self) -> impl Iterator<Item = (String, Blueprint<N>)> {
        self.blueprints.into_iter()
    }

    #[must_use]
    pub fn blueprint_count(&self) -> usize {
        self.blueprints.len()
    }

    /// Drop every canonical holder and blueprint.
    pub fn clear(&mut self) {
        self.canonical.clear();
        self.blueprints.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
