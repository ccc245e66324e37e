//! # Scalar Graph
//!
//! The arena owning every node of an evaluation session, plus the name
//! registry those nodes share.
//!
//! Nodes refer to each other (and the registry refers to nodes) through
//! generation-checked `NodeId` handles. Removing a node invalidates every
//! handle to it: lookups return `None`, evaluation treats it as an absent
//! input.
//!
//! ## Evaluation
//!
//! `evaluate` is a depth-first pull over the input chain. It takes
//! `&mut self` because it refreshes caches along the way. Dirty flags do not
//! propagate downstream: after editing an upstream node, mark the affected
//! nodes dirty (or call `invalidate_all`).

use crate::network::{Network, TinyNetwork};
use crate::node::NeuralScalar;
use crate::primitives::{MAX_EVALUATION_DEPTH, OUTPUT_WIDTH};
use crate::registry::Registry;
use crate::scalar::Scalar;
use crate::types::{Activation, Initialization, NodeId, ScalarError};
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
struct Slot<S: Scalar, N: Network<S>> {
    generation: u32,
    node: Option<NeuralScalar<S, N>>,
}

/// Arena of `NeuralScalar` nodes with its name registry.
#[derive(Debug, Clone)]
pub struct ScalarGraph<S: Scalar = f64, N: Network<S> = TinyNetwork> {
    slots: Vec<Slot<S, N>>,
    /// Indices of vacant slots, reused before the arena grows.
    free: Vec<u32>,
    len: usize,
    registry: Registry<N>,
}

impl<S: Scalar, N: Network<S>> Default for ScalarGraph<S, N> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            registry: Registry::new(),
        }
    }
}

impl<S: Scalar, N: Network<S>> ScalarGraph<S, N> {
    /// Create an empty graph with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // ARENA
    // =========================================================================

    fn insert_node(&mut self, node: NeuralScalar<S, N>) -> NodeId {
        self.len = self.len.saturating_add(1);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    /// Remove a node, invalidating every handle to it.
    ///
    /// Registry entries naming the node are left in place; they simply stop
    /// resolving.
    pub fn remove(&mut self, id: NodeId) -> Option<NeuralScalar<S, N>> {
        let slot = self
            .slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation())?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        self.len = self.len.saturating_sub(1);
        Some(node)
    }

    /// Check if the handle refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NeuralScalar<S, N>> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_ref())
    }

    /// Like `get`, but a dead handle is an error.
    pub fn node(&self, id: NodeId) -> Result<&NeuralScalar<S, N>, ScalarError> {
        self.get(id).ok_or(ScalarError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NeuralScalar<S, N>, ScalarError> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_mut())
            .ok_or(ScalarError::NodeNotFound(id))
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handles of all live nodes, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|_| NodeId::new(index as u32, slot.generation))
        })
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Insert a plain node holding `value`.
    pub fn insert(&mut self, value: S) -> NodeId {
        self.insert_node(NeuralScalar::new(value))
    }

    /// Insert a plain node holding zero.
    pub fn insert_default(&mut self) -> NodeId {
        self.insert(S::zero())
    }

    /// Insert a node wired to `inputs`.
    ///
    /// The network maps `inputs.len()` values to one identity output. Its
    /// weights are left as constructed; call `initialize` to seed them.
    pub fn insert_wired(
        &mut self,
        inputs: &[NodeId],
        use_bias: bool,
    ) -> Result<NodeId, ScalarError> {
        self.insert_wired_slots(inputs.iter().copied().map(Some).collect(), use_bias)
    }

    /// Like `insert_wired`, but inputs may contain absent slots.
    pub fn insert_wired_slots(
        &mut self,
        inputs: Vec<Option<NodeId>>,
        use_bias: bool,
    ) -> Result<NodeId, ScalarError> {
        self.check_inputs(&inputs)?;
        let mut network = N::with_input_dim(inputs.len(), use_bias);
        network.add_linear_layer(Activation::Identity, OUTPUT_WIDTH);
        Ok(self.insert_node(NeuralScalar::wired(inputs, network)))
    }

    /// Insert a node wired to `inputs` through a fully specified network.
    pub fn insert_with_network(
        &mut self,
        inputs: &[NodeId],
        network: N,
    ) -> Result<NodeId, ScalarError> {
        let inputs: Vec<_> = inputs.iter().copied().map(Some).collect();
        self.check_inputs(&inputs)?;
        if network.input_dim() != inputs.len() {
            return Err(ScalarError::DimensionMismatch {
                expected: inputs.len(),
                actual: network.input_dim(),
            });
        }
        Ok(self.insert_node(NeuralScalar::wired(inputs, network)))
    }

    fn check_inputs(&self, inputs: &[Option<NodeId>]) -> Result<(), ScalarError> {
        match inputs.iter().flatten().find(|id| !self.contains(**id)) {
            Some(missing) => Err(ScalarError::NodeNotFound(*missing)),
            None => Ok(()),
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Overwrite the value of `id`. Inputs, network and name are kept.
    pub fn assign_value(&mut self, id: NodeId, value: S) -> Result<(), ScalarError> {
        self.node_mut(id)?.assign(value);
        Ok(())
    }

    /// Overwrite the value of `id` with the evaluated value of `other`.
    ///
    /// Only the value is copied; `other`'s wiring is never transplanted.
    pub fn assign_from(&mut self, id: NodeId, other: NodeId) -> Result<(), ScalarError> {
        self.node(id)?;
        let value = self.evaluate(other)?;
        self.assign_value(id, value)
    }

    /// Append `other` to the inputs of `id`.
    ///
    /// The network grows by one input; a network without layers gains a
    /// single output layer using `activation`. The whole network is then
    /// re-initialized with the default method.
    pub fn connect(
        &mut self,
        id: NodeId,
        other: NodeId,
        activation: Activation,
    ) -> Result<(), ScalarError> {
        if !self.contains(other) {
            return Err(ScalarError::NodeNotFound(other));
        }
        let node = self.node_mut(id)?;
        node.inputs.push(Some(other));
        let input_dim = node.network.input_dim().saturating_add(1);
        node.network.set_input_dim(input_dim);
        if node.network.num_layers() == 0 {
            node.network.add_linear_layer(activation, OUTPUT_WIDTH);
        }
        node.network.initialize(Initialization::default());
        node.set_dirty();
        Ok(())
    }

    /// Re-initialize the network of `id`. The dirty flag is untouched.
    pub fn initialize(&mut self, id: NodeId, method: Initialization) -> Result<(), ScalarError> {
        self.node_mut(id)?.network.initialize(method);
        Ok(())
    }

    /// Mark `id` stale; ignored while its network has no outputs.
    pub fn set_dirty(&mut self, id: NodeId) -> Result<(), ScalarError> {
        self.node_mut(id)?.set_dirty();
        Ok(())
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool, ScalarError> {
        Ok(self.node(id)?.is_dirty())
    }

    pub fn set_residual(&mut self, id: NodeId, residual: bool) -> Result<(), ScalarError> {
        self.node_mut(id)?.set_residual(residual);
        Ok(())
    }

    pub fn is_residual(&self, id: NodeId) -> Result<bool, ScalarError> {
        Ok(self.node(id)?.is_residual())
    }

    /// Assigned value of `id` (not its evaluation).
    pub fn value(&self, id: NodeId) -> Result<S, ScalarError> {
        Ok(self.node(id)?.value())
    }

    /// Input slots of `id`; `None` marks an absent input.
    pub fn inputs(&self, id: NodeId) -> Result<&[Option<NodeId>], ScalarError> {
        Ok(self.node(id)?.inputs())
    }

    pub fn name(&self, id: NodeId) -> Result<Option<&str>, ScalarError> {
        Ok(self.node(id)?.name())
    }

    pub fn network(&self, id: NodeId) -> Result<&N, ScalarError> {
        Ok(self.node(id)?.network())
    }

    /// Mutable access to the network of `id`.
    ///
    /// Edits through this reference do not mark the node dirty.
    pub fn network_mut(&mut self, id: NodeId) -> Result<&mut N, ScalarError> {
        Ok(&mut self.node_mut(id)?.network)
    }

    /// Mark every live node stale (subject to the same output guard).
    pub fn invalidate_all(&mut self) {
        for node in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            node.set_dirty();
        }
    }

    /// Remove every node and clear the registry.
    ///
    /// Slots are kept so that handles issued before the reset stay invalid.
    pub fn reset(&mut self) {
        let ids: Vec<_> = self.ids().collect();
        for id in ids {
            self.remove(id);
        }
        self.registry.clear();
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Evaluate `id`, refreshing stale caches along its input chain.
    ///
    /// - A node without inputs evaluates to its assigned value.
    /// - A clean node returns its cache without running its network.
    /// - Otherwise the inputs are evaluated in order, the network runs and the
    ///   result is `value + output` in residual mode, `output` otherwise.
    pub fn evaluate(&mut self, id: NodeId) -> Result<S, ScalarError> {
        let mut visiting = BTreeSet::new();
        self.evaluate_inner(id, &mut visiting)
    }

    fn evaluate_inner(
        &mut self,
        id: NodeId,
        visiting: &mut BTreeSet<NodeId>,
    ) -> Result<S, ScalarError> {
        let node = self.node(id)?;
        if node.is_plain() {
            let value = node.value;
            let node = self.node_mut(id)?;
            node.cache = value;
            node.dirty = false;
            return Ok(value);
        }
        if !node.dirty {
            return Ok(node.cache);
        }

        if visiting.len() >= MAX_EVALUATION_DEPTH {
            return Err(ScalarError::EvaluationDepthExceeded(id));
        }
        if !visiting.insert(id) {
            return Err(ScalarError::CyclicDependency(id));
        }
        let output = self.evaluate_network(id, visiting);
        visiting.remove(&id);
        let output = output?;

        let node = self.node_mut(id)?;
        let result = node.combine(output);
        node.cache = result;
        node.dirty = false;
        debug!(node = %id, "recomputed cache");
        Ok(result)
    }

    /// Node whose inputs and network drive `id`.
    ///
    /// A named node that is not the live canonical holder of its name defers
    /// to that holder, unless the holder's network has no outputs; then the
    /// node keeps its own wiring.
    fn network_source(&self, id: NodeId) -> Result<NodeId, ScalarError> {
        let node = self.node(id)?;
        let Some(name) = node.name() else {
            return Ok(id);
        };
        match self.retrieve(name) {
            Some(canonical) if canonical != id => {
                if self.node(canonical)?.network.output_dim() == 0 {
                    debug!(node = %id, canonical = %canonical, name, "canonical node is plain");
                    return Ok(id);
                }
                debug!(node = %id, canonical = %canonical, name, "delegating to canonical node");
                Ok(canonical)
            }
            _ => Ok(id),
        }
    }

    fn evaluate_network(
        &mut self,
        id: NodeId,
        visiting: &mut BTreeSet<NodeId>,
    ) -> Result<S, ScalarError> {
        let source = self.network_source(id)?;
        let (inputs, width) = {
            let node = self.node(source)?;
            (node.inputs.clone(), node.network.output_dim())
        };

        // Absent inputs contribute zero.
        let mut buffer = Vec::with_capacity(inputs.len());
        for slot in inputs {
            let value = match slot {
                Some(input) if self.contains(input) => {
                    self.evaluate_inner(input, visiting)?
                }
                Some(input) => {
                    warn!(node = %source, input = %input, "input was removed, reading zero");
                    S::zero()
                }
                None => S::zero(),
            };
            buffer.push(value);
        }

        let mut output = vec![S::zero(); width];
        self.node(source)?.network.compute(&buffer, &mut output)?;
        output.first().copied().ok_or_else(|| {
            ScalarError::InvariantViolation(format!("network of node {} has no output", source))
        })
    }

    // =========================================================================
    // NAMES & BLUEPRINTS
    // =========================================================================

    /// Live canonical holder of `name`, if any.
    #[must_use]
    pub fn retrieve(&self, name: &str) -> Option<NodeId> {
        self.registry
            .lookup_canonical(name)
            .filter(|id| self.contains(*id))
    }

    /// Register a blueprint for `name`.
    ///
    /// Existing nodes are unaffected; the blueprint applies to nodes that
    /// claim `name` afterwards.
    pub fn add_blueprint<I, T>(
        &mut self,
        name: &str,
        input_names: I,
        network: N,
    ) -> Result<(), ScalarError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let input_names: Vec<String> = input_names.into_iter().map(Into::into).collect();
        if network.input_dim() != input_names.len() {
            return Err(ScalarError::DimensionMismatch {
                expected: input_names.len(),
                actual: network.input_dim(),
            });
        }
        self.registry.register_blueprint(name, input_names, network)
    }

    /// Give `id` a name and make it the canonical holder of that name.
    ///
    /// If a blueprint exists for `name`, the node's inputs are replaced by
    /// the current holders of the blueprint's input names and its network by
    /// a copy of the blueprint network. Every input name must already be
    /// held by a live node; otherwise nothing changes and
    /// `UnresolvedBlueprintUpstream` is returned.
    ///
    /// Renaming a node releases its previous name if it held it.
    pub fn assign_name(&mut self, id: NodeId, name: &str) -> Result<(), ScalarError> {
        Registry::<N>::validate_name(name)?;
        self.node(id)?;

        let wiring = match self.registry.lookup_blueprint(name) {
            Some(blueprint) => {
                let mut inputs = Vec::with_capacity(blueprint.input_names.len());
                for input_name in &blueprint.input_names {
                    let Some(input) = self.retrieve(input_name) else {
                        error!(
                            name,
                            input = input_name.as_str(),
                            "NeuralScalar named \"{}\" has been requested before it was assigned",
                            input_name
                        );
                        return Err(ScalarError::UnresolvedBlueprintUpstream(input_name.clone()));
                    };
                    inputs.push(Some(input));
                }
                Some((inputs, blueprint.network.clone()))
            }
            None => None,
        };

        let node = self.node_mut(id)?;
        let previous_name = node.name.replace(name.to_string());
        if let Some((inputs, network)) = wiring {
            debug!(node = %id, name, inputs = inputs.len(), "applied blueprint");
            node.inputs = inputs;
            node.network = network;
            node.set_dirty();
        }

        if let Some(old) = previous_name.filter(|old| old != name) {
            if self.registry.lookup_canonical(&old) == Some(id) {
                self.registry.remove_canonical(&old);
                debug!(node = %id, old = old.as_str(), name, "released previous name");
            }
        }

        match self.registry.register_canonical(name, id) {
            Some(previous) if previous != id => {
                debug!(node = %id, previous = %previous, name, "replaced canonical node");
            }
            _ => {}
        }

        // Other holders of the name now read a different network.
        for node in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            if node.name() == Some(name) {
                node.set_dirty();
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &Registry<N> {
        &self.registry
    }

    /// Register every blueprint of `registry`, replacing same-named ones.
    ///
    /// Canonical entries of `registry` are ignored: handles belong to the
    /// graph that issued them.
    pub fn import_blueprints(&mut self, registry: Registry<N>) -> Result<(), ScalarError> {
        for (name, blueprint) in registry.into_blueprints() {
            self.add_blueprint(&name, blueprint.input_names, blueprint.network)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Network returning `offset + gain * sum(inputs)` and counting calls.
    #[derive(Debug, Clone, Default)]
    struct StubNetwork {
        input_dim: usize,
        layers: usize,
        offset: f64,
        gain: f64,
        calls: Rc<Cell<usize>>,
    }

    impl StubNetwork {
        fn fixed(input_dim: usize, offset: f64) -> Self {
            Self {
                input_dim,
                layers: 1,
                offset,
                ..Self::default()
            }
        }
    }

    impl Network<f64> for StubNetwork {
        fn with_input_dim(input_dim: usize, _use_bias: bool) -> Self {
            Self {
                input_dim,
                ..Self::default()
            }
        }

        fn input_dim(&self) -> usize {
            self.input_dim
        }

        fn output_dim(&self) -> usize {
            usize::from(self.layers > 0)
        }

        fn set_input_dim(&mut self, input_dim: usize) {
            self.input_dim = input_dim;
        }

        fn num_layers(&self) -> usize {
            self.layers
        }

        fn add_linear_layer(&mut self, _activation: Activation, _width: usize) {
            self.layers += 1;
        }

        fn initialize(&mut self, _method: Initialization) {}

        fn compute(&self, inputs: &[f64], outputs: &mut [f64]) -> Result<(), ScalarError> {
            self.calls.set(self.calls.get() + 1);
            if inputs.len() != self.input_dim {
                return Err(ScalarError::DimensionMismatch {
                    expected: self.input_dim,
                    actual: inputs.len(),
                });
            }
            outputs[0] = self.offset + self.gain * inputs.iter().sum::<f64>();
            Ok(())
        }
    }

    type StubGraph = ScalarGraph<f64, StubNetwork>;

    #[test]
    fn plain_node_evaluates_to_value() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let x = graph.insert(3.0);

        assert_eq!(graph.evaluate(x).expect("eval"), 3.0);
        assert_eq!(graph.evaluate(x).expect("eval"), 3.0);
        assert!(!graph.is_dirty(x).expect("dirty"));
    }

    #[test]
    fn plain_node_tracks_reassignment() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let x = graph.insert(3.0);
        graph.evaluate(x).expect("eval");

        graph.assign_value(x, 7.0).expect("assign");
        // Still clean: plain nodes have no network output
        assert!(!graph.is_dirty(x).expect("dirty"));
        assert_eq!(graph.evaluate(x).expect("eval"), 7.0);
    }

    #[test]
    fn clean_node_skips_network() {
        let mut graph = StubGraph::new();
        let x = graph.insert(1.0);
        let net = StubNetwork::fixed(1, 2.0);
        let calls = Rc::clone(&net.calls);
        let y = graph.insert_with_network(&[x], net).expect("insert");

        let first = graph.evaluate(y).expect("eval");
        let second = graph.evaluate(y).expect("eval");

        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(calls.get(), 1);
        assert!(!graph.is_dirty(y).expect("dirty"));
    }

    #[test]
    fn connect_guard_leaves_unwired_node_clean() {
        let mut graph = StubGraph::new();
        let x = graph.insert(1.0);
        let y = graph.insert_default();
        graph.evaluate(y).expect("eval");
        assert!(!graph.is_dirty(y).expect("dirty"));

        // No outputs yet: set_dirty is a no-op
        graph.set_dirty(y).expect("set");
        assert!(!graph.is_dirty(y).expect("dirty"));

        graph.connect(y, x, Activation::Identity).expect("connect");
        assert!(graph.is_dirty(y).expect("dirty"));
        assert_eq!(graph.network(y).expect("net").input_dim(), 1);
        assert_eq!(graph.network(y).expect("net").num_layers(), 1);
    }

    #[test]
    fn connect_does_not_stack_output_layers() {
        let mut graph = StubGraph::new();
        let a = graph.insert(1.0);
        let b = graph.insert(2.0);
        let y = graph.insert_default();

        graph.connect(y, a, Activation::Identity).expect("connect");
        graph.connect(y, b, Activation::Tanh).expect("connect");

        let net = graph.network(y).expect("net");
        assert_eq!(net.input_dim(), 2);
        assert_eq!(net.num_layers(), 1);
        assert_eq!(graph.node(y).expect("node").inputs(), &[Some(a), Some(b)]);
    }

    #[test]
    fn residual_scenario() {
        let mut graph = StubGraph::new();
        let x = graph.insert(3.0);
        assert_eq!(graph.evaluate(x).expect("eval"), 3.0);

        let y = graph.insert_default();
        graph.connect(y, x, Activation::Identity).expect("connect");
        graph.network_mut(y).expect("net").offset = 5.0;

        assert_eq!(graph.evaluate(y).expect("eval"), 5.0);

        graph.set_residual(y, false).expect("residual");
        assert_eq!(graph.evaluate(y).expect("eval"), 5.0);

        graph.assign_value(y, 10.0).expect("assign");
        assert_eq!(graph.evaluate(y).expect("eval"), 5.0);

        graph.set_residual(y, true).expect("residual");
        assert_eq!(graph.evaluate(y).expect("eval"), 15.0);
    }

    #[test]
    fn assign_from_copies_value_not_wiring() {
        let mut graph = StubGraph::new();
        let x = graph.insert(2.0);
        let y = graph
            .insert_with_network(&[x], StubNetwork::fixed(1, 4.0))
            .expect("insert");
        let z = graph.insert(0.0);

        graph.assign_from(z, y).expect("assign");

        assert_eq!(graph.value(z).expect("value"), 4.0);
        assert!(graph.node(z).expect("node").is_plain());
    }

    #[test]
    fn assign_keeps_wiring() {
        let mut graph = StubGraph::new();
        let x = graph.insert(2.0);
        let y = graph
            .insert_with_network(&[x], StubNetwork::fixed(1, 4.0))
            .expect("insert");
        graph.assign_name(y, "y").expect("name");

        graph.assign_value(y, 1.0).expect("assign");

        let node = graph.node(y).expect("node");
        assert_eq!(node.inputs(), &[Some(x)]);
        assert_eq!(node.name(), Some("y"));
        assert_eq!(graph.evaluate(y).expect("eval"), 5.0);
    }

    #[test]
    fn absent_input_contributes_zero() {
        let mut graph = StubGraph::new();
        let x = graph.insert(3.0);
        let mut net = StubNetwork::with_input_dim(2, true);
        net.layers = 1;
        net.gain = 1.0;
        let y = graph
            .insert_node(NeuralScalar::wired(vec![None, Some(x)], net));

        assert_eq!(graph.evaluate(y).expect("eval"), 3.0);
    }

    #[test]
    fn removed_input_reads_zero() {
        let mut graph = StubGraph::new();
        let a = graph.insert(3.0);
        let b = graph.insert(4.0);
        let mut net = StubNetwork::fixed(2, 0.0);
        net.gain = 1.0;
        let y = graph.insert_with_network(&[a, b], net).expect("insert");
        assert_eq!(graph.evaluate(y).expect("eval"), 7.0);

        graph.remove(a).expect("remove");
        graph.set_dirty(y).expect("dirty");

        assert_eq!(graph.evaluate(y).expect("eval"), 4.0);
    }

    #[test]
    fn cycle_is_reported() {
        let mut graph = StubGraph::new();
        let a = graph.insert_default();
        let b = graph.insert_default();
        graph.connect(a, b, Activation::Identity).expect("connect");
        graph.connect(b, a, Activation::Identity).expect("connect");

        let result = graph.evaluate(a);
        assert!(matches!(result, Err(ScalarError::CyclicDependency(id)) if id == a));
        // A failed evaluation leaves the node stale
        assert!(graph.is_dirty(a).expect("dirty"));
    }

    #[test]
    fn self_loop_is_reported() {
        let mut graph = StubGraph::new();
        let a = graph.insert_default();
        graph.connect(a, a, Activation::Identity).expect("connect");

        assert!(matches!(graph.evaluate(a), Err(ScalarError::CyclicDependency(_))));
    }

    #[test]
    fn deep_chain_is_bounded() {
        let mut graph = StubGraph::new();
        let mut prev = graph.insert(1.0);
        for _ in 0..=MAX_EVALUATION_DEPTH {
            let next = graph.insert_default();
            graph.connect(next, prev, Activation::Identity).expect("connect");
            prev = next;
        }

        assert!(matches!(
            graph.evaluate(prev),
            Err(ScalarError::EvaluationDepthExceeded(_))
        ));
    }

    #[test]
    fn removed_handle_is_dead() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let a = graph.insert(1.0);
        graph.remove(a).expect("remove");
        let b = graph.insert(2.0);

        // Slot reused with a new generation
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(!graph.contains(a));
        assert!(matches!(graph.evaluate(a), Err(ScalarError::NodeNotFound(_))));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn insert_wired_rejects_dead_inputs() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let a = graph.insert(1.0);
        graph.remove(a);

        assert!(matches!(
            graph.insert_wired(&[a], true),
            Err(ScalarError::NodeNotFound(_))
        ));
    }

    #[test]
    fn insert_wired_builds_single_output() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let a = graph.insert(1.0);
        let b = graph.insert(2.0);
        let y = graph.insert_wired(&[a, b], true).expect("insert");

        let net = graph.network(y).expect("net");
        assert_eq!(Network::<f64>::input_dim(net), 2);
        assert_eq!(Network::<f64>::output_dim(net), 1);
        // Weights stay zero until initialized
        assert_eq!(graph.evaluate(y).expect("eval"), 0.0);
    }

    #[test]
    fn insert_with_network_checks_dimension() {
        let mut graph = StubGraph::new();
        let a = graph.insert(1.0);
        let result = graph.insert_with_network(&[a], StubNetwork::fixed(2, 0.0));
        assert!(matches!(
            result,
            Err(ScalarError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn retrieve_unknown_is_none() {
        let graph: ScalarGraph = ScalarGraph::new();
        assert_eq!(graph.retrieve("missing"), None);
    }

    #[test]
    fn retrieve_after_remove_is_none() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let a = graph.insert(1.0);
        graph.assign_name(a, "a").expect("name");
        assert_eq!(graph.retrieve("a"), Some(a));

        graph.remove(a);
        assert_eq!(graph.retrieve("a"), None);
    }

    #[test]
    fn alias_uses_canonical_network() {
        let mut graph = StubGraph::new();
        let x = graph.insert(1.0);
        let first = graph
            .insert_with_network(&[x], StubNetwork::fixed(1, 2.0))
            .expect("insert");
        let second = graph
            .insert_with_network(&[x], StubNetwork::fixed(1, 30.0))
            .expect("insert");
        graph.assign_value(first, 100.0).expect("assign");

        graph.assign_name(first, "shared").expect("name");
        graph.assign_name(second, "shared").expect("name");
        assert_eq!(graph.retrieve("shared"), Some(second));

        assert_eq!(graph.evaluate(second).expect("eval"), 30.0);
        assert_eq!(graph.evaluate(first).expect("eval"), 130.0);

        graph.set_residual(first, false).expect("residual");
        assert_eq!(graph.evaluate(first).expect("eval"), 30.0);
    }

    #[test]
    fn plain_canonical_leaves_alias_on_own_network() {
        let mut graph = StubGraph::new();
        let x = graph.insert(1.0);
        let wired = graph
            .insert_with_network(&[x], StubNetwork::fixed(1, 5.0))
            .expect("insert");
        graph.assign_name(wired, "n").expect("name");

        let plain = graph.insert(9.0);
        graph.assign_name(plain, "n").expect("name");
        assert_eq!(graph.retrieve("n"), Some(plain));

        assert_eq!(graph.evaluate(wired).expect("eval"), 5.0);
        assert_eq!(graph.evaluate(plain).expect("eval"), 9.0);
    }

    #[test]
    fn rename_releases_previous_name() {
        let mut graph = StubGraph::new();
        let a = graph.insert(1.0);
        graph.assign_name(a, "a").expect("name");
        graph.assign_name(a, "b").expect("rename");

        assert_eq!(graph.retrieve("a"), None);
        assert_eq!(graph.retrieve("b"), Some(a));
        assert_eq!(graph.name(a).expect("name"), Some("b"));
        assert_eq!(graph.registry().len(), 1);
    }

    #[test]
    fn rename_keeps_name_held_by_another_node() {
        let mut graph = StubGraph::new();
        let a = graph.insert(1.0);
        let c = graph.insert(2.0);
        graph.assign_name(a, "x").expect("name");
        graph.assign_name(c, "x").expect("name");

        graph.assign_name(a, "y").expect("rename");

        assert_eq!(graph.retrieve("x"), Some(c));
        assert_eq!(graph.retrieve("y"), Some(a));
    }

    #[test]
    fn inputs_and_name_accessors() {
        let mut graph = StubGraph::new();
        let x = graph.insert(1.0);
        let y = graph
            .insert_wired_slots(vec![Some(x), None], true)
            .expect("insert");

        assert_eq!(graph.inputs(y).expect("inputs"), &[Some(x), None]);
        assert!(graph.inputs(x).expect("inputs").is_empty());
        assert_eq!(graph.name(y).expect("name"), None);

        graph.remove(y);
        assert_eq!(graph.inputs(y), Err(ScalarError::NodeNotFound(y)));
        assert_eq!(graph.name(y), Err(ScalarError::NodeNotFound(y)));
    }

    #[test]
    fn blueprint_wires_named_node() {
        let mut graph = StubGraph::new();
        graph
            .add_blueprint("B", ["A"], StubNetwork::fixed(1, 6.0))
            .expect("blueprint");

        let a = graph.insert(1.0);
        graph.assign_name(a, "A").expect("name");
        let b = graph.insert_default();
        graph.assign_name(b, "B").expect("name");

        let node = graph.node(b).expect("node");
        assert_eq!(node.inputs(), &[Some(a)]);
        assert_eq!(node.network().offset, 6.0);
        assert_eq!(graph.evaluate(b).expect("eval"), 6.0);
    }

    #[test]
    fn blueprint_before_upstream_fails() {
        let mut graph = StubGraph::new();
        graph
            .add_blueprint("B", ["A"], StubNetwork::fixed(1, 6.0))
            .expect("blueprint");

        let b = graph.insert(2.0);
        let result = graph.assign_name(b, "B");

        assert_eq!(
            result,
            Err(ScalarError::UnresolvedBlueprintUpstream("A".to_string()))
        );
        let node = graph.node(b).expect("node");
        assert_eq!(node.name(), None);
        assert!(node.is_plain());
        assert_eq!(graph.retrieve("B"), None);
    }

    #[test]
    fn blueprint_rejects_dimension_mismatch() {
        let mut graph = StubGraph::new();
        let result = graph.add_blueprint("B", ["A", "C"], StubNetwork::fixed(1, 0.0));
        assert!(matches!(result, Err(ScalarError::DimensionMismatch { .. })));
    }

    #[test]
    fn invalidate_all_marks_wired_nodes() {
        let mut graph = StubGraph::new();
        let x = graph.insert(1.0);
        let mut net = StubNetwork::fixed(1, 0.0);
        net.gain = 1.0;
        let y = graph.insert_with_network(&[x], net).expect("insert");
        assert_eq!(graph.evaluate(y).expect("eval"), 1.0);

        graph.assign_value(x, 5.0).expect("assign");
        // Upstream edits do not propagate
        assert_eq!(graph.evaluate(y).expect("eval"), 1.0);

        graph.invalidate_all();
        assert_eq!(graph.evaluate(y).expect("eval"), 5.0);
    }

    #[test]
    fn reset_clears_nodes_and_registry() {
        let mut graph: ScalarGraph = ScalarGraph::new();
        let a = graph.insert(1.0);
        graph.assign_name(a, "a").expect("name");

        graph.reset();

        assert!(graph.is_empty());
        assert_eq!(graph.retrieve("a"), None);
        let b = graph.insert(2.0);
        assert_ne!(a, b);
    }
}
