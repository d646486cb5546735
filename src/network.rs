//! Graph of nodes and connections: construction, structural mutation with
//! cycle prevention, and topologically ordered forward evaluation
//! (spec.md §4.4). Nodes and connections live in an arena keyed by id
//! rather than behind shared references, so cloning a network (for
//! elitism, or as the starting point of crossover) is a plain structural
//! copy.

use std::collections::{HashMap, HashSet};

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::connection::Connection;
use crate::error::NetworkError;
use crate::innovation::InnovationRegistry;
use crate::node::{Node, NodeKind};
use crate::normalizer::Normalizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    nodes: HashMap<u64, Node>,
    node_order: Vec<u64>,
    connections: HashMap<u64, Connection>,
    connection_order: Vec<u64>,
    connection_set: HashSet<(u64, u64)>,
    input_ids: Vec<u64>,
    output_ids: Vec<u64>,
    next_local_node_id: u64,
    pub normalizer: Option<Normalizer>,
}

impl Network {
    /// Allocates inputs with ids `1..=num_inputs` and outputs with ids
    /// `num_inputs+1..=num_inputs+num_outputs`, then wires a single random
    /// input/output pair together. Fails only if `num_inputs == 0` or
    /// `num_outputs == 0`.
    pub fn initialize(
        num_inputs: usize,
        num_outputs: usize,
        input_activation: Activation,
        output_activation: Activation,
        use_normalizer: bool,
        rng: &mut impl Rng,
        innovations: &mut InnovationRegistry,
    ) -> Result<Network, NetworkError> {
        if num_inputs == 0 || num_outputs == 0 {
            return Err(NetworkError::EmptyTopology);
        }

        let mut nodes = HashMap::with_capacity(num_inputs + num_outputs);
        let mut node_order = Vec::with_capacity(num_inputs + num_outputs);
        let mut input_ids = Vec::with_capacity(num_inputs);
        let mut output_ids = Vec::with_capacity(num_outputs);
        let mut next_id = 1u64;

        for _ in 0..num_inputs {
            let id = next_id;
            next_id += 1;
            // Bias on input nodes is unused but must exist (spec.md §3).
            nodes.insert(id, Node::new(id, NodeKind::Input, input_activation, 0.0));
            node_order.push(id);
            input_ids.push(id);
        }
        for _ in 0..num_outputs {
            let id = next_id;
            next_id += 1;
            let bias = rng.random_range(-1.0..1.0);
            nodes.insert(id, Node::new(id, NodeKind::Output, output_activation, bias));
            node_order.push(id);
            output_ids.push(id);
        }

        let mut network = Network {
            nodes,
            node_order,
            connections: HashMap::new(),
            connection_order: Vec::new(),
            connection_set: HashSet::new(),
            input_ids,
            output_ids,
            next_local_node_id: next_id,
            normalizer: use_normalizer.then(|| Normalizer::new(num_inputs)),
        };

        let source = *network.input_ids.choose(rng).expect("num_inputs > 0");
        let target = *network.output_ids.choose(rng).expect("num_outputs > 0");
        network
            .add_connection(source, target, rng, innovations)
            .expect("connecting a fresh input to a fresh output cannot violate any invariant");

        Ok(network)
    }

    pub fn num_inputs(&self) -> usize {
        self.input_ids.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.output_ids.len()
    }

    pub fn input_ids(&self) -> &[u64] {
        &self.input_ids
    }

    pub fn output_ids(&self) -> &[u64] {
        &self.output_ids
    }

    pub fn node_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.node_order.iter().copied()
    }

    pub fn connection_innovations(&self) -> impl Iterator<Item = u64> + '_ {
        self.connection_order.iter().copied()
    }

    pub fn get_node(&self, id: u64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: u64) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn get_connection(&self, innovation: u64) -> Option<&Connection> {
        self.connections.get(&innovation)
    }

    pub fn get_connection_mut(&mut self, innovation: u64) -> Option<&mut Connection> {
        self.connections.get_mut(&innovation)
    }

    pub fn len_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn len_connections(&self) -> usize {
        self.connections.len()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Appends a new connection with a uniform-random weight in `[-1, 1]`.
    /// Rejects duplicate `(source, target)` pairs, self-connections,
    /// sourcing from an output, targeting an input, and anything that
    /// would create a directed cycle among enabled edges.
    pub fn add_connection(
        &mut self,
        source: u64,
        target: u64,
        rng: &mut impl Rng,
        innovations: &mut InnovationRegistry,
    ) -> Result<u64, NetworkError> {
        if source == target {
            return Err(NetworkError::SelfConnection(source));
        }
        let source_kind = self
            .nodes
            .get(&source)
            .ok_or(NetworkError::UnknownNode(source))?
            .kind;
        if source_kind == NodeKind::Output {
            return Err(NetworkError::InvalidSource(source));
        }
        let target_kind = self
            .nodes
            .get(&target)
            .ok_or(NetworkError::UnknownNode(target))?
            .kind;
        if target_kind == NodeKind::Input {
            return Err(NetworkError::InvalidTarget(target));
        }
        if self.connection_set.contains(&(source, target)) {
            return Err(NetworkError::DuplicateConnection { source, target });
        }
        if self.would_create_cycle(source, target) {
            return Err(NetworkError::WouldCreateCycle { source, target });
        }

        let innovation = innovations.find_or_create(source, target);
        let weight = rng.random_range(-1.0..1.0);
        self.connections
            .insert(innovation, Connection::new(innovation, source, target, weight));
        self.connection_order.push(innovation);
        self.connection_set.insert((source, target));
        Ok(innovation)
    }

    fn remove_connection(&mut self, innovation: u64) {
        if let Some(connection) = self.connections.remove(&innovation) {
            self.connection_set
                .remove(&(connection.source, connection.target));
            self.connection_order.retain(|&i| i != innovation);
        }
    }

    /// True if adding `source -> target` would close a directed cycle
    /// among the network's *enabled* connections. Implemented as a
    /// forward search from `target`: if `target` can already reach
    /// `source` along enabled edges, the new edge would close a loop.
    pub fn would_create_cycle(&self, source: u64, target: u64) -> bool {
        if source == target {
            return true;
        }
        let mut stack = vec![target];
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == source {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            for connection in self.connections.values() {
                if connection.enabled && connection.source == node {
                    stack.push(connection.target);
                }
            }
        }
        false
    }

    /// Resets all node state, loads `inputs` (normalizing them first if a
    /// normalizer is attached), then evaluates nodes in topological
    /// readiness order: a node becomes ready once every enabled incoming
    /// edge originates at an already-ready node. A node with no enabled
    /// incoming edges is ready immediately with value
    /// `activation(bias)` — summing zero incoming contributions plus bias.
    /// Returns output values in id order.
    pub fn feed_forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        if inputs.len() != self.input_ids.len() {
            return Err(NetworkError::InvalidInputShape {
                expected: self.input_ids.len(),
                got: inputs.len(),
            });
        }

        let inputs = match self.normalizer.as_mut() {
            Some(normalizer) => {
                normalizer.observe(inputs);
                normalizer.normalize(inputs)
            }
            None => inputs.to_vec(),
        };

        for node in self.nodes.values_mut() {
            node.value = 0.0;
            node.ready = false;
        }
        for (&id, &value) in self.input_ids.iter().zip(inputs.iter()) {
            let node = self.nodes.get_mut(&id).expect("input id exists");
            node.value = value;
            node.ready = true;
        }

        let input_set: HashSet<u64> = self.input_ids.iter().copied().collect();
        let mut pending: Vec<u64> = self
            .node_order
            .iter()
            .copied()
            .filter(|id| !input_set.contains(id))
            .collect();

        // Acyclic by invariant, so this always drains within |nodes| passes.
        let max_passes = self.nodes.len() + 1;
        for _ in 0..max_passes {
            if pending.is_empty() {
                break;
            }

            let mut newly_ready: Vec<(u64, f64)> = Vec::new();
            for &id in &pending {
                let incoming: Vec<&Connection> = self
                    .connections
                    .values()
                    .filter(|c| c.enabled && c.target == id)
                    .collect();
                if incoming.iter().all(|c| self.nodes[&c.source].ready) {
                    let sum: f64 = incoming
                        .iter()
                        .map(|c| c.weight * self.nodes[&c.source].value)
                        .sum();
                    let node = &self.nodes[&id];
                    let value = node.activation.activate(sum + node.bias);
                    newly_ready.push((id, value));
                }
            }

            if newly_ready.is_empty() {
                break;
            }
            for (id, value) in &newly_ready {
                let node = self.nodes.get_mut(id).expect("id came from pending");
                node.value = *value;
                node.ready = true;
            }
            let ready_now: HashSet<u64> = newly_ready.iter().map(|(id, _)| *id).collect();
            pending.retain(|id| !ready_now.contains(id));
        }

        Ok(self
            .output_ids
            .iter()
            .map(|id| self.nodes[id].value)
            .collect())
    }

    /// Splits a uniformly random enabled connection: inserts a new hidden
    /// node, wires `src -> new` and `new -> tgt` (each with a fresh
    /// uniform-random weight), and disables the original. No-op if there
    /// are no enabled connections. Splitting an edge in a DAG cannot
    /// create a cycle, so a rollback path exists only for the structural
    /// violation that should never occur in practice (a genuine defensive
    /// measure per spec.md §4.4, not dead code).
    pub fn add_random_node(&mut self, rng: &mut impl Rng, innovations: &mut InnovationRegistry) {
        let Some(chosen) = self
            .connection_order
            .iter()
            .copied()
            .filter(|id| self.connections[id].enabled)
            .choose(rng)
        else {
            return;
        };
        let (source, target) = {
            let c = &self.connections[&chosen];
            (c.source, c.target)
        };

        let new_id = self.next_local_node_id;
        let activation = *Activation::ALL.choose(rng).expect("ALL is non-empty");
        let bias = rng.random_range(-1.0..1.0);
        self.nodes
            .insert(new_id, Node::new(new_id, NodeKind::Hidden, activation, bias));
        self.node_order.push(new_id);

        let first = self.add_connection(source, new_id, rng, innovations);
        let second = match first {
            Ok(_) => self.add_connection(new_id, target, rng, innovations),
            Err(e) => Err(e),
        };

        match (first, second) {
            (Ok(_), Ok(_)) => {
                self.next_local_node_id += 1;
                self.connections.get_mut(&chosen).expect("chosen exists").enabled = false;
            }
            (maybe_first, maybe_second) => {
                if let Ok(innovation) = maybe_first {
                    self.remove_connection(innovation);
                }
                if let Ok(innovation) = maybe_second {
                    self.remove_connection(innovation);
                }
                self.nodes.remove(&new_id);
                self.node_order.pop();
            }
        }
    }

    /// Up to 10 attempts: pick a uniformly random non-output source and
    /// non-input target, attempt `add_connection`, retry on failure.
    /// No-op if every attempt fails (or there is no eligible source or
    /// target at all).
    pub fn add_random_connection(&mut self, rng: &mut impl Rng, innovations: &mut InnovationRegistry) {
        let sources: Vec<u64> = self
            .node_order
            .iter()
            .copied()
            .filter(|&id| self.nodes[&id].kind != NodeKind::Output)
            .collect();
        let targets: Vec<u64> = self
            .node_order
            .iter()
            .copied()
            .filter(|&id| self.nodes[&id].kind != NodeKind::Input)
            .collect();
        if sources.is_empty() || targets.is_empty() {
            return;
        }

        for _ in 0..10 {
            let source = *sources.choose(rng).expect("non-empty");
            let target = *targets.choose(rng).expect("non-empty");
            if self.add_connection(source, target, rng, innovations).is_ok() {
                return;
            }
        }
    }

    /// Removes a uniformly random hidden node and every connection
    /// incident to it. No-op if there are no hidden nodes.
    pub fn remove_random_node(&mut self, rng: &mut impl Rng) {
        let Some(node_id) = self
            .node_order
            .iter()
            .copied()
            .filter(|&id| self.nodes[&id].kind == NodeKind::Hidden)
            .choose(rng)
        else {
            return;
        };

        let incident: Vec<u64> = self
            .connection_order
            .iter()
            .copied()
            .filter(|innovation| {
                let c = &self.connections[innovation];
                c.source == node_id || c.target == node_id
            })
            .collect();
        for innovation in incident {
            self.remove_connection(innovation);
        }
        self.nodes.remove(&node_id);
        self.node_order.retain(|&id| id != node_id);
    }

    /// Perturbs a uniformly random enabled connection's weight by
    /// Gaussian noise (mean -0.1, std 0.1). No-op if there are no enabled
    /// connections.
    pub fn change_random_weight(&mut self, rng: &mut impl Rng) {
        let Some(innovation) = self
            .connection_order
            .iter()
            .copied()
            .filter(|id| self.connections[id].enabled)
            .choose(rng)
        else {
            return;
        };
        let noise = Normal::new(-0.1, 0.1).expect("valid normal params").sample(rng);
        self.connections.get_mut(&innovation).expect("chosen exists").weight += noise;
    }

    /// Perturbs a uniformly random non-input node's bias by Gaussian
    /// noise (mean -0.1, std 0.1).
    pub fn change_random_bias(&mut self, rng: &mut impl Rng) {
        let Some(node_id) = self
            .node_order
            .iter()
            .copied()
            .filter(|&id| self.nodes[&id].kind != NodeKind::Input)
            .choose(rng)
        else {
            return;
        };
        let noise = Normal::new(-0.1, 0.1).expect("valid normal params").sample(rng);
        self.nodes.get_mut(&node_id).expect("chosen exists").bias += noise;
    }

    /// Reassigns a uniformly random non-input node's activation to a
    /// uniformly random registry entry.
    pub fn change_random_activation(&mut self, rng: &mut impl Rng) {
        let Some(node_id) = self
            .node_order
            .iter()
            .copied()
            .filter(|&id| self.nodes[&id].kind != NodeKind::Input)
            .choose(rng)
        else {
            return;
        };
        let activation = *Activation::ALL.choose(rng).expect("ALL is non-empty");
        self.nodes.get_mut(&node_id).expect("chosen exists").activation = activation;
    }

    /// Flips the enabled flag of a uniformly random enabled connection.
    pub fn toggle_random_connection(&mut self, rng: &mut impl Rng) {
        let Some(innovation) = self
            .connection_order
            .iter()
            .copied()
            .filter(|id| self.connections[id].enabled)
            .choose(rng)
        else {
            return;
        };
        let connection = self.connections.get_mut(&innovation).expect("chosen exists");
        connection.enabled = !connection.enabled;
    }
}
