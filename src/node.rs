//! Arena-value node type. Nodes are stored by value in a per-network
//! arena (keyed by id) rather than shared by reference, so deep-copying a
//! genome is a structural copy, not a pointer-chase (spec.md §9).

use serde::{Deserialize, Serialize};

use crate::activation::Activation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Output,
    Hidden,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub kind: NodeKind,
    pub activation: Activation,
    pub bias: f64,

    // Transient evaluation state — reset at the start of every
    // `feed_forward` call, never meaningfully persisted across calls.
    #[serde(skip)]
    pub(crate) value: f64,
    #[serde(skip)]
    pub(crate) ready: bool,
}

impl Node {
    pub fn new(id: u64, kind: NodeKind, activation: Activation, bias: f64) -> Self {
        Node {
            id,
            kind,
            activation,
            bias,
            value: 0.0,
            ready: false,
        }
    }
}
