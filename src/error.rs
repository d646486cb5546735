//! Crate-wide error taxonomy.
//!
//! Mirrors spec.md §7: `InvalidInputShape` and `StructuralViolation` are
//! raised by [`crate::network::Network`], caught immediately by their
//! direct callers (mutation operations treat `StructuralViolation` as a
//! no-op) and never propagate further. `ConfigMissing` surfaces at
//! [`crate::config::Config`] construction. `CheckpointMissing` is not
//! modeled as an error at all — see [`crate::checkpoint`] — so it has no
//! variant here.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, PartialEq, Eq, Clone)]
pub enum NetworkError {
    #[error("expected {expected} inputs, got {got}")]
    #[diagnostic(code(neat::network::invalid_input_shape))]
    InvalidInputShape { expected: usize, got: usize },

    #[error("a network needs at least one input and one output node")]
    #[diagnostic(code(neat::network::empty_topology))]
    EmptyTopology,

    #[error("connection {source} -> {target} already exists")]
    #[diagnostic(code(neat::network::duplicate_connection))]
    DuplicateConnection { source: u64, target: u64 },

    #[error("connection {source} -> {target} would create a cycle")]
    #[diagnostic(code(neat::network::cycle))]
    WouldCreateCycle { source: u64, target: u64 },

    #[error("node {0} cannot be used as a connection source (it is an output)")]
    #[diagnostic(code(neat::network::invalid_source))]
    InvalidSource(u64),

    #[error("node {0} cannot be used as a connection target (it is an input)")]
    #[diagnostic(code(neat::network::invalid_target))]
    InvalidTarget(u64),

    #[error("a connection cannot join node {0} to itself")]
    #[diagnostic(code(neat::network::self_connection))]
    SelfConnection(u64),

    #[error("unknown node id {0}")]
    #[diagnostic(code(neat::network::unknown_node))]
    UnknownNode(u64),
}

impl NetworkError {
    /// True for the subset of errors spec.md §4.4 calls "structural
    /// violations" — attempted connections that mutation call sites are
    /// required to catch and treat as a no-op.
    pub fn is_structural_violation(&self) -> bool {
        matches!(
            self,
            NetworkError::DuplicateConnection { .. }
                | NetworkError::WouldCreateCycle { .. }
                | NetworkError::InvalidSource(_)
                | NetworkError::InvalidTarget(_)
                | NetworkError::SelfConnection(_)
        )
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("missing required configuration key: {0}")]
    #[diagnostic(code(neat::config::missing))]
    Missing(String),

    #[error("failed to load configuration: {0}")]
    #[diagnostic(code(neat::config::load))]
    Load(#[from] config::ConfigError),
}

#[derive(Error, Diagnostic, Debug)]
pub enum CheckpointError {
    #[error("checkpoint i/o error: {0}")]
    #[diagnostic(code(neat::checkpoint::io))]
    Io(#[from] std::io::Error),

    #[error("checkpoint encode error: {0}")]
    #[diagnostic(code(neat::checkpoint::encode))]
    Encode(#[from] bincode::error::EncodeError),

    #[error("checkpoint decode error: {0}")]
    #[diagnostic(code(neat::checkpoint::decode))]
    Decode(#[from] bincode::error::DecodeError),
}

#[derive(Error, Diagnostic, Debug)]
pub enum EvolutionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Network(#[from] NetworkError),
}
