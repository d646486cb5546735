//! An augmenting-topologies neuroevolution engine: speciated genomes
//! evolving variable-topology feed-forward networks under a
//! user-supplied fitness function.

pub mod activation;
pub mod checkpoint;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod node;
pub mod normalizer;
pub mod population;
pub mod species;

pub use config::Config;
pub use driver::evolve;
pub use genome::Genome;
pub use population::Population;
