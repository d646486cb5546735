//! Arena-value connection type, referencing its endpoints by node id
//! rather than by pointer (spec.md §9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Connection {
    pub innovation: u64,
    pub source: u64,
    pub target: u64,
    pub weight: f64,
    pub enabled: bool,
}

impl Connection {
    pub fn new(innovation: u64, source: u64, target: u64, weight: f64) -> Self {
        Connection {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }
}
