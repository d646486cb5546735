//! A group of genetically compatible genomes sharing a representative
//! and a stagnation counter (spec.md §4.6).

use serde::{Deserialize, Serialize};

use crate::genome::Genome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: u64,
    pub representative: Genome,
    pub members: Vec<Genome>,
    pub stagnation: usize,
    pub best_fitness: f64,
}

impl Species {
    /// A freshly created species has the representative as its sole
    /// member, no stagnation, and `best_fitness = -infinity` so its
    /// first `update` call always registers as an improvement.
    pub fn new(id: u64, representative: Genome) -> Self {
        Species {
            id,
            members: vec![representative.clone()],
            representative,
            stagnation: 0,
            best_fitness: f64::NEG_INFINITY,
        }
    }

    /// Per-generation state machine (spec.md §4.6): sort members by
    /// fitness descending, then either record an improvement (reset
    /// stagnation) or bump the stagnation counter.
    pub fn update(&mut self) {
        self.members
            .sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());
        match self.members.first() {
            Some(top) if top.fitness > self.best_fitness => {
                self.best_fitness = top.fitness;
                self.stagnation = 0;
            }
            _ => self.stagnation += 1,
        }
    }

    pub fn is_extinction_eligible(&self, max_stagnation: usize) -> bool {
        self.stagnation >= max_stagnation
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::innovation::InnovationRegistry;
    use crate::network::Network;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn genome(id: u64, fitness: f64) -> Genome {
        let mut rng = StdRng::seed_from_u64(id);
        let mut innovations = InnovationRegistry::new();
        let network =
            Network::initialize(1, 1, Activation::Linear, Activation::Linear, false, &mut rng, &mut innovations)
                .unwrap();
        let mut g = Genome::new(id, network);
        g.fitness = fitness;
        g
    }

    #[test]
    fn new_species_starts_with_negative_infinity_best_fitness() {
        let species = Species::new(1, genome(1, 0.5));
        assert_eq!(species.best_fitness, f64::NEG_INFINITY);
        assert_eq!(species.stagnation, 0);
        assert_eq!(species.members.len(), 1);
    }

    #[test]
    fn improvement_resets_stagnation() {
        let mut species = Species::new(1, genome(1, 0.5));
        species.update();
        assert_eq!(species.stagnation, 0);
        assert_eq!(species.best_fitness, 0.5);

        species.members = vec![genome(2, 0.1)];
        species.update();
        assert_eq!(species.stagnation, 1);
        assert_eq!(species.best_fitness, 0.5);
    }

    #[test]
    fn extinction_eligible_once_stagnation_reaches_threshold() {
        let mut species = Species::new(1, genome(1, 1.0));
        species.update();
        for _ in 0..3 {
            species.members = vec![genome(2, 0.0)];
            species.update();
        }
        assert!(species.is_extinction_eligible(3));
        assert!(!species.is_extinction_eligible(4));
    }
}
