//! A network plus its fitness bookkeeping, crossover, and mutation
//! dispatch (spec.md §4.5).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{MutationKind, MutationRates};
use crate::error::NetworkError;
use crate::innovation::InnovationRegistry;
use crate::network::Network;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub id: u64,
    pub network: Network,
    pub fitness: f64,
    pub normalized_fitness: f64,
    pub adjusted_fitness: f64,
}

impl Genome {
    pub fn new(id: u64, network: Network) -> Self {
        Genome {
            id,
            network,
            fitness: 0.0,
            normalized_fitness: 0.0,
            adjusted_fitness: 0.0,
        }
    }

    /// Alias for `network.feed_forward`, matching spec.md §4.5 and §6's
    /// `genome.activate(...)` external-interface contract.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.network.feed_forward(inputs)
    }

    /// Deep-clones `fitter` (the parent with higher fitness; ties favor
    /// `g1`) as the child, then for every matching gene — connection
    /// sharing an innovation number, node sharing an id — present in the
    /// *less fit* parent too, re-rolls that field from one of the two
    /// parents. All disjoint/excess genes come from the fitter parent
    /// only, since the child starts as its clone and nothing deletes
    /// them. Activation on a matching node is taken unconditionally from
    /// the less-fit parent — the asymmetry spec.md §9 calls out as
    /// intentional, not a bug to "fix" into symmetry.
    pub fn crossover(g1: &Genome, g2: &Genome, id: u64, rng: &mut impl Rng) -> Genome {
        let (fitter, weaker) = if g1.fitness >= g2.fitness { (g1, g2) } else { (g2, g1) };

        let mut child_network = fitter.network.clone();

        for innovation in fitter.network.connection_innovations().collect::<Vec<_>>() {
            if let Some(weaker_conn) = weaker.network.get_connection(innovation) {
                let weaker_weight = weaker_conn.weight;
                let child_conn = child_network
                    .get_connection_mut(innovation)
                    .expect("innovation came from fitter.network");
                if rng.random_bool(0.5) {
                    child_conn.weight = weaker_weight;
                }
            }
        }

        for node_id in fitter.network.node_ids().collect::<Vec<_>>() {
            if let Some(weaker_node) = weaker.network.get_node(node_id) {
                let weaker_bias = weaker_node.bias;
                let weaker_activation = weaker_node.activation;
                let child_node = child_network
                    .get_node_mut(node_id)
                    .expect("node_id came from fitter.network");
                if rng.random_bool(0.5) {
                    child_node.bias = weaker_bias;
                }
                child_node.activation = weaker_activation;
            }
        }

        Genome::new(id, child_network)
    }

    /// Reads the seven configured mutation rates, normalizes them to a
    /// distribution, samples one category, and invokes the matching
    /// network mutation. Exactly one mutation happens per call.
    pub fn mutate(&mut self, rates: &MutationRates, rng: &mut impl Rng, innovations: &mut InnovationRegistry) {
        let distribution = rates.as_distribution();
        let mut roll = rng.random_range(0.0..1.0);
        let mut chosen = distribution.last().expect("seven entries").0;
        for (kind, probability) in distribution {
            if roll < probability {
                chosen = kind;
                break;
            }
            roll -= probability;
        }

        match chosen {
            MutationKind::AddNode => self.network.add_random_node(rng, innovations),
            MutationKind::AddConnection => self.network.add_random_connection(rng, innovations),
            MutationKind::ChangeWeight => self.network.change_random_weight(rng),
            MutationKind::ChangeActivation => self.network.change_random_activation(rng),
            MutationKind::ToggleConnection => self.network.toggle_random_connection(rng),
            MutationKind::ChangeBias => self.network.change_random_bias(rng),
            MutationKind::RemoveNode => self.network.remove_random_node(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build_genome(id: u64, rng: &mut impl Rng, innovations: &mut InnovationRegistry) -> Genome {
        let network =
            Network::initialize(2, 1, Activation::Linear, Activation::Sigmoid, false, rng, innovations).unwrap();
        Genome::new(id, network)
    }

    #[test]
    fn crossover_of_identical_fitness_genomes_produces_valid_child() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut innovations = InnovationRegistry::new();
        let mut g1 = build_genome(1, &mut rng, &mut innovations);
        g1.fitness = 1.0;
        let mut g2 = g1.clone();
        g2.fitness = 1.0;

        let mut child = Genome::crossover(&g1, &g2, 3, &mut rng);
        assert_eq!(child.id, 3);
        assert!(child.activate(&[0.3, 0.7]).unwrap().len() == 1);
    }

    #[test]
    fn mutate_never_panics_across_many_calls() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut innovations = InnovationRegistry::new();
        let mut genome = build_genome(1, &mut rng, &mut innovations);
        let rates = MutationRates::default();
        for _ in 0..200 {
            genome.mutate(&rates, &mut rng, &mut innovations);
            assert!(genome.activate(&[0.1, 0.2]).is_ok());
        }
    }

    #[test]
    fn clone_round_trips_identical_output() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut innovations = InnovationRegistry::new();
        let mut genome = build_genome(1, &mut rng, &mut innovations);
        let mut cloned = genome.clone();

        let original_output = genome.activate(&[0.4, 0.6]).unwrap();
        let cloned_output = cloned.activate(&[0.4, 0.6]).unwrap();
        assert_eq!(original_output, cloned_output);
    }
}
