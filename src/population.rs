//! Orchestrates speciation, reproduction, and threshold adaptation
//! (spec.md §4.7). The canonical genome container is `species`; `genomes`
//! is the flattened view spec.md §3 describes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::config::Config;
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::network::Network;
use crate::species::Species;

const DISJOINT_COEFFICIENT: f64 = 1.0;
const EXCESS_COEFFICIENT: f64 = 1.0;
const WEIGHT_DIFF_COEFFICIENT: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    config: Config,
    innovations: InnovationRegistry,
    next_genome_id: u64,
    next_species_id: u64,
    species: Vec<Species>,
    pub generation: usize,
    pub compatibility_threshold: f64,
    pub best_genome_seen: Option<Genome>,
}

impl Population {
    /// Creates `population_size` fresh genomes, each a minimal network
    /// per spec.md §4.4, and speciates them with no pre-existing
    /// species — every genome seeds or joins a new species.
    pub fn initialize(config: Config, rng: &mut impl Rng) -> Population {
        let mut innovations = InnovationRegistry::new();
        let mut next_genome_id = 0u64;

        let mut genomes = Vec::with_capacity(config.population.population_size);
        for _ in 0..config.population.population_size {
            let network = Network::initialize(
                config.neural_network.num_inputs,
                config.neural_network.num_outputs,
                config.neural_network.input_activation(),
                config.neural_network.output_activation(),
                config.neural_network.use_normalizer,
                rng,
                &mut innovations,
            )
            .expect("config carries num_inputs >= 1 and num_outputs >= 1");
            genomes.push(Genome::new(next_genome_id, network));
            next_genome_id += 1;
        }

        let compatibility_threshold = config.population.compatibility_threshold;
        let mut population = Population {
            config,
            innovations,
            next_genome_id,
            next_species_id: 0,
            species: Vec::new(),
            generation: 0,
            compatibility_threshold,
            best_genome_seen: None,
        };
        population.speciate(genomes, rng);
        population
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Flattened view of every genome across every species.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.species.iter().flat_map(|s| s.members.iter())
    }

    pub fn genomes_mut(&mut self) -> impl Iterator<Item = &mut Genome> {
        self.species.iter_mut().flat_map(|s| s.members.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.species.iter().map(Species::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tracks the best genome ever observed across the population's
    /// entire lifetime; stores a clone so later mutation of the living
    /// genome never retroactively changes the recorded best (spec.md §9
    /// Open Question — this is the single place `best_genome_seen` is
    /// ever written).
    pub fn record_best_genome_seen(&mut self) {
        let current_best = self
            .genomes()
            .max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap());
        if let Some(candidate) = current_best {
            let improves = match &self.best_genome_seen {
                None => true,
                Some(best) => candidate.fitness > best.fitness,
            };
            if improves {
                self.best_genome_seen = Some(candidate.clone());
            }
        }
    }

    /// `measure_genetic_distance(g1, g2)` from spec.md §4.7. The
    /// disjoint/excess collapse (`excess := |union| - |intersection|`,
    /// which is arithmetically identical to `disjoint`) is preserved
    /// verbatim — it doubles the effective symmetric-difference
    /// coefficient to 2.0, and the spec requires this for reproducibility
    /// rather than the textbook NEAT formula that tells them apart.
    pub fn measure_genetic_distance(g1: &Genome, g2: &Genome) -> f64 {
        let node_distance = {
            let a: std::collections::HashSet<u64> = g1.network.node_ids().collect();
            let b: std::collections::HashSet<u64> = g2.network.node_ids().collect();
            let max_len = a.len().max(b.len());
            if max_len == 0 {
                0.0
            } else {
                let disjoint = a.symmetric_difference(&b).count() as f64;
                let union_len = a.union(&b).count() as f64;
                let intersection_len = a.intersection(&b).count() as f64;
                let excess = union_len - intersection_len;
                (EXCESS_COEFFICIENT * excess + DISJOINT_COEFFICIENT * disjoint) / max_len as f64
            }
        };

        let connection_distance = {
            let a: std::collections::HashSet<u64> = g1.network.connection_innovations().collect();
            let b: std::collections::HashSet<u64> = g2.network.connection_innovations().collect();
            let max_len = a.len().max(b.len());
            if max_len == 0 {
                0.0
            } else {
                let disjoint = a.symmetric_difference(&b).count() as f64;
                let union_len = a.union(&b).count() as f64;
                let intersection_len = a.intersection(&b).count() as f64;
                let excess = union_len - intersection_len;
                let weight_diff: f64 = a
                    .intersection(&b)
                    .map(|&innovation| {
                        let w1 = g1.network.get_connection(innovation).unwrap().weight;
                        let w2 = g2.network.get_connection(innovation).unwrap().weight;
                        (w1 - w2).abs()
                    })
                    .sum();
                (EXCESS_COEFFICIENT * excess
                    + DISJOINT_COEFFICIENT * disjoint
                    + WEIGHT_DIFF_COEFFICIENT * weight_diff)
                    / max_len as f64
            }
        };

        node_distance + connection_distance
    }

    /// Re-speciates `candidates` over the current species list (spec.md
    /// §4.7's `speciate`): reselect each existing representative as the
    /// nearest candidate, assign the remainder by threshold, then adapt
    /// the compatibility threshold toward `target_species`.
    fn speciate(&mut self, mut candidates: Vec<Genome>, _rng: &mut impl Rng) {
        let mut next_generation: Vec<Species> = Vec::with_capacity(self.species.len());

        for species in &self.species {
            if candidates.is_empty() {
                continue;
            }
            let nearest_index = (0..candidates.len())
                .min_by(|&i, &j| {
                    let di = Population::measure_genetic_distance(&species.representative, &candidates[i]);
                    let dj = Population::measure_genetic_distance(&species.representative, &candidates[j]);
                    di.partial_cmp(&dj).unwrap()
                })
                .expect("candidates is non-empty");
            let representative = candidates.remove(nearest_index);
            next_generation.push(Species::new(species.id, representative));
        }

        for candidate in candidates.into_iter().rev() {
            let nearest = next_generation
                .iter_mut()
                .map(|s| (Population::measure_genetic_distance(&s.representative, &candidate), s))
                .min_by(|(d1, _), (d2, _)| d1.partial_cmp(d2).unwrap());

            match nearest {
                Some((distance, species)) if distance < self.compatibility_threshold => {
                    species.members.push(candidate);
                }
                _ => {
                    let id = self.next_species_id;
                    self.next_species_id += 1;
                    next_generation.push(Species::new(id, candidate));
                }
            }
        }

        let species_count = next_generation.len();
        self.species = next_generation;

        if species_count < self.config.evolution.target_species {
            self.compatibility_threshold *= 0.97;
        } else {
            self.compatibility_threshold = self.config.population.compatibility_threshold;
        }
    }

    /// The six-step reproduction pipeline of spec.md §4.7.
    pub fn reproduce(&mut self, rng: &mut impl Rng) {
        // 1. Fitness normalization.
        let (min_fitness, max_fitness) = {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for genome in self.genomes() {
                min = min.min(genome.fitness);
                max = max.max(genome.fitness);
            }
            (min, max)
        };
        let max_fitness = if max_fitness == min_fitness { max_fitness + 1e-4 } else { max_fitness };
        let range = max_fitness - min_fitness;
        for genome in self.genomes_mut() {
            genome.normalized_fitness = if range > 0.0 {
                (genome.fitness - min_fitness) / range
            } else {
                0.0
            };
        }

        // 2. Stagnation update + adjusted fitness.
        for species in &mut self.species {
            species.update();
            let size = species.size() as f64;
            for member in &mut species.members {
                member.adjusted_fitness = (member.normalized_fitness / size).max(1e-4);
            }
        }

        // 3. Extinction pass.
        let mut offspring: Vec<Genome> = Vec::new();
        let min_species = self.config.evolution.min_species.max(1);
        let max_stagnation = self.config.evolution.max_stagnation;
        let elite_size = self.config.population.elite_size;
        loop {
            if self.species.len() <= min_species {
                break;
            }
            let mut stagnant_indices: Vec<usize> = self
                .species
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_extinction_eligible(max_stagnation))
                .map(|(i, _)| i)
                .collect();
            if stagnant_indices.is_empty() {
                break;
            }
            stagnant_indices.sort_by(|&i, &j| {
                self.species[j]
                    .best_fitness
                    .partial_cmp(&self.species[i].best_fitness)
                    .unwrap()
            });
            let lowest = *stagnant_indices.last().expect("non-empty");
            let mut doomed = self.species.remove(lowest);
            doomed.members.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());
            offspring.extend(doomed.members.into_iter().take(elite_size));
        }

        // 4. Per-species reproduction.
        let total_adjusted: f64 = self.species.iter().flat_map(|s| s.members.iter()).map(|g| g.adjusted_fitness).sum();
        let population_size = self.config.population.population_size;
        let min_species_size = self.config.population.min_species_size;
        let survival_threshold = self.config.population.survival_threshold;
        let mutation_rates = self.config.mutation_rates.clone();

        for species in &mut self.species {
            species.members.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());
            let elite_count = species.members.len().min(elite_size);
            offspring.extend(species.members.iter().take(elite_count).cloned());

            if species.members.len() > min_species_size + elite_size {
                let keep = ((species.members.len() as f64) * survival_threshold + 1.0).floor() as usize;
                species.members.truncate(keep.max(1));
            }

            let species_adjusted: f64 = species.members.iter().map(|g| g.adjusted_fitness).sum();
            let allowed_offspring = if total_adjusted > 0.0 {
                ((species_adjusted / total_adjusted) * population_size as f64).floor() as usize
            } else {
                0
            }
            .max(min_species_size);

            if species.members.len() <= 1 {
                continue;
            }

            // `allowed_offspring` already counts the elites cloned above
            // (original_source/sneat/population.py:85-111 starts its
            // `while len(s_offspring) < allowed_offspring` loop from the
            // elite-seeded list), so only the remainder is bred here.
            let weights: Vec<f64> = species.members.iter().map(|g| g.adjusted_fitness.max(1e-9)).collect();
            for _ in 0..allowed_offspring.saturating_sub(elite_count) {
                let parent1 = weighted_choice(&species.members, &weights, rng);
                let parent2 = weighted_choice(&species.members, &weights, rng);
                let id = self.next_genome_id;
                self.next_genome_id += 1;
                let mut child = Genome::crossover(parent1, parent2, id, rng);
                child.mutate(&mutation_rates, rng, &mut self.innovations);
                offspring.push(child);
            }
        }

        // 5. Advance generation counter.
        self.generation += 1;

        // 6. Re-speciation over the full offspring pool.
        self.speciate(offspring, rng);
    }
}

fn weighted_choice<'a>(members: &'a [Genome], weights: &[f64], rng: &mut impl Rng) -> &'a Genome {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return members.choose(rng).expect("members is non-empty");
    }
    let mut roll = rng.random_range(0.0..total);
    for (member, &weight) in members.iter().zip(weights) {
        if roll < weight {
            return member;
        }
        roll -= weight;
    }
    members.last().expect("members is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn genome_with(id: u64, fitness: f64) -> Genome {
        let mut rng = StdRng::seed_from_u64(id + 1);
        let mut innovations = InnovationRegistry::new();
        let network =
            Network::initialize(2, 1, Activation::Linear, Activation::Sigmoid, false, &mut rng, &mut innovations)
                .unwrap();
        let mut g = Genome::new(id, network);
        g.fitness = fitness;
        g
    }

    #[test]
    fn initialize_builds_requested_population_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = Config::default();
        let population = Population::initialize(config.clone(), &mut rng);
        assert_eq!(population.len(), config.population.population_size);
    }

    #[test]
    fn genetic_distance_of_genome_with_itself_is_zero_and_symmetric() {
        let g = genome_with(1, 0.5);
        let other = genome_with(2, 0.9);
        assert_eq!(Population::measure_genetic_distance(&g, &g), 0.0);
        let d1 = Population::measure_genetic_distance(&g, &other);
        let d2 = Population::measure_genetic_distance(&other, &g);
        assert!((d1 - d2).abs() < 1e-12);
    }

    #[test]
    fn reproduction_keeps_every_genome_id_unique() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut config = Config::default();
        config.population.population_size = 20;
        config.evolution.target_species = 3;
        let mut population = Population::initialize(config, &mut rng);

        for (i, genome) in population.genomes_mut().enumerate() {
            genome.fitness = (i % 5) as f64;
        }
        population.reproduce(&mut rng);

        let ids: Vec<u64> = population.genomes().map(|g| g.id).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn reproduction_does_not_grow_population_unboundedly_across_generations() {
        // Regression test: per-species reproduction must count cloned
        // elites *toward* `allowed_offspring`, not on top of it, or total
        // population size drifts upward by roughly `species_count *
        // elite_size` every generation (spec.md §4.7 step 4e).
        let mut rng = StdRng::seed_from_u64(4);
        let mut config = Config::default();
        config.population.population_size = 30;
        config.evolution.target_species = 5;
        let mut population = Population::initialize(config, &mut rng);
        let baseline = population.len();

        for gen in 0..20 {
            for (i, genome) in population.genomes_mut().enumerate() {
                genome.fitness = ((i + gen) % 7) as f64;
            }
            population.reproduce(&mut rng);
            assert!(
                population.len() <= baseline * 4,
                "population grew from {baseline} to {} by generation {gen}",
                population.len()
            );
        }
    }

    #[test]
    fn stagnant_species_is_removed_after_max_stagnation_reproductions() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut config = Config::default();
        config.evolution.max_stagnation = 3;
        config.evolution.min_species = 1;
        config.population.population_size = 10;

        let mut population = Population::initialize(config, &mut rng);
        // Force two species, one of which never improves.
        let stuck = Species::new(99, genome_with(1000, 1.0));
        population.species.push(stuck);

        for gen in 0..5 {
            for genome in population.genomes_mut() {
                genome.fitness = if genome.id == 1000 { 1.0 } else { gen as f64 + 0.1 };
            }
            population.reproduce(&mut rng);
        }

        assert!(!population.species().iter().any(|s| s.id == 99));
    }
}
