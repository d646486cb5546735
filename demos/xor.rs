//! XOR classifier: the end-to-end scenario from spec.md §8. Drives the
//! engine through its public `evolve` entry point rather than touching
//! `Population` directly.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use neat::{evolve, Config, Genome};

const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn xor_fitness(genome: &mut Genome) -> f64 {
    let mut fitness = 4.0;
    for (inputs, expected) in XOR_CASES {
        let output = genome.activate(&inputs).expect("xor network always takes 2 inputs");
        fitness -= (expected - output[0]).abs();
    }
    fitness
}

fn main() {
    let mut config = Config::default();
    config.neural_network.num_inputs = 2;
    config.neural_network.num_outputs = 1;
    config.population.population_size = 150;
    config.evolution.target_species = 15;
    config.evolution.max_generations = 100;
    config.evolution.max_fitness = 3.9;

    let running = Arc::new(AtomicBool::new(true));
    let winner = evolve(config, xor_fitness, running).expect("evolution run should not fail");
    println!("best fitness: {:.3}", winner.fitness);
}
