//! Cartpole balancing via Euler-integrated dynamics. The network takes 4
//! inputs (cart position, cart velocity, pole angle, pole angular
//! velocity) and outputs a force direction; fitness is the number of
//! simulation steps the pole stays balanced.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use neat::{evolve, Config, Genome};

const DT: f64 = 0.02;
const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const POLE_LENGTH: f64 = 0.5;
const FORCE_MAG: f64 = 10.0;
const MAX_STEPS: usize = 500;

fn cartpole_fitness(genome: &mut Genome) -> f64 {
    let (mut x, mut x_dot, mut theta, mut theta_dot) = (0.0, 0.0, 0.05, 0.0);

    let mut steps = 0;
    for _ in 0..MAX_STEPS {
        let inputs = [x, x_dot, theta, theta_dot];
        let output = genome.activate(&inputs).expect("cartpole network always takes 4 inputs");
        let force = if output[0] > 0.5 { FORCE_MAG } else { -FORCE_MAG };

        let costheta = theta.cos();
        let sintheta = theta.sin();
        let temp = (force + MASS_POLE * POLE_LENGTH * theta_dot.powi(2) * sintheta) / (MASS_CART + MASS_POLE);
        let theta_acc = (GRAVITY * sintheta - costheta * temp)
            / (POLE_LENGTH * (4.0 / 3.0 - MASS_POLE * costheta.powi(2) / (MASS_CART + MASS_POLE)));
        let x_acc = temp - MASS_POLE * POLE_LENGTH * theta_acc * costheta / (MASS_CART + MASS_POLE);

        x += DT * x_dot;
        x_dot += DT * x_acc;
        theta += DT * theta_dot;
        theta_dot += DT * theta_acc;
        steps += 1;

        if x.abs() > 2.4 || theta.abs() > 0.209_44 {
            break;
        }
    }
    steps as f64
}

fn main() {
    let mut config = Config::default();
    config.neural_network.num_inputs = 4;
    config.neural_network.num_outputs = 1;
    config.neural_network.input_activation = "tanh".to_string();
    config.neural_network.output_activation = "relu".to_string();
    config.population.population_size = 150;
    config.evolution.max_generations = 50;

    let running = Arc::new(AtomicBool::new(true));
    let winner = evolve(config, cartpole_fitness, running).expect("evolution run should not fail");
    println!("best fitness (steps balanced): {}", winner.fitness);
}
