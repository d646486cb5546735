//! Inverted pendulum swing-up: the pendulum starts hanging down and the
//! network must learn to swing it up and hold it balanced. Same 4-input,
//! 1-output contract as `cartpole.rs`; fitness rewards both progress
//! toward upright and time spent there.

use std::f64::consts::PI;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use neat::{evolve, Config, Genome};

const DT: f64 = 0.02;
const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_PENDULUM: f64 = 0.1;
const PENDULUM_LENGTH: f64 = 0.5;
const FORCE_MAG: f64 = 10.0;
const MAX_STEPS: usize = 500;
const UPRIGHT_THRESHOLD: f64 = 0.2;

fn inverted_pendulum_fitness(genome: &mut Genome) -> f64 {
    let (mut x, mut x_dot, mut theta, mut theta_dot) = (0.0, 0.0, PI, 0.0);

    let mut fitness = 0.0;
    let mut upright_steps = 0;

    for _ in 0..MAX_STEPS {
        let inputs = [x, x_dot, theta, theta_dot];
        let output = genome.activate(&inputs).expect("pendulum network always takes 4 inputs");
        let force = if output[0] > 0.5 { FORCE_MAG } else { -FORCE_MAG };

        let costheta = theta.cos();
        let sintheta = theta.sin();
        let temp =
            (force + MASS_PENDULUM * PENDULUM_LENGTH * theta_dot.powi(2) * sintheta) / (MASS_CART + MASS_PENDULUM);
        let theta_acc = (GRAVITY * sintheta - costheta * temp)
            / (PENDULUM_LENGTH * (4.0 / 3.0 - MASS_PENDULUM * costheta.powi(2) / (MASS_CART + MASS_PENDULUM)));
        let x_acc = temp - MASS_PENDULUM * PENDULUM_LENGTH * theta_acc * costheta / (MASS_CART + MASS_PENDULUM);

        x += DT * x_dot;
        x_dot += DT * x_acc;
        theta += DT * theta_dot;
        theta_dot += DT * theta_acc;
        theta = ((theta + PI) % (2.0 * PI)) - PI;

        if theta.abs() < UPRIGHT_THRESHOLD {
            upright_steps += 1;
            fitness += 1.0;
        } else {
            fitness += 0.1 * (1.0 - (theta.abs() / PI));
        }

        if x.abs() > 2.5 {
            break;
        }
    }

    fitness + (upright_steps as f64) * 2.0
}

fn main() {
    let mut config = Config::default();
    config.neural_network.num_inputs = 4;
    config.neural_network.num_outputs = 1;
    config.neural_network.input_activation = "tanh".to_string();
    config.neural_network.output_activation = "relu".to_string();
    config.population.population_size = 150;
    config.evolution.max_generations = 150;

    let running = Arc::new(AtomicBool::new(true));
    let winner = evolve(config, inverted_pendulum_fitness, running).expect("evolution run should not fail");
    println!("best fitness (swing-up score): {:.1}", winner.fitness);
}
