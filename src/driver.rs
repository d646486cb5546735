//! Generation loop: parallel evaluation, stats reporting, reproduction,
//! checkpointing, termination (spec.md §4.8). Translated from
//! `original_source/sneat/evolve.py`'s `evolve`/`evaluate_population`/
//! `print_stats`: `multiprocessing.Pool(cpu_count() - 1)` becomes a
//! `rayon` thread pool, `tqdm`/`print` becomes `tracing`, `pickle` becomes
//! `bincode` (see `checkpoint.rs`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::checkpoint::{load_checkpoint, save_checkpoint, save_genome};
use crate::config::Config;
use crate::error::EvolutionError;
use crate::genome::Genome;
use crate::population::Population;

const CHECKPOINT_EVERY_N_GENERATIONS: usize = 10;

/// `evolve(fitness_fn) -> Genome` from spec.md §6. `fitness_fn` is called
/// once per genome per generation, in parallel across a worker pool
/// sized to all but one logical processor — the Rust analog of the
/// original's `mp.Pool(mp.cpu_count() - 1)`.
///
/// `running` lets an embedder request early termination (e.g. from its
/// own `Ctrl-C` handler) without this crate depending on any
/// signal-handling crate itself; it is checked once per generation
/// boundary, after that generation's reproduction has completed, matching
/// spec.md §5's "suspension points" note that only the evaluation barrier
/// may block. At least one generation always runs, even if `running` is
/// already `false` on entry, so a best-ever genome always exists to save.
pub fn evolve(
    config: Config,
    fitness_fn: impl Fn(&mut Genome) -> f64 + Sync,
    running: Arc<AtomicBool>,
) -> Result<Genome, EvolutionError> {
    install_default_tracing_subscriber();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_worker_threads())
        .build()
        .expect("thread pool configuration is valid");

    // Reproduction's randomness is the run's only source of evolutionary
    // non-determinism (spec.md §5), so it is seeded from OS entropy rather
    // than a fixed constant: otherwise every call with the same config and
    // fitness function would retrace the identical sequence of mutations
    // and produce a bit-for-bit identical winner, defeating spec.md §8's
    // "best of three seeded runs" scenario.
    let mut rng = StdRng::from_os_rng();
    let mut population = match load_checkpoint(&config.evolution.checkpoint_path)? {
        Some(population) => population,
        None => Population::initialize(config.clone(), &mut rng),
    };

    let max_generations = config.evolution.max_generations;
    let max_fitness = config.evolution.max_fitness;

    // A do-while shape: the suspension point spec.md §5 documents is the
    // evaluation barrier inside the loop body, so `running` is only
    // consulted once a generation has actually completed. This guarantees
    // `best_genome_seen` is populated before the loop can exit, even if
    // `running` is already false (or flips false) before the first
    // generation finishes.
    loop {
        pool.install(|| {
            let mut genomes: Vec<&mut Genome> = population.genomes_mut().collect();
            genomes.into_par_iter().for_each(|genome| {
                genome.fitness = fitness_fn(genome);
            });
        });

        report_generation(&population);
        population.record_best_genome_seen();

        let best_fitness_this_generation = population
            .genomes()
            .map(|g| g.fitness)
            .fold(f64::NEG_INFINITY, f64::max);

        population.reproduce(&mut rng);

        if population.generation % CHECKPOINT_EVERY_N_GENERATIONS == 0 {
            save_checkpoint(&population, &config.evolution.checkpoint_path)?;
        }

        let reached_max_fitness = max_fitness != 0.0 && best_fitness_this_generation >= max_fitness;
        let reached_max_generations = max_generations != 0 && population.generation >= max_generations;
        if reached_max_fitness || reached_max_generations || !running.load(Ordering::Relaxed) {
            break;
        }
    }

    let winner = population
        .best_genome_seen
        .clone()
        .expect("the loop body always runs at least once before checking `running`");
    save_genome(&winner, &config.evolution.winner_path)?;
    Ok(winner)
}

fn num_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

fn install_default_tracing_subscriber() {
    use tracing_subscriber::fmt;
    // `try_init` so an embedding application's own subscriber is never
    // clobbered if this is called more than once or after setup elsewhere.
    let _ = fmt().with_target(false).try_init();
}

fn report_generation(population: &Population) {
    let genome_count = population.len();
    let best = population.genomes().map(|g| g.fitness).fold(f64::NEG_INFINITY, f64::max);
    let average = if genome_count > 0 {
        population.genomes().map(|g| g.fitness).sum::<f64>() / genome_count as f64
    } else {
        0.0
    };

    tracing::info!(
        generation = population.generation,
        threshold = population.compatibility_threshold,
        population_size = genome_count,
        species_count = population.species().len(),
        average_fitness = average,
        best_fitness = best,
        "generation report"
    );

    for species in population.species() {
        tracing::debug!(
            species_id = species.id,
            members = species.size(),
            best_fitness = species.best_fitness,
            stagnation = species.stagnation,
            "species report"
        );
    }
}
