//! Typed, layered configuration (spec.md §6). Every field has a baked-in
//! default; [`Config::load`] layers an optional TOML file discovered by
//! the caller over those defaults using the `config` crate, mirroring
//! `original_source/sneat/config.py`'s `get_config()` (a user
//! `config.ini` layered over a package-shipped `default_config.ini`).

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetworkConfig {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub input_activation: String,
    pub output_activation: String,
    pub use_normalizer: bool,
}

impl NeuralNetworkConfig {
    pub fn input_activation(&self) -> Activation {
        Activation::from_name(&self.input_activation).unwrap_or(Activation::Linear)
    }

    pub fn output_activation(&self) -> Activation {
        Activation::from_name(&self.output_activation).unwrap_or(Activation::Sigmoid)
    }
}

impl Default for NeuralNetworkConfig {
    fn default() -> Self {
        NeuralNetworkConfig {
            num_inputs: 2,
            num_outputs: 1,
            input_activation: "linear".to_string(),
            output_activation: "sigmoid".to_string(),
            use_normalizer: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub population_size: usize,
    pub compatibility_threshold: f64,
    pub elite_size: usize,
    pub min_species_size: usize,
    pub survival_threshold: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            population_size: 150,
            compatibility_threshold: 3.0,
            elite_size: 2,
            min_species_size: 2,
            survival_threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub max_generations: usize,
    pub max_fitness: f64,
    pub min_species: usize,
    pub target_species: usize,
    pub max_stagnation: usize,
    /// Where the driver reads/writes the whole-population checkpoint
    /// (spec.md §6's `checkpoint.pkl`, replaced by a `bincode` file).
    /// Relative paths are resolved against the running process's working
    /// directory, matching `original_source/sneat/config.py`'s file
    /// discovery.
    pub checkpoint_path: String,
    /// Where the driver writes the best-ever genome on termination
    /// (spec.md §6's `winner.pkl`).
    pub winner_path: String,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        EvolutionConfig {
            max_generations: 100,
            max_fitness: 0.0,
            min_species: 1,
            target_species: 15,
            max_stagnation: 15,
            checkpoint_path: "checkpoint.bin".to_string(),
            winner_path: "winner.bin".to_string(),
        }
    }
}

/// Seven non-negative rates, normalized to a probability distribution by
/// [`crate::genome::Genome::mutate`]. Matches spec.md §4.5's mutation
/// category list exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRates {
    pub add_node: f64,
    pub add_connection: f64,
    pub change_weight: f64,
    pub change_activation: f64,
    pub toggle_connection: f64,
    pub change_bias: f64,
    pub remove_node: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        // `original_source/sneat/config.py`'s `MutationRates` section:
        // structural mutations are rare, weight/bias perturbation common.
        MutationRates {
            add_node: 0.03,
            add_connection: 0.05,
            change_weight: 0.8,
            change_activation: 0.05,
            toggle_connection: 0.02,
            change_bias: 0.8,
            remove_node: 0.01,
        }
    }
}

impl MutationRates {
    /// Normalizes the seven rates into a cumulative distribution used by
    /// `Genome::mutate`'s single weighted sample.
    pub(crate) fn as_distribution(&self) -> [(MutationKind, f64); 7] {
        let total = self.add_node
            + self.add_connection
            + self.change_weight
            + self.change_activation
            + self.toggle_connection
            + self.change_bias
            + self.remove_node;
        let total = if total <= 0.0 { 1.0 } else { total };
        [
            (MutationKind::AddNode, self.add_node / total),
            (MutationKind::AddConnection, self.add_connection / total),
            (MutationKind::ChangeWeight, self.change_weight / total),
            (MutationKind::ChangeActivation, self.change_activation / total),
            (MutationKind::ToggleConnection, self.toggle_connection / total),
            (MutationKind::ChangeBias, self.change_bias / total),
            (MutationKind::RemoveNode, self.remove_node / total),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MutationKind {
    AddNode,
    AddConnection,
    ChangeWeight,
    ChangeActivation,
    ToggleConnection,
    ChangeBias,
    RemoveNode,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub neural_network: NeuralNetworkConfig,
    pub population: PopulationConfig,
    pub evolution: EvolutionConfig,
    pub mutation_rates: MutationRates,
}

impl Config {
    /// Layers `path` (a TOML file with optional `[neural_network]`,
    /// `[population]`, `[evolution]`, `[mutation_rates]` tables) over
    /// [`Config::default`]. Every field has a default, so a missing or
    /// empty file still produces a usable `Config`.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Config, ConfigError> {
        let defaults = Config::default();
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::from(path.as_ref()).required(false))
            .build()?;
        Ok(built.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_baseline() {
        let config = Config::default();
        assert_eq!(config.neural_network.num_inputs, 2);
        assert_eq!(config.population.population_size, 150);
        assert!(config.evolution.max_stagnation > 0);
    }

    #[test]
    fn load_from_empty_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.population.population_size, Config::default().population.population_size);
    }

    #[test]
    fn load_overrides_defaults_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neat.toml");
        std::fs::write(
            &path,
            "[population]\npopulation_size = 42\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.population.population_size, 42);
        assert_eq!(config.neural_network.num_inputs, NeuralNetworkConfig::default().num_inputs);
    }

    #[test]
    fn mutation_rate_distribution_sums_to_one() {
        let rates = MutationRates::default();
        let sum: f64 = rates.as_distribution().iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
