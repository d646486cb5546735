//! `Population`/`Genome` persistence as opaque `bincode`-encoded files
//! (spec.md §6). Mirrors `original_source/sneat/evolve.py`'s
//! `save_checkpoint`/`load_checkpoint`/`save_genome`, with pickle
//! replaced by `bincode` and `FileNotFoundError` replaced by `Ok(None)`
//! rather than an error — spec.md §7 treats a missing checkpoint as
//! non-error.

use std::fs;
use std::path::Path;

use crate::error::CheckpointError;
use crate::genome::Genome;
use crate::population::Population;

pub fn save_checkpoint(population: &Population, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
    let bytes = bincode::serde::encode_to_vec(population, bincode::config::standard())?;
    fs::write(path, bytes)?;
    Ok(())
}

/// `Ok(None)` when `path` does not exist, matching `evolve.py`'s
/// `except FileNotFoundError: return None`. Any other I/O or decode
/// failure is a real error — a corrupt checkpoint should not be silently
/// treated as absent.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Option<Population>, CheckpointError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let (population, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(Some(population))
}

pub fn save_genome(genome: &Genome, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
    let bytes = bincode::serde::encode_to_vec(genome, bincode::config::standard())?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn load_genome(path: impl AsRef<Path>) -> Result<Option<Genome>, CheckpointError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let (genome, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(Some(genome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::innovation::InnovationRegistry;
    use crate::network::Network;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn load_checkpoint_returns_none_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.bin");
        assert!(load_checkpoint(&path).unwrap().is_none());
    }

    #[test]
    fn genome_round_trips_through_save_and_load() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut innovations = InnovationRegistry::new();
        let network =
            Network::initialize(2, 1, Activation::Linear, Activation::Sigmoid, false, &mut rng, &mut innovations)
                .unwrap();
        let mut genome = Genome::new(1, network);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("winner.bin");
        save_genome(&genome, &path).unwrap();
        let mut loaded = load_genome(&path).unwrap().expect("file exists");

        assert_eq!(genome.activate(&[0.2, 0.8]).unwrap(), loaded.activate(&[0.2, 0.8]).unwrap());
    }
}
