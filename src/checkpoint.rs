//! Check-pointing of the best parents.
//!
//! On a configurable cadence the population serializes its best μ
//! individuals, plus the loop bookkeeping needed to resume, to a file
//! named `<directory>/<iteration>_<best_fitness>_<basename>`. The
//! iteration and fitness fields exist for human inspection only;
//! loading always consumes the serialized body.
//!
//! Three interchangeable encodings are supported: human-readable text
//! (JSON), structured markup (YAML) and compact binary (bincode). The
//! binary encoding round-trips bit-exactly; the text encodings preserve
//! floats to full precision.

use crate::error::{Error, Result};
use crate::individual::{fitness_serde, Individual};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The on-disk encoding of a checkpoint body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializationMode {
    /// Human-readable text (JSON).
    #[default]
    Text,
    /// Structured markup (YAML).
    Markup,
    /// Compact binary (bincode); bit-exact round trip.
    Binary,
}

impl std::str::FromStr for SerializationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "json" => Ok(SerializationMode::Text),
            "markup" | "yaml" => Ok(SerializationMode::Markup),
            "binary" => Ok(SerializationMode::Binary),
            other => Err(Error::invalid(format!(
                "unknown serialization mode {other:?} (expected text, markup or binary)"
            ))),
        }
    }
}

impl std::fmt::Display for SerializationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SerializationMode::Text => "text",
            SerializationMode::Markup => "markup",
            SerializationMode::Binary => "binary",
        };
        f.write_str(s)
    }
}

/// Everything a resumed run needs: the best parents in rank order plus
/// the loop bookkeeping. Positions and other per-run identifiers are
/// re-derived on load, never trusted from the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckpointData {
    /// Completed iterations at save time.
    pub iteration: u32,
    /// The improvement watermark driving the stall counter.
    #[serde(with = "fitness_serde")]
    pub best_past_fitness: f64,
    /// Consecutive iterations without improvement at save time.
    pub stall_counter: u32,
    /// The best parents, rank order (best first).
    pub individuals: Vec<Individual>,
}

/// Writes and reads checkpoint files on a configurable cadence.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    directory: PathBuf,
    basename: String,
    mode: SerializationMode,
    interval: i64,
}

impl CheckpointStore {
    /// Creates a store writing `<directory>/<iter>_<fitness>_<basename>`
    /// files in text mode, with check-pointing disabled (interval 0).
    pub fn new(directory: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        CheckpointStore {
            directory: directory.into(),
            basename: basename.into(),
            mode: SerializationMode::default(),
            interval: 0,
        }
    }

    /// Selects the on-disk encoding.
    pub fn with_mode(mut self, mode: SerializationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the cadence: `n > 0` saves every `n`-th iteration, `-1`
    /// saves on every improvement, `0` disables.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for any other negative value.
    pub fn with_interval(mut self, interval: i64) -> Result<Self> {
        if interval < -1 {
            return Err(Error::invalid(format!(
                "checkpoint interval must be -1, 0 or positive, got {interval}"
            )));
        }
        self.interval = interval;
        Ok(self)
    }

    pub fn mode(&self) -> SerializationMode {
        self.mode
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Whether a checkpoint is due after the given iteration.
    pub fn is_due(&self, iteration: u32, improved: bool) -> bool {
        match self.interval {
            -1 => improved,
            0 => false,
            n => u64::from(iteration) % (n as u64) == 0,
        }
    }

    /// Serializes `data` to a fresh checkpoint file.
    ///
    /// Returns the path written. Failures are [`Error::Io`] or
    /// [`Error::Serialization`]; callers treat both as non-fatal.
    pub fn save(&self, best_fitness: f64, data: &CheckpointData) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(format!(
            "{}_{}_{}",
            data.iteration, best_fitness, self.basename
        ));
        let bytes = self.encode(data)?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Reads a checkpoint body back, ignoring the file name entirely.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<CheckpointData> {
        let bytes = fs::read(path.as_ref())?;
        self.decode(&bytes)
    }

    /// The furthest-progressed checkpoint for this store's basename,
    /// if any exist.
    ///
    /// Candidates are ranked by the iteration recorded in their body;
    /// the file name is never parsed. Files that fail to decode in this
    /// store's mode are skipped with a warning.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        let suffix = format!("_{}", self.basename);
        let mut newest: Option<(u32, PathBuf)> = None;
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(&suffix) {
                continue;
            }
            let path = entry.path();
            let data = match self.load(&path) {
                Ok(data) => data,
                Err(err) => {
                    tracing::warn!(?path, %err, "skipping undecodable checkpoint");
                    continue;
                }
            };
            let candidate = (data.iteration, path);
            newest = match newest {
                Some(current) if current.0 >= candidate.0 => Some(current),
                _ => Some(candidate),
            };
        }
        Ok(newest.map(|(_, path)| path))
    }

    fn encode(&self, data: &CheckpointData) -> Result<Vec<u8>> {
        match self.mode {
            SerializationMode::Text => serde_json::to_vec_pretty(data)
                .map_err(|e| Error::Serialization(e.to_string())),
            SerializationMode::Markup => serde_yaml::to_string(data)
                .map(String::into_bytes)
                .map_err(|e| Error::Serialization(e.to_string())),
            SerializationMode::Binary => {
                bincode::serialize(data).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<CheckpointData> {
        match self.mode {
            SerializationMode::Text => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            SerializationMode::Markup => {
                serde_yaml::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            SerializationMode::Binary => {
                bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptor::{GaussAdaptor, RealAdaptor};
    use crate::parameter::{BoundedRealParameter, Parameter, ParameterSet};

    fn sample_data() -> CheckpointData {
        let individuals: Vec<Individual> = (0..3)
            .map(|i| {
                let mut p =
                    BoundedRealParameter::new(f64::from(i) * 0.25, -10.0, 10.0).unwrap();
                p.add_adaptor(RealAdaptor::Gauss(
                    GaussAdaptor::with_shape(0.5, 0.01, 1e-7, 5.0).unwrap(),
                ));
                let set: ParameterSet = [Parameter::BoundedReal(p)].into_iter().collect();
                let mut ind = Individual::new(set);
                let obj = |ps: &ParameterSet| -> std::result::Result<f64, String> {
                    Ok(ps.real_value(0).unwrap_or(0.0).powi(2))
                };
                ind.fitness(&obj, false);
                ind.mark_as_parent();
                ind
            })
            .collect();
        CheckpointData {
            iteration: 17,
            best_past_fitness: 0.0625,
            stall_counter: 2,
            individuals,
        }
    }

    #[test]
    fn test_round_trip_all_modes() {
        let data = sample_data();
        for mode in [
            SerializationMode::Text,
            SerializationMode::Markup,
            SerializationMode::Binary,
        ] {
            let dir = tempfile::tempdir().unwrap();
            let store = CheckpointStore::new(dir.path(), "pop.cp").with_mode(mode);
            let path = store.save(0.0625, &data).unwrap();
            let back = store.load(&path).unwrap();
            assert_eq!(back.iteration, 17);
            assert_eq!(back.stall_counter, 2);
            assert_eq!(back.best_past_fitness, 0.0625);
            assert_eq!(back.individuals.len(), 3);
            for (a, b) in data.individuals.iter().zip(back.individuals.iter()) {
                assert!(a.approx_eq(b, 1e-10), "round trip drifted in {mode:?}");
            }
        }
    }

    #[test]
    fn test_binary_round_trip_is_bit_exact() {
        let data = sample_data();
        let store = CheckpointStore::new("unused", "pop.cp").with_mode(SerializationMode::Binary);
        let bytes = store.encode(&data).unwrap();
        let back = store.decode(&bytes).unwrap();
        let bytes_again = store.encode(&back).unwrap();
        assert_eq!(bytes, bytes_again);
    }

    #[test]
    fn test_round_trip_preserves_dirty_flag() {
        let mut data = sample_data();
        data.individuals[1].mark_dirty();
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "pop.cp");
        let path = store.save(1.0, &data).unwrap();
        let back = store.load(&path).unwrap();
        assert!(!back.individuals[0].is_dirty());
        assert!(back.individuals[1].is_dirty());
    }

    #[test]
    fn test_file_name_encodes_iteration_and_fitness() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "best.cp");
        let path = store.save(0.125, &sample_data()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "17_0.125_best.cp"
        );
    }

    #[test]
    fn test_latest_picks_furthest_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "pop.cp");
        let mut data = sample_data();
        store.save(1.0, &data).unwrap();
        data.iteration = 18;
        let second = store.save(0.5, &data).unwrap();
        data.iteration = 5;
        store.save(2.0, &data).unwrap();
        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest, second);
    }

    #[test]
    fn test_latest_ignores_other_basenames() {
        let dir = tempfile::tempdir().unwrap();
        let other = CheckpointStore::new(dir.path(), "other.cp");
        other.save(1.0, &sample_data()).unwrap();
        let store = CheckpointStore::new(dir.path(), "pop.cp");
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_latest_on_missing_directory() {
        let store = CheckpointStore::new("/nonexistent/parevo-cp-dir", "pop.cp");
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_interval_validation_and_cadence() {
        let store = CheckpointStore::new("d", "b");
        assert!(store.clone().with_interval(-2).is_err());

        let disabled = store.clone().with_interval(0).unwrap();
        assert!(!disabled.is_due(10, true));

        let every_third = store.clone().with_interval(3).unwrap();
        assert!(every_third.is_due(0, false));
        assert!(!every_third.is_due(2, false));
        assert!(every_third.is_due(3, false));

        let on_improvement = store.with_interval(-1).unwrap();
        assert!(on_improvement.is_due(5, true));
        assert!(!on_improvement.is_due(6, false));
    }
}
