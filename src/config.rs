use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Sweeps over all nodes of one level before the local pass gives up.
pub const MAX_SWEEPS: usize = 32;

/// Aggregation levels before the detector stops.
pub const MAX_LEVELS: usize = 16;

/// A move must beat staying put by more than this.
pub const MIN_GAIN: f64 = 1e-10;

pub const RESOLUTION: f64 = 1.0;

/// Sources handled by one parallel betweenness task.
pub const CENTRALITY_CHUNK_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub max_sweeps: usize,
    pub max_levels: usize,
    pub min_gain: f64,
    pub resolution: f64,
    pub noise: usize, // Communities with at most this many members are left unassigned.
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            max_sweeps: MAX_SWEEPS,
            max_levels: MAX_LEVELS,
            min_gain: MIN_GAIN,
            resolution: RESOLUTION,
            noise: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    pub parallel: bool,
    pub chunk_size: usize,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        CentralityConfig {
            parallel: false,
            chunk_size: CENTRALITY_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parallel: bool, // Run detector and calculator side by side.
    pub worker_threads: usize,
    pub detector: DetectorConfig,
    pub centrality: CentralityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            parallel: false,
            worker_threads: num_cpus::get(),
            detector: DetectorConfig::default(),
            centrality: CentralityConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open config {}", path.display()))?;
        let config: AnalysisConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod test_config {
    use std::io::Write;

    use crate::config::{AnalysisConfig, MAX_LEVELS, MAX_SWEEPS};

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "parallel: true\ndetector:\n  max_sweeps: 4\n  noise: 1\n").unwrap();
        let config = AnalysisConfig::from_yaml_file(file.path()).unwrap();
        assert!(config.parallel);
        assert_eq!(config.detector.max_sweeps, 4);
        assert_eq!(config.detector.noise, 1);
        assert_eq!(config.detector.max_levels, MAX_LEVELS);
        assert!(!config.centrality.parallel);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_yaml_file("no/such/config.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to open config"));
    }

    #[test]
    fn test_default() {
        let config = AnalysisConfig::default();
        assert_eq!(config.detector.max_sweeps, MAX_SWEEPS);
        assert!(!config.parallel);
    }
}
