//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation live in a
//! config file; command-line flags take precedence:
//!
//! ```toml
//! # cecog.toml
//! [paths]
//! mapping_dir = "/screens/exp42/mappings"
//! class_definitions = "/screens/exp42/classes.txt"
//!
//! [timing]
//! timelapse_seconds = 270.0
//!
//! [annotation]
//! first_frame = 1
//! frame_step = 4
//!
//! [hmm]
//! max_iterations = 200
//! tolerance = 1e-5
//! emission_floor = 1e-4
//! confidence = 0.9
//! pseudo_count = 1.0
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use cecog::annotation::FrameMapping;
use cecog::hmm::FitOptions;
use cecog::time::TimeConverter;

/// Root configuration structure for cecog.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Input file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Time-lapse settings.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Annotation import settings.
    #[serde(default)]
    pub annotation: AnnotationConfig,

    /// Track correction settings.
    #[serde(default)]
    pub hmm: HmmConfig,
}

/// Input file locations.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory with one mapping file per plate.
    pub mapping_dir: Option<PathBuf>,

    /// Class definition file.
    pub class_definitions: Option<PathBuf>,
}

/// Time-lapse settings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Seconds between two frames.
    pub timelapse_seconds: Option<f64>,
}

/// Annotation import settings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationConfig {
    /// Frame of the first marker slice.
    pub first_frame: Option<u32>,

    /// Frames between marker slices.
    pub frame_step: Option<u32>,
}

/// Track correction settings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HmmConfig {
    /// Upper bound on Baum-Welch iterations.
    pub max_iterations: Option<usize>,

    /// Log-likelihood convergence threshold.
    pub tolerance: Option<f64>,

    /// Minimum emission probability after each M-step.
    pub emission_floor: Option<f64>,

    /// Probability that the classifier reports the true class.
    pub confidence: Option<f64>,

    /// Pseudo count added to label transition counts.
    pub pseudo_count: Option<f64>,
}

impl HmmConfig {
    /// Default classifier confidence for the initial emission matrix.
    pub const DEFAULT_CONFIDENCE: f64 = 0.8;

    /// Default pseudo count for the initial transition matrix.
    pub const DEFAULT_PSEUDO_COUNT: f64 = 1.0;
}

impl Config {
    /// Load the config file if one was given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Frame mapping from flags, falling back to the config and then to 1/1.
    pub fn frame_mapping(&self, first_frame: Option<u32>, frame_step: Option<u32>) -> Result<FrameMapping> {
        let first = first_frame.or(self.annotation.first_frame).unwrap_or(1);
        let step = frame_step.or(self.annotation.frame_step).unwrap_or(1);
        FrameMapping::new(first, step).context("Invalid annotation frame settings")
    }

    /// Time converter from the flag or the config, if either sets an interval.
    pub fn timelapse(&self, flag: Option<f64>) -> Result<Option<TimeConverter>> {
        flag.or(self.timing.timelapse_seconds)
            .map(|seconds| TimeConverter::new(seconds).context("Invalid time-lapse setting"))
            .transpose()
    }

    /// Baum-Welch options with config overrides applied.
    pub fn fit_options(&self) -> FitOptions {
        let defaults = FitOptions::default();
        FitOptions {
            max_iterations: self.hmm.max_iterations.unwrap_or(defaults.max_iterations),
            tolerance: self.hmm.tolerance.unwrap_or(defaults.tolerance),
            emission_floor: self.hmm.emission_floor.unwrap_or(defaults.emission_floor),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [paths]
            mapping_dir = "/data/mappings"

            [timing]
            timelapse_seconds = 270.0

            [annotation]
            first_frame = 5
            frame_step = 2

            [hmm]
            max_iterations = 20
            confidence = 0.95
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.paths.mapping_dir, Some(PathBuf::from("/data/mappings")));
        assert_eq!(config.timing.timelapse_seconds, Some(270.0));
        assert_eq!(config.hmm.confidence, Some(0.95));

        let mapping = config.frame_mapping(None, None).unwrap();
        assert_eq!(mapping.frame_for(2), 7);

        let options = config.fit_options();
        assert_eq!(options.max_iterations, 20);
        assert_eq!(options.tolerance, FitOptions::default().tolerance);
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::from_str("[annotation]\nframe_step = 3\n").unwrap();
        let mapping = config.frame_mapping(Some(10), Some(1)).unwrap();
        assert_eq!(mapping.frame_for(3), 12);

        let conv = config.timelapse(Some(60.0)).unwrap().unwrap();
        assert_eq!(conv.timelapse(), 60.0);
        assert!(config.timelapse(None).unwrap().is_none());
    }

    #[test]
    fn test_invalid_values() {
        let config = Config::from_str("[annotation]\nframe_step = 0\n").unwrap();
        assert!(config.frame_mapping(None, None).is_err());

        let config = Config::from_str("[timing]\ntimelapse_seconds = -1.0\n").unwrap();
        assert!(config.timelapse(None).is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::from_str("[timing]\ntimelapse = 3.0\n").is_err());
        assert!(Config::from_str("[plotting]\nenabled = true\n").is_err());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.timing.timelapse_seconds, None);
        assert_eq!(config.frame_mapping(None, None).unwrap(), FrameMapping::default());
    }
}
