use std::path::Path;

use qualex_core::{SCENE_COUNT, StimulusCatalog};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Experiment configuration, read from TOML. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub num_questions: u32,
    /// Graded stimuli; entries `2k` and `2k + 1` are the two directions of scene `k`.
    pub stimuli: Vec<String>,
    pub training_stimulus: Option<String>,
    /// When set, direction flips are seeded from `plan_seed + participant id`.
    pub plan_seed: Option<u64>,
    /// Inclusive range for fallback participant ids.
    pub fallback_id_range: (u64, u64),
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let scenes = [
            "den_1_perf_2",
            "nathalie_1_perf_3",
            "philipp_1_perf_5",
            "philipp_1_perf_6",
            "simone_2_perf_3",
            "thanos_2_perf_2",
        ];
        let stimuli = scenes
            .iter()
            .flat_map(|scene| {
                [
                    format!("videos/{scene}_GS_PCD.mp4"),
                    format!("videos/{scene}_PCD_GS.mp4"),
                ]
            })
            .collect();
        Self {
            num_questions: (2 * SCENE_COUNT) as u32,
            stimuli,
            training_stimulus: Some("videos/training.mp4".to_string()),
            plan_seed: None,
            fallback_id_range: (1, 1_000_000),
        }
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected = 2 * SCENE_COUNT;
        if self.stimuli.len() != expected {
            return Err(ConfigError::Invalid(format!(
                "expected {expected} stimuli ({SCENE_COUNT} scenes x 2 directions), found {}",
                self.stimuli.len()
            )));
        }
        if self.num_questions as usize != self.stimuli.len() {
            return Err(ConfigError::Invalid(format!(
                "num_questions is {} but the catalog holds {} stimuli",
                self.num_questions,
                self.stimuli.len()
            )));
        }
        if let Some(pos) = self.stimuli.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("stimulus {pos} has an empty source")));
        }
        if matches!(&self.training_stimulus, Some(s) if s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "training_stimulus is empty".to_string(),
            ));
        }
        let (lo, hi) = self.fallback_id_range;
        if lo > hi {
            return Err(ConfigError::Invalid(format!(
                "fallback_id_range [{lo}, {hi}] is empty"
            )));
        }
        Ok(())
    }

    pub fn catalog(&self) -> StimulusCatalog {
        StimulusCatalog::new(self.stimuli.iter().cloned(), self.training_stimulus.clone())
    }
}
