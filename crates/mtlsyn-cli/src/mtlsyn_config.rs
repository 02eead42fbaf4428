//! Configuration options of the mtlsyn synthesizer
//!
//! Options can be provided in a configuration file or through environment
//! variables with the `MTLSYN` prefix; the environment takes precedence.

use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Weights of the composite heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct CompositeWeights {
    /// Weight of the time heuristic
    #[serde(default = "default_time_weight")]
    pub(crate) time: i64,
    /// Weight of the environment-preference heuristic
    #[serde(default = "default_environment_weight")]
    pub(crate) environment: i64,
    /// Weight of the word-count heuristic
    #[serde(default = "default_canonical_words_weight")]
    pub(crate) canonical_words: i64,
}

fn default_time_weight() -> i64 {
    16
}

fn default_environment_weight() -> i64 {
    4
}

fn default_canonical_words_weight() -> i64 {
    1
}

impl Default for CompositeWeights {
    fn default() -> Self {
        CompositeWeights {
            time: default_time_weight(),
            environment: default_environment_weight(),
            canonical_words: default_canonical_words_weight(),
        }
    }
}

/// Type representing the configuration options of the synthesizer
///
/// This type implements `serde::Deserialize` to easily parse the
/// configuration out of structured configuration sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct MTLSynConfig {
    /// Weights of the composite heuristic
    composite: Option<CompositeWeights>,
}

impl MTLSynConfig {
    /// The weights of the composite heuristic, falling back to the defaults
    pub(crate) fn get_composite_weights(&self) -> CompositeWeights {
        self.composite.unwrap_or_default()
    }
}

/// Load the configuration from the optional file and the environment
pub(crate) fn load_configuration(
    config_file: Option<PathBuf>,
) -> Result<MTLSynConfig, anyhow::Error> {
    let mut settings = config::Config::builder();
    if let Some(config_file) = config_file {
        if !config_file.exists() {
            return Err(anyhow::anyhow!(
                "Specified configuration file '{}' does not exist.",
                config_file.display()
            ));
        }
        settings = settings.add_source(config::File::from(config_file));
    }
    settings = settings.add_source(config::Environment::with_prefix("MTLSYN"));
    settings
        .build()
        .with_context(|| "Failed to assemble the configuration")?
        .try_deserialize::<MTLSynConfig>()
        .with_context(|| "Failed to parse the configuration")
}
