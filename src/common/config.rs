use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::common::error::{ErrorCode, Result};
use crate::graphlab_ensure;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "GRAPHLAB";

/// Engine configuration: numeric tolerances, size guards and retry budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// PageRank damping factor (alpha)
    pub pagerank_damping: f64,
    /// PageRank L1 convergence tolerance per node
    pub pagerank_tolerance: f64,
    pub pagerank_max_iterations: usize,
    /// Eigenvector centrality convergence tolerance per node
    pub eigenvector_tolerance: f64,
    pub eigenvector_max_iterations: usize,
    /// Largest graph accepted by O(V^3) all-pairs passes
    pub max_all_pairs_nodes: usize,
    /// Largest graph accepted by maximal clique enumeration
    pub max_clique_nodes: usize,
    /// Cap on the number of tied shortest paths reported
    pub max_enumerated_paths: usize,
    /// Rejection-sampling budget for a single preferential attachment step
    pub growth_retry_limit: usize,
    /// Retries for generators that can fail (connected Watts-Strogatz, random regular)
    pub generator_retry_limit: usize,
    /// Fruchterman-Reingold iterations for the spring layout
    pub spring_iterations: usize,
    /// Layout applied when a graph is constructed
    pub default_layout: String,
    /// Fixed RNG seed; entropy-seeded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            pagerank_damping: 0.85,
            pagerank_tolerance: 1e-10,
            pagerank_max_iterations: 1000,
            eigenvector_tolerance: 1e-9,
            eigenvector_max_iterations: 10_000,
            max_all_pairs_nodes: 1500,
            max_clique_nodes: 5000,
            max_enumerated_paths: 10_000,
            growth_retry_limit: 100_000,
            generator_retry_limit: 100,
            spring_iterations: 50,
            default_layout: "random".to_string(),
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, an optional TOML file and
    /// `GRAPHLAB_*` environment variables, in that order of precedence
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true)
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!("Loaded engine configuration: {:?}", config);
        Ok(config)
    }

    /// Parse configuration from a TOML string on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = config::Config::builder()
            .add_source(config::Config::try_from(&EngineConfig::default())?)
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no algorithm can work with
    pub fn validate(&self) -> Result<()> {
        graphlab_ensure!(
            self.pagerank_damping > 0.0 && self.pagerank_damping < 1.0,
            ErrorCode::BadParameter,
            "pagerank_damping must lie in (0, 1), got {}", self.pagerank_damping
        );
        graphlab_ensure!(
            self.pagerank_tolerance > 0.0 && self.eigenvector_tolerance > 0.0,
            ErrorCode::BadParameter,
            "tolerances must be positive"
        );

        let limits = [
            ("pagerank_max_iterations", self.pagerank_max_iterations),
            ("eigenvector_max_iterations", self.eigenvector_max_iterations),
            ("max_all_pairs_nodes", self.max_all_pairs_nodes),
            ("max_clique_nodes", self.max_clique_nodes),
            ("max_enumerated_paths", self.max_enumerated_paths),
            ("growth_retry_limit", self.growth_retry_limit),
            ("generator_retry_limit", self.generator_retry_limit),
        ];
        for (name, value) in limits {
            graphlab_ensure!(value > 0, ErrorCode::BadParameter, "{} must be greater than zero", name);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pagerank_damping, 0.85);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_all_pairs_nodes = 42").unwrap();
        writeln!(file, "rng_seed = 7").unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_all_pairs_nodes, 42);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.spring_iterations, 50);
    }

    #[test]
    fn test_invalid_damping_rejected() {
        let err = EngineConfig::from_toml_str("pagerank_damping = 1.5").unwrap_err();
        assert_eq!(err.error_code(), crate::common::error::ErrorCode::BadParameter);
    }

    #[test]
    fn test_toml_rendering_reloads() {
        let mut config = EngineConfig::default();
        config.growth_retry_limit = 10;
        let rendered = config.to_toml_string().unwrap();
        let reloaded = EngineConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reloaded, config);
    }
}
