use core_config::{env_or_default, env_parse, env_required};
use domain_index::{DistanceMetric, IndexDescriptor, PineconeConfig, Placement};
use eyre::{Result, WrapErr};

/// Everything the ingest binary needs, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub store: PineconeConfig,
    pub index: IndexDescriptor,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store =
            PineconeConfig::from_env().wrap_err("Failed to load store configuration")?;

        let metric: DistanceMetric = env_or_default("INDEX_METRIC", "cosine")
            .parse()
            .wrap_err("Failed to parse INDEX_METRIC")?;

        let index = IndexDescriptor::new(
            env_required("INDEX_NAME")?,
            env_parse::<u32>("INDEX_DIMENSION")?,
        )
        .with_metric(metric)
        .with_placement(Placement::new(
            env_or_default("INDEX_CLOUD", "aws"),
            env_or_default("INDEX_REGION", "us-east-1"),
        ));

        Ok(Self { store, index })
    }
}
