pub mod app_config;
pub mod config;
pub mod records;
pub mod sites;

pub use app_config::{AppConfig, CrawlConfig, Environment, PipelineConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{NormalizedRecord, RawRecord};
pub use sites::{
    load_site_profiles, CleanPolicy, ColumnMap, OutputNaming, ReviewSite, SiteProfile,
    DEFAULT_BOILERPLATE,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read site profiles from {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse site profiles: {0}")]
    SitesFileParse(#[from] serde_yaml::Error),

    #[error("unknown review site '{0}' (expected google, kakao or tripdotcom)")]
    UnknownSite(String),

    #[error("validation error: {0}")]
    Validation(String),
}
