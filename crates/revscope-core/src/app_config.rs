use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Thresholds shared by the extractor and the tabular pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory that processed tables and embedding matrices are written to.
    pub output_dir: PathBuf,
    /// Minimum character count of cleaned review content.
    pub min_content_len: usize,
    /// Number of leading content characters that take part in the dedup key.
    pub dedup_prefix_chars: usize,
    /// Vocabulary cap for the TF-IDF embedder.
    pub max_features: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./database"),
            min_content_len: 2,
            dedup_prefix_chars: 80,
            max_features: 5000,
        }
    }
}

/// Bounds for the scroll convergence loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub target_count: usize,
    /// Consecutive polls without item growth before the loop gives up.
    pub max_no_growth: u32,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub max_duration: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target_count: 500,
            max_no_growth: 20,
            poll_timeout: Duration::from_millis(8000),
            poll_interval: Duration::from_millis(400),
            max_polls: 200,
            max_duration: Duration::from_secs(600),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub password_salt: Option<String>,
    pub pipeline: PipelineConfig,
    pub crawl: CrawlConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "password_salt",
                &self.password_salt.as_ref().map(|_| "[redacted]"),
            )
            .field("pipeline", &self.pipeline)
            .field("crawl", &self.crawl)
            .finish()
    }
}
