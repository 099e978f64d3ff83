use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("page source error: {0}")]
    Source(String),

    #[error("timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: &'static str, waited_ms: u64 },

    #[error("failed to read capture file {path}: {source}")]
    CaptureIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse capture file {path}: {source}")]
    CaptureParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid page size {0}; must be at least 1")]
    InvalidPageSize(usize),
}
