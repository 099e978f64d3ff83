use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to render {path}: {message}")]
    Render { path: String, message: String },

    #[error("unknown chart \"{0}\"")]
    UnknownChart(String),
}
