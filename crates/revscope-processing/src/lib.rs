//! Tabular review pipeline: per-site cleaning, feature derivation, TF-IDF
//! embeddings and exploratory summaries.

mod chart;
pub mod eda;
pub mod embedding_eda;
pub mod error;
pub mod pipeline;
pub mod table;
pub mod tfidf;

pub use eda::{summarize_table, EdaOptions, EdaReport, TableChart};
pub use embedding_eda::{summarize_embeddings, REPORT_FILE_NAME};
pub use error::ProcessingError;
pub use pipeline::{
    format_rating, weekday_name, write_embeddings, write_table, CalendarFeatures, CleanOutput,
    CleanReport, CleanRow, PersistReport, ReviewRow, ReviewTable, RunSummary, SiteProcessor,
};
pub use table::{load, read_table, write_csv, RawTable};
pub use tfidf::{EmbeddingMatrix, TfidfVectorizer};
