//! Delimited-file IO for review tables.
//!
//! Inputs are comma-separated UTF-8 with an optional byte-order mark; outputs
//! are always written with a BOM so spreadsheet tools detect the encoding.

use std::io::Write;
use std::path::Path;

use crate::error::ProcessingError;

const BOM: &str = "\u{feff}";

/// Header plus rows of optional cells; empty cells read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Builds a table, padding or truncating each row to the header width.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_deref()))
    }
}

/// Reads a delimited file.
///
/// # Errors
///
/// Returns [`ProcessingError::Io`] if the file cannot be read and
/// [`ProcessingError::Csv`] if it is not valid delimited text.
pub fn read_table(path: &Path) -> Result<RawTable, ProcessingError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProcessingError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_table(content.strip_prefix(BOM).unwrap_or(&content)).map_err(|source| {
        ProcessingError::Csv {
            path: path.display().to_string(),
            source,
        }
    })
}

fn parse_table(content: &str) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }
    Ok(RawTable::new(headers, rows))
}

/// Reads a delimited file, degrading to an empty table on failure.
///
/// Failures are logged; this never returns an error.
#[must_use]
pub fn load(path: &Path) -> RawTable {
    match read_table(path) {
        Ok(table) => {
            tracing::debug!(path = %path.display(), rows = table.len(), "table loaded");
            table
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load table");
            RawTable::default()
        }
    }
}

/// Writes a header and rows as UTF-8 CSV with a leading BOM, replacing any
/// existing file.
///
/// # Errors
///
/// Returns [`ProcessingError::Io`] or [`ProcessingError::Csv`] naming `path`.
pub fn write_csv<H, R, C>(path: &Path, headers: H, rows: R) -> Result<(), ProcessingError>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<[u8]>,
{
    let io_err = |source| ProcessingError::Io {
        path: path.display().to_string(),
        source,
    };
    let csv_err = |source| ProcessingError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut file = std::fs::File::create(path).map_err(io_err)?;
    file.write_all(BOM.as_bytes()).map_err(io_err)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(headers).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}
