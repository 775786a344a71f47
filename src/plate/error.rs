use std::path::PathBuf;

/// Errors that can occur while reading, writing or querying a plate mapping
#[derive(Debug, thiserror::Error)]
pub enum PlateError {
    /// I/O error reading or writing a mapping file
    #[error("Failed to access mapping file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("TSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Mapping file does not exist
    #[error("Mapping file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Required column missing from the header
    #[error("Missing required mapping column: {0}")]
    MissingColumn(String),

    /// Same position listed twice in one file
    #[error("Duplicate position in mapping file: {0}")]
    DuplicatePosition(String),

    /// Position is not part of this mapping
    #[error("Unknown position: {0}")]
    UnknownPosition(String),

    /// Position is expected but has no record yet
    #[error("Position has no mapping entry: {0}")]
    UnsetPosition(String),

    /// One or more positions have no record
    #[error("Plate mapping is incomplete, {} position(s) unset: {}", .missing.len(), .missing.join(", "))]
    Incomplete {
        /// Positions without a record, in mapping order
        missing: Vec<String>,
    },

    /// Well name could not be parsed
    #[error("Invalid well name: {0}")]
    InvalidWell(String),
}
