use std::path::PathBuf;

/// Errors that can occur while importing marker annotations
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Annotation file does not exist
    #[error("Annotation file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File does not carry the `.xml` extension
    #[error("Annotation file must have an .xml extension: {}", .0.display())]
    InvalidExtension(PathBuf),

    /// File name does not follow the `PL<plate>___P<position>` pattern
    #[error("Cannot derive plate and position from file name: {0}")]
    InvalidFilename(String),

    /// Required child element is missing
    #[error("Missing required element: {0}")]
    MissingElement(String),

    /// Element text could not be interpreted
    #[error("Invalid value for {element}: {value}")]
    InvalidValue {
        /// Element name
        element: String,
        /// Offending text
        value: String,
    },

    /// Frame mapping parameters are unusable
    #[error("Invalid frame mapping: {0}")]
    InvalidFrameMapping(String),

    /// A progress callback stopped the import
    #[error("Annotation import was cancelled")]
    Cancelled,
}
