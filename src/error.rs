use thiserror::Error;

/// Main error type for the databook facts extension.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub(crate) enum DatabookError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    GlobError(#[from] glob::GlobError),

    #[error("{0}")]
    DuckDBError(#[from] duckdb::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    UnifiedReaderError(#[from] crate::helpers::reader::UnifiedReaderError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    GridError(#[from] crate::spreadsheet::grid::GridError),

    // Extension module errors
    #[error("{0}")]
    ExtensionError(#[from] crate::extension::ExtensionError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, DatabookError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| DatabookError::WithContextError(format!("{}: {}", message, e)))
    }
}
