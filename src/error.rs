use thiserror::Error;

/// Main error type for the trim toolkit.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum TrimError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    RangeError(#[from] crate::spreadsheet::range::RangeError),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Extraction module errors
    #[error("{0}")]
    ExtractError(#[from] crate::extract::ExtractError),
}

impl TrimError {
    /// Returns true for per-sheet conditions that are reported and skipped instead of aborting a run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TrimError::ExtractError(crate::extract::ExtractError::EmptyRegion { .. }))
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, TrimError> {
    fn with_prefix(self, message: &str) -> Self {
        // Recoverable conditions stay typed so callers can still skip them.
        self.map_err(|e| {
            if e.is_recoverable() {
                e
            } else {
                TrimError::WithContextError(format!("{}: {}", message, e))
            }
        })
    }
}
