use thiserror::Error;

/// Main error type for the Rusty Merge crate.
/// Aggregates errors from various sources including standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum RustyMergeError {
    #[error("{0}")]
    WithContextError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlEscapeError(#[from] quick_xml::escape::EscapeError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    SourceError(#[from] crate::helpers::reader::SourceError),

    // Dataset module errors
    #[error("{0}")]
    DatasetError(#[from] crate::dataset::DatasetError),

    #[error("{0}")]
    ValueError(#[from] crate::dataset::value::ValueError),

    #[error("{0}")]
    RangeError(#[from] crate::spreadsheet::range::RangeError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Document module errors
    #[error("{0}")]
    DocumentError(#[from] crate::document::DocumentError),

    // Merge module errors
    #[error("{0}")]
    MergeError(#[from] crate::merge::MergeError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyMergeError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustyMergeError::WithContextError(format!("{}: {}", message, e)))
    }
}
