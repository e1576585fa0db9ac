use thiserror::Error;

/// Why a photo's GPS tags could not be turned into a location.
///
/// Both variants are per-photo: the batch downgrades that photo to an
/// unlocated record and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The photo carries no GPS tag group at all.
    #[error("missing geotag")]
    MissingGeotag,
    /// GPS tags are present but do not form a valid coordinate.
    #[error("malformed geotag ({tag}): {reason}")]
    MalformedGeotag { tag: &'static str, reason: String },
}

impl ConversionError {
    pub(crate) fn malformed(tag: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedGeotag {
            tag,
            reason: reason.into(),
        }
    }
}

/// Failure while producing an export document or archive.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error while exporting: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
