use crate::error::ResultMessage;
use crate::error::RustyMergeError;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Remote source '{0}' is not supported, download it first")]
    RemoteSourceError(String),

    #[error("Invalid file URL '{0}'")]
    FileUrlError(String),

    #[error("No data in source file '{0}'")]
    EmptySourceError(String),
}

/// Checks if a file name represents a remote URL
pub(crate) fn is_remote_url(file_name: &str) -> bool {
    if let Ok(url) = Url::parse(file_name) {
        // Single letters are Windows drive prefixes such as `C:\data.xlsx`
        url.scheme() != "file" && url.scheme().len() > 1
    } else {
        false
    }
}

/// Resolves a local path or `file://` URL into a filesystem path
pub(crate) fn resolve_path(file_name: &str) -> Result<PathBuf, RustyMergeError> {
    if is_remote_url(file_name) {
        Err(SourceError::RemoteSourceError(file_name.to_owned()))?
    }
    match Url::parse(file_name) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| SourceError::FileUrlError(file_name.to_owned()).into()),
        _ => Ok(PathBuf::from(file_name)),
    }
}

/// Reads a whole source file into memory.
///
/// Inputs are treated like uploads: the bytes are loaded once and every later
/// parse works on the in-memory copy.
///
/// # Arguments
/// * `file_name` - Path or `file://` URL of the file
///
/// # Returns
/// * `Result<Vec<u8>, RustyMergeError>` - File content, never empty
pub fn read_source(file_name: &str) -> Result<Vec<u8>, RustyMergeError> {
    let path = resolve_path(file_name)?;
    let file = File::open(path).map_err(RustyMergeError::from).with_prefix(file_name)?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        Err(SourceError::EmptySourceError(file_name.to_owned()))?;
    }
    Ok(bytes)
}
