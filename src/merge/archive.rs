use crate::error::RustyMergeError;
use crate::merge::MergeError;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipWriter;

/// In-memory zip archive collecting the generated documents.
pub(crate) struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: Vec<String>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> ArchiveBuilder {
        ArchiveBuilder {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(DateTime::default()),
            entries: Vec::new(),
        }
    }

    /// Adds one document under the given entry name
    pub(crate) fn add(&mut self, name: &str, data: &[u8]) -> Result<(), RustyMergeError> {
        self.writer
            .start_file(name, self.options)
            .map_err(|error| MergeError::ArchiveError(format!("{name}: {error}")))?;
        self.writer
            .write_all(data)
            .map_err(|error| MergeError::ArchiveError(format!("{name}: {error}")))?;
        self.entries.push(name.to_owned());
        Ok(())
    }

    /// Writes the central directory and returns the archive bytes with the entry names
    pub(crate) fn finish(self) -> Result<(Vec<u8>, Vec<String>), RustyMergeError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|error| MergeError::ArchiveError(error.to_string()))?;
        Ok((cursor.into_inner(), self.entries))
    }
}
