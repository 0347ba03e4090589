use crate::document::DocumentError;
use crate::error::RustyMergeError;
use crate::helpers::opc::is_compound_file;
use crate::helpers::opc::load_relationships;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipArchive;
use zip::ZipWriter;

/// Main part used when the package relationships do not name one
const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Package relationships part
const PACKAGE_RELATIONSHIPS: &str = "_rels/.rels";

/// One zip entry of a package, kept as read
struct PackageEntry {
    name: String,
    compression: CompressionMethod,
    modified: Option<DateTime>,
    is_dir: bool,
    data: Vec<u8>,
}

/// Every entry of a `.docx` package held in memory, in archive order.
pub(crate) struct Package {
    entries: Vec<PackageEntry>,
    main_part: usize,
}

impl Package {
    /// Reads all entries of a package and locates its main document part
    pub(crate) fn open(bytes: &[u8]) -> Result<Package, RustyMergeError> {
        if is_compound_file(bytes) {
            Err(DocumentError::UnsupportedContainerError)?
        }
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let main_part_name = load_relationships(&mut zip, PACKAGE_RELATIONSHIPS, "/officeDocument")?
            .and_then(|relationships| relationships.into_values().min())
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_owned());

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_owned(),
                compression: file.compression(),
                modified: file.last_modified(),
                is_dir: file.is_dir(),
                data,
            });
        }

        let main_part = entries
            .iter()
            .position(|entry| entry.name.trim_start_matches('/').eq_ignore_ascii_case(&main_part_name))
            .ok_or(DocumentError::MainPartMissingError(main_part_name))?;
        Ok(Package { entries, main_part })
    }

    pub(crate) fn main_part_name(&self) -> &str {
        &self.entries[self.main_part].name
    }

    pub(crate) fn main_part(&self) -> &[u8] {
        &self.entries[self.main_part].data
    }

    /// Writes the package back with a new main part
    ///
    /// Entry order, names, timestamps and compression (stored or deflated)
    /// follow the source package.
    pub(crate) fn write(&self, main_part: &[u8]) -> Result<Vec<u8>, RustyMergeError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (index, entry) in self.entries.iter().enumerate() {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let mut options = SimpleFileOptions::default().compression_method(compression);
            if let Some(modified) = entry.modified {
                options = options.last_modified_time(modified);
            }
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                let data = if index == self.main_part { main_part } else { &entry.data };
                writer.write_all(data)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}
