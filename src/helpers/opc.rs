//! Open Packaging Conventions helpers shared by `.xlsx` and `.docx` packages
use crate::error::RustyMergeError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

/// XML tag name for relationship elements in package `.rels` parts
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Signature of Compound File Binary containers (encrypted OOXML, legacy .xls/.doc)
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Loads the relationships of a package part
///
/// # Arguments
/// * `zip` - Zip archive handle
/// * `path` - Path to the relationships XML file within the archive
/// * `kind` - Suffix of the relationship type to keep, e.g. `/worksheet`
///
/// # Returns
/// Mapping of relationship IDs to part paths, or `None` if the `.rels` part does not exist
pub(crate) fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
    kind: &str,
) -> Result<Option<HashMap<String, String>>, RustyMergeError> {
    let mut reader = match zip.xml_reader(path)? {
        Some(reader) => reader,
        None => return Ok(None),
    };
    let base = source_directory(path);
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let relationship_type = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if relationship_type.map(|it| it.ends_with(kind)).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_part_path(&base, &target));
                }
            }
        }
    });
    Ok(Some(relationships))
}

/// Directory that relationship targets of a `.rels` part are relative to.
///
/// `xl/_rels/workbook.xml.rels` describes `xl/workbook.xml`, so its targets resolve against `xl/`.
fn source_directory(rels_path: &str) -> String {
    match rels_path.rfind("_rels/") {
        Some(index) => rels_path[..index].to_owned(),
        None => String::new(),
    }
}

/// Resolves a relationship target to an absolute path inside the zip archive
///
/// # Arguments
/// * `base` - Directory of the source part, with trailing slash or empty
/// * `target` - Target attribute of the relationship
pub(crate) fn to_part_path(base: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None => format!("{base}{target}"),
    };
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => (),
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Checks whether the bytes are a Compound File Binary container rather than a zip package
pub(crate) fn is_compound_file(bytes: &[u8]) -> bool {
    bytes.starts_with(&CFB_SIGNATURE)
}
