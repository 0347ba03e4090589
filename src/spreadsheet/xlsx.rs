use crate::error::RustyMergeError;
use crate::helpers::opc::load_relationships;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::DateSystem;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Cursor;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// An Excel XLSX workbook held in memory
pub(crate) struct XlsxSpreadsheet {
    /// ZIP archive containing the XLSX file contents
    zip: ZipArchive<Cursor<Vec<u8>>>,
    /// Parsed number formats for cell type detection, indexed by style ID
    number_formats: Vec<CellType>,
    /// List of worksheets with (name, zip_path) pairs
    sheets: Vec<(String, String)>,
}

impl XlsxSpreadsheet {
    /// Opens an XLSX workbook and parses its structure
    ///
    /// # Arguments
    /// * `bytes` - Content of the XLSX file
    ///
    /// # Returns
    /// Result containing the initialized XlsxSpreadsheet or an error
    pub(crate) fn open(bytes: Vec<u8>) -> Result<XlsxSpreadsheet, RustyMergeError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let (sheets, date_system) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::WorkbookEmptyError)?
        }
        let number_formats = load_number_formats(&mut zip, date_system)?;
        Ok(XlsxSpreadsheet {
            zip,
            number_formats,
            sheets,
        })
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Loads shared strings from the XLSX file
    ///
    /// Shared strings are stored in a separate XML file and referenced by index
    /// to reduce file size when the same string appears multiple times.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyMergeError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
                shared_strings.push(string);
            }
        });
        Ok(shared_strings)
    }

    /// Reads the first worksheet accepted by the criteria
    ///
    /// Parses the worksheet XML and extracts cells inside the requested range.
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, RustyMergeError> {
        let (sheet_name, zip_path) = self.sheets
            .iter()
            .find(|(name, _)| criteria.accept(name))
            .cloned()
            .ok_or_else(|| SpreadsheetError::SheetNotFoundError(self.sheet_names().join(", ")))?;

        let mut sheet = Sheet::new(&sheet_name, criteria.range);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self.zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                    row_count = number.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                value.clear();
                if sheet.after_row_upper_bound(row) {
                    break;
                } else if sheet.contains(row, col) {
                    kind = event.get_attribute_value("t")?.map(|t| {
                        match t.as_ref() {
                            "inlineStr" | "str" => CellType::InlineString,
                            "s" => CellType::SharedString,
                            "d" => CellType::IsoDateTime,
                            "b" => CellType::Boolean,
                            "e" => CellType::Error,
                            _ => CellType::Number,
                        }
                    }).unwrap_or(CellType::Number);
                    if let Some(format_id) = event.get_attribute_value("s")? {
                        if kind == CellType::Number && !format_id.is_empty() {
                            let index = format_id.parse::<usize>()?;
                            kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                        }
                    }
                } else {
                    kind = CellType::default();
                }
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if kind != CellType::Empty && event.name() == TAG_CELL => {
                if !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    });
                }
                kind = CellType::Empty;
            }
        });
        Ok(sheet)
    }
}

/// Loads workbook structure and worksheet information from XLSX file
///
/// Parses the workbook.xml file to extract worksheet names and their corresponding
/// XML file paths, and determines the date system (1900 vs 1904) used in the file.
fn load_workbook(zip: &mut ZipArchive<Cursor<Vec<u8>>>) -> Result<(Vec<(String, String)>, DateSystem), RustyMergeError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels", "/worksheet")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/_rels/workbook.xml.rels".to_string()))?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut date_system = DateSystem::Excel1900;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&*id) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            let is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
            if is_1904 {
                date_system = DateSystem::Excel1904;
            }
        }
    });
    Ok((sheets, date_system))
}

/// Loads number formats and cell styles from XLSX styles.xml file
///
/// Parses custom number formats and cell style indexes to determine
/// which numeric cells hold dates or times.
///
/// # Returns
/// Vector of CellType values indexed by style ID
fn load_number_formats(zip: &mut ZipArchive<Cursor<Vec<u8>>>, date_system: DateSystem) -> Result<Vec<CellType>, RustyMergeError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, date_system);
                custom_formats.insert(id.to_string(), style);
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.unwrap_or(Cow::Borrowed("0"));
            format_indexes.push(id.to_string());
        }
    });

    let number_formats = format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, date_system))
                .unwrap_or(CellType::Number)
        })
        .collect();
    Ok(number_formats)
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content from XML elements, skipping phonetic text annotations.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the string content
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether to treat the content as text by default
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, RustyMergeError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::value::Value;
    use crate::spreadsheet::read_dataset;
    use chrono::NaiveDate;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="dd/mm/yyyy\ hh:mm"/></numFmts>
<cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="164"/></cellXfs>
</styleSheet>"#;

    fn workbook(sheets: &[(&str, &str)], date1904: bool, shared_strings: &[&str]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut entries = Vec::new();
        let sheet_entries: String = sheets
            .iter()
            .enumerate()
            .map(|(index, (name, _))| format!(r#"<sheet name="{name}" sheetId="{0}" r:id="rId{0}"/>"#, index + 1))
            .collect();
        let properties = if date1904 { r#"<workbookPr date1904="1"/>"# } else { "<workbookPr/>" };
        entries.push((
            "xl/workbook.xml".to_owned(),
            format!(
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{properties}<sheets>{sheet_entries}</sheets></workbook>"#
            ),
        ));
        let relationships: String = (1..=sheets.len())
            .map(|index| format!(r#"<Relationship Id="rId{index}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{index}.xml"/>"#))
            .collect();
        entries.push((
            "xl/_rels/workbook.xml.rels".to_owned(),
            format!(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#),
        ));
        entries.push(("xl/styles.xml".to_owned(), STYLES.to_owned()));
        let strings: String = shared_strings.iter().map(|text| format!("<si><t>{text}</t></si>")).collect();
        entries.push(("xl/sharedStrings.xml".to_owned(), format!("<sst>{strings}</sst>")));
        for (index, (_, rows)) in sheets.iter().enumerate() {
            entries.push((
                format!("xl/worksheets/sheet{}.xml", index + 1),
                format!(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#),
            ));
        }
        for (name, content) in entries {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const CLIENTS: &str = concat!(
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>Since</t></is></c><c r="D1" t="inlineStr"><is><t>Vip</t></is></c><c r="E1" t="inlineStr"><is><t>Last visit</t></is></c></row>"#,
        r#"<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>31</v></c><c r="C2" s="1"><v>45352</v></c><c r="D2" t="b"><v>1</v></c><c r="E2" s="2"><v>45352.5</v></c></row>"#,
        r#"<row r="4"><c r="A4" t="inlineStr"><is><t>Luis &amp; Co</t></is></c><c r="B4" t="e"><v>#DIV/0!</v></c></row>"#,
    );

    #[test]
    fn reads_typed_records() {
        let bytes = workbook(&[("Clients", CLIENTS)], false, &["Name", "Age", "Ana"]);
        let dataset = read_dataset(bytes, &Criteria::default()).unwrap();
        assert_eq!(dataset.columns(), &["Name", "Age", "Since", "Vip", "Last visit"].map(String::from));
        assert_eq!(dataset.len(), 3);

        let records: Vec<_> = dataset.records().collect();
        let march = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(records[0].get("Name"), Some(&Value::from("Ana")));
        assert_eq!(records[0].get("Age"), Some(&Value::Number(31.0)));
        assert_eq!(records[0].get("Since"), Some(&Value::Date(march)));
        assert_eq!(records[0].get("Vip"), Some(&Value::Boolean(true)));
        assert_eq!(records[0].get("Last visit"), Some(&Value::DateTime(march.and_hms_opt(12, 0, 0).unwrap())));
        assert!(records[1].iter().all(|(_, value)| value.is_missing()));
        assert_eq!(records[2].number(), 3);
        assert_eq!(records[2].get("Name"), Some(&Value::from("Luis & Co")));
        assert_eq!(records[2].get("Age"), Some(&Value::from("#DIV/0!")));
        assert_eq!(records[2].get("Since"), Some(&Value::Missing));
    }

    #[test]
    fn date_1904_system() {
        let rows = r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Day</t></is></c></row><row r="2"><c r="A2" s="1"><v>0</v></c></row>"#;
        let dataset = read_dataset(workbook(&[("Days", rows)], true, &[]), &Criteria::default()).unwrap();
        let day = dataset.records().next().unwrap().get("Day").cloned();
        assert_eq!(day, Some(Value::Date(NaiveDate::from_ymd_opt(1904, 1, 1).unwrap())));
    }

    #[test]
    fn selects_sheet_by_pattern() {
        let summary = r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Total</t></is></c></row><row r="2"><c r="A2"><v>3</v></c></row>"#;
        let bytes = workbook(&[("Summary", summary), ("Clients 2024", CLIENTS)], false, &["Name", "Age", "Ana"]);
        let spreadsheet = XlsxSpreadsheet::open(bytes.clone()).unwrap();
        assert_eq!(spreadsheet.sheet_names(), ["Summary", "Clients 2024"]);

        let dataset = read_dataset(bytes.clone(), &Criteria::new(Some("Clients*"), None).unwrap()).unwrap();
        assert_eq!(dataset.columns()[0], "Name");

        let error = read_dataset(bytes, &Criteria::new(Some("Orders"), None).unwrap()).unwrap_err();
        assert!(matches!(
            error,
            RustyMergeError::SpreadsheetError(SpreadsheetError::SheetNotFoundError(ref names)) if names == "Summary, Clients 2024"
        ));
    }

    #[test]
    fn range_selects_header_row() {
        let rows = concat!(
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Report title</t></is></c></row>"#,
            r#"<row r="3"><c r="B3" t="inlineStr"><is><t>Name</t></is></c></row>"#,
            r#"<row r="4"><c r="B4" t="inlineStr"><is><t>Zoe</t></is></c></row>"#,
        );
        let criteria = Criteria::new(None, Some("B3:B10")).unwrap();
        let dataset = read_dataset(workbook(&[("Data", rows)], false, &[]), &criteria).unwrap();
        assert_eq!(dataset.columns(), &["Name".to_owned()]);
        assert_eq!(dataset.records().next().unwrap().get("Name"), Some(&Value::from("Zoe")));
    }

    #[test]
    fn rejects_legacy_and_broken_workbooks() {
        let legacy = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        assert!(matches!(
            read_dataset(legacy, &Criteria::default()),
            Err(RustyMergeError::SpreadsheetError(SpreadsheetError::UnsupportedContainerError))
        ));
        assert!(matches!(
            read_dataset(workbook(&[], false, &[]), &Criteria::default()),
            Err(RustyMergeError::SpreadsheetError(SpreadsheetError::WorkbookEmptyError))
        ));
        assert!(read_dataset(b"not a workbook".to_vec(), &Criteria::default()).is_err());
    }
}
