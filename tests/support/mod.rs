use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipArchive;
use zip::ZipWriter;

fn package(entries: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Workbook with one sheet of inline-string and number cells; `None` leaves a cell empty
pub fn xlsx(rows: &[&[Option<&str>]]) -> Vec<u8> {
    let sheet_data: String = rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cells: String = cells
                .iter()
                .enumerate()
                .filter_map(|(col, cell)| cell.map(|text| (col, text)))
                .map(|(col, text)| {
                    let reference = format!("{}{}", (b'A' + col as u8) as char, row + 1);
                    match text.parse::<f64>() {
                        Ok(_) => format!(r#"<c r="{reference}"><v>{text}</v></c>"#),
                        Err(_) => format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#),
                    }
                })
                .collect();
            format!(r#"<row r="{}">{cells}</row>"#, row + 1)
        })
        .collect();
    package(&[
        (
            "xl/workbook.xml",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_owned(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_owned(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#),
        ),
    ])
}

/// Word document whose body holds the given paragraphs, each a list of bold or plain runs
pub fn docx(paragraphs: &[&[&str]], table_cells: &[&str]) -> Vec<u8> {
    let paragraph = |runs: &[&str]| -> String {
        let runs: String = runs
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let properties = if index % 2 == 1 { "<w:rPr><w:b/></w:rPr>" } else { "" };
                format!(r#"<w:r>{properties}<w:t xml:space="preserve">{text}</w:t></w:r>"#)
            })
            .collect();
        format!("<w:p><w:pPr><w:jc w:val=\"left\"/></w:pPr>{runs}</w:p>")
    };
    let mut body: String = paragraphs.iter().map(|runs| paragraph(*runs)).collect();
    if !table_cells.is_empty() {
        let cells: String = table_cells
            .iter()
            .map(|text| format!("<w:tc>{}</w:tc>", paragraph(&[*text])))
            .collect();
        body.push_str(&format!("<w:tbl><w:tr>{cells}</w:tr></w:tbl>"));
    }
    package(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_owned(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.to_owned(),
        ),
        (
            "word/document.xml",
            format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#),
        ),
        ("word/styles.xml", "<w:styles/>".to_owned()),
    ])
}

/// Names and raw bytes of every entry of a zip archive
pub fn entries(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..zip.len())
        .map(|index| {
            let mut file = zip.by_index(index).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_owned(), bytes)
        })
        .collect()
}
