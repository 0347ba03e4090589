mod support;

use rusty_merge::merge::MergeError;
use rusty_merge::{
    generate, generate_with, read_dataset, read_source, validate, Advisory, Criteria, Dataset, Document,
    GenerateOptions, RustyMergeError, Template, Value,
};
use support::docx;
use support::entries;
use support::xlsx;

fn names_dataset(names: &[&str]) -> Dataset {
    let header: &[Option<&str>] = &[Some("Name")];
    let mut rows = vec![header];
    let cells: Vec<[Option<&str>; 1]> = names.iter().map(|name| [Some(*name)]).collect();
    rows.extend(cells.iter().map(|cells| cells.as_slice()));
    read_dataset(xlsx(&rows), &Criteria::default()).unwrap()
}

fn texts(document: &[u8]) -> Vec<String> {
    Document::parse(document).unwrap().texts()
}

#[test]
fn hello_three_names() {
    let dataset = names_dataset(&["Ana", "Luis", "Zoe"]);
    let template = Template::from_bytes(docx(&[&["Hello ", "{{Name}}"]], &[])).unwrap();
    assert!(validate(&dataset, &template, &GenerateOptions::default()).unwrap().is_empty());

    let batch = generate(&dataset, &template).unwrap();
    assert_eq!(batch.success_count, 3);
    assert!(batch.errors.is_empty());

    let documents = entries(&batch.archive);
    let names: Vec<&str> = documents.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["Document_1.docx", "Document_2.docx", "Document_3.docx"]);
    for ((_, bytes), name) in documents.iter().zip(["Ana", "Luis", "Zoe"]) {
        assert_eq!(texts(bytes), [format!("Hello {name}")]);
    }
}

#[test]
fn formatting_and_other_parts_survive() {
    let dataset = names_dataset(&["Ana"]);
    let template = Template::from_bytes(docx(&[&["Dear ", "{{Name}}", ","]], &[])).unwrap();
    let batch = generate(&dataset, &template).unwrap();
    let documents = entries(&batch.archive);
    let parts = entries(&documents[0].1);

    let part_names: Vec<&str> = parts.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(part_names, ["[Content_Types].xml", "_rels/.rels", "word/document.xml", "word/styles.xml"]);
    let main = String::from_utf8(parts[2].1.clone()).unwrap();
    assert!(
        main.contains(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Ana</w:t></w:r>"#),
        "{main}"
    );
    assert!(main.contains(r#"<w:jc w:val="left"/>"#), "{main}");
    assert_eq!(parts[3].1, b"<w:styles/>");

    let document = Document::parse(&documents[0].1).unwrap();
    assert_eq!(document.paragraphs()[0].runs().len(), 3);
}

#[test]
fn table_cells_are_filled() {
    let mut dataset = Dataset::new(["Name", "Total"]).unwrap();
    dataset.push_record([("Name", Value::from("Luis")), ("Total", Value::Number(1250.5))]).unwrap();
    let template = Template::from_bytes(docx(&[&["Invoice for {{Name}}"]], &["{{Name}}", "{{Total}}"])).unwrap();

    let batch = generate(&dataset, &template).unwrap();
    let documents = entries(&batch.archive);
    assert_eq!(texts(&documents[0].1), ["Invoice for Luis", "Luis", "1250.5"]);
}

#[test]
fn line_breaks_and_tabs_stay_in_place() {
    let dataset = names_dataset(&["Ana"]);
    let template = Template::from_bytes(docx(
        &[&["Dear {{Name}}</w:t><w:br/><w:t>Street 5</w:t><w:tab/><w:t>{{Na</w:t><w:br/><w:t>me}}"]],
        &[],
    ))
    .unwrap();
    assert!(validate(&dataset, &template, &GenerateOptions::default()).unwrap().is_empty());

    let batch = generate(&dataset, &template).unwrap();
    let documents = entries(&batch.archive);
    assert_eq!(texts(&documents[0].1), ["Dear Ana\nStreet 5\t{{Na\nme}}"]);
    let main = entries(&documents[0].1)
        .into_iter()
        .find(|(name, _)| name == "word/document.xml")
        .map(|(_, bytes)| String::from_utf8(bytes).unwrap())
        .unwrap();
    assert!(
        main.contains(r#"<w:t xml:space="preserve">Dear Ana</w:t><w:br/><w:t>Street 5</w:t><w:tab/><w:t>{{Na</w:t><w:br/><w:t>me}}</w:t>"#),
        "{main}"
    );
}

#[test]
fn empty_dataset() {
    let dataset = names_dataset(&[]);
    assert!(dataset.is_empty());
    let template = Template::from_bytes(docx(&[&["Hello {{Name}}"]], &[])).unwrap();

    let error = validate(&dataset, &template, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(error, RustyMergeError::MergeError(MergeError::EmptyDatasetError)));

    let batch = generate(&dataset, &template).unwrap();
    assert_eq!(batch.success_count, 0);
    assert!(batch.errors.is_empty());
    assert!(entries(&batch.archive).is_empty());
}

#[test]
fn unrenderable_row_is_skipped() {
    let mut dataset = Dataset::new(["Name", "Signature"]).unwrap();
    dataset.push_row(vec![Value::from("Ana"), Value::from("A.")]).unwrap();
    dataset.push_row(vec![Value::from("Luis"), Value::Binary(vec![0x89, 0x50, 0x4E, 0x47])]).unwrap();
    dataset.push_row(vec![Value::from("Zoe"), Value::from("Z.")]).unwrap();
    let template = Template::from_bytes(docx(&[&["{{Name}} ", "{{Signature}}"]], &[])).unwrap();

    let batch = generate(&dataset, &template).unwrap();
    assert_eq!(batch.success_count, 2);
    assert_eq!(batch.entries, ["Document_1.docx", "Document_3.docx"]);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].row, 2);
    assert!(batch.errors[0].to_string().starts_with("Row 2: "), "{}", batch.errors[0]);

    let documents = entries(&batch.archive);
    assert_eq!(texts(&documents[0].1), ["Ana A."]);
    assert_eq!(texts(&documents[1].1), ["Zoe Z."]);
}

#[test]
fn rows_do_not_leak_into_each_other() {
    let mut dataset = Dataset::new(["Name", "Note"]).unwrap();
    dataset.push_record([("Name", "Ana"), ("Note", "first")]).unwrap();
    dataset.push_record([("Name", "Luis")]).unwrap();
    let template = Template::from_bytes(docx(&[&["{{Name}}: {{Note}}"]], &[])).unwrap();

    let documents = entries(&generate(&dataset, &template).unwrap().archive);
    assert_eq!(texts(&documents[0].1), ["Ana: first"]);
    assert_eq!(texts(&documents[1].1), ["Luis: "]);
}

#[test]
fn same_inputs_same_documents() {
    let dataset = names_dataset(&["Ana", "Luis"]);
    let template = Template::from_bytes(docx(&[&["Hello {{Name}}"]], &["{{Name}}"])).unwrap();
    let first = entries(&generate(&dataset, &template).unwrap().archive);
    let second = entries(&generate(&dataset, &template).unwrap().archive);
    assert_eq!(first, second);
}

#[test]
fn unmatched_and_split_tokens() {
    let dataset = names_dataset(&["Ana"]);
    let template = Template::from_bytes(docx(&[&["{{Name}} {{Unknown}}"], &["{{Na", "me}}"]], &[])).unwrap();

    let advisories = validate(&dataset, &template, &GenerateOptions::default()).unwrap();
    assert_eq!(
        advisories,
        [
            Advisory::UnmatchedPlaceholder("Unknown".to_owned()),
            Advisory::SplitPlaceholder("Name".to_owned()),
        ]
    );

    let batch = generate(&dataset, &template).unwrap();
    assert!(batch.errors.is_empty());
    assert_eq!(texts(&entries(&batch.archive)[0].1), ["Ana {{Unknown}}", "{{Name}}"]);
}

#[test]
fn markup_characters_are_kept_verbatim() {
    let mut dataset = Dataset::new(["Company"]).unwrap();
    dataset.push_record([("Company", "<Smith & Sons>")]).unwrap();
    let template = Template::from_bytes(docx(&[&["{{Company}}"]], &[])).unwrap();

    let documents = entries(&generate(&dataset, &template).unwrap().archive);
    assert_eq!(texts(&documents[0].1), ["<Smith & Sons>"]);
    let main = entries(&documents[0].1)
        .into_iter()
        .find(|(name, _)| name == "word/document.xml")
        .map(|(_, bytes)| String::from_utf8(bytes).unwrap())
        .unwrap();
    assert!(main.contains("&lt;Smith &amp; Sons&gt;"), "{main}");
}

#[test]
fn large_dataset_is_only_advised() {
    let names: Vec<String> = (1..=4).map(|index| format!("Person {index}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let dataset = names_dataset(&names);
    let template = Template::from_bytes(docx(&[&["{{Name}}"]], &[])).unwrap();
    let options = GenerateOptions {
        row_advisory_threshold: 3,
        ..GenerateOptions::default()
    };

    assert_eq!(
        validate(&dataset, &template, &options).unwrap(),
        [Advisory::LargeDataset { rows: 4, threshold: 3 }]
    );
    assert_eq!(generate_with(&dataset, &template, &options).unwrap().success_count, 4);
}

#[test]
fn inputs_from_files() {
    let directory = tempfile::tempdir().unwrap();
    let data_path = directory.path().join("clients.xlsx");
    let template_path = directory.path().join("letter.docx");
    std::fs::write(&data_path, xlsx(&[&[Some("Name"), Some("Age")], &[Some("Ana"), Some("31")]])).unwrap();
    std::fs::write(&template_path, docx(&[&["{{Name}} is {{Age}}"]], &[])).unwrap();

    let data_url = url::Url::from_file_path(&data_path).unwrap();
    let dataset = read_dataset(read_source(data_url.as_str()).unwrap(), &Criteria::default()).unwrap();
    let template = Template::from_bytes(read_source(template_path.to_str().unwrap()).unwrap()).unwrap();

    let batch = generate(&dataset, &template).unwrap();
    assert_eq!(texts(&entries(&batch.archive)[0].1), ["Ana is 31"]);
}

#[test]
fn invalid_template_is_rejected_up_front() {
    let error = Template::from_bytes(xlsx(&[&[Some("Name")]])).unwrap_err();
    assert!(error.to_string().starts_with("Invalid template: "), "{error}");
}
