use crate::dataset::Dataset;
use crate::dataset::Record;
use crate::document::paragraph::TextRuns;
use crate::document::Template;
use crate::error::ResultMessage;
use crate::error::RustyMergeError;
use crate::merge::archive::ArchiveBuilder;
use crate::merge::substitute::substitute;
use crate::merge::GenerateOptions;
use std::fmt;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// A row whose document could not be produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RowError {
    /// Row number (1-based)
    pub row: usize,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

/// Result of a batch run.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Zip archive holding one document per successful row
    pub archive: Vec<u8>,
    pub success_count: usize,
    /// Failed rows in ascending row order
    pub errors: Vec<RowError>,
    /// Entry names written to the archive, in row order
    pub entries: Vec<String>,
}

enum RowOutcome {
    Rendered { row: usize, document: Vec<u8> },
    Failed(RowError),
}

/// Generates one document per dataset row with default options.
pub fn generate(dataset: &Dataset, template: &Template) -> Result<Batch, RustyMergeError> {
    generate_with(dataset, template, &GenerateOptions::default())
}

/// Generates one document per dataset row and packs them into a zip archive.
///
/// A row that fails to render is recorded in [`Batch::errors`] and the batch
/// moves on to the next row. Failures while writing the archive abort the whole batch.
///
/// # Arguments
/// * `dataset` - Rows to merge; an empty dataset yields an empty archive
/// * `template` - Template every document starts from
/// * `options` - Entry naming
pub fn generate_with(
    dataset: &Dataset,
    template: &Template,
    options: &GenerateOptions,
) -> Result<Batch, RustyMergeError> {
    info!(rows = dataset.len(), columns = dataset.columns().len(), "generating documents");
    let mut archive = ArchiveBuilder::new();
    let mut errors = Vec::new();

    for outcome in dataset.records().map(|record| render_outcome(template, &record)) {
        match outcome {
            RowOutcome::Rendered { row, document } => {
                let name = options.entry_name(row);
                archive.add(&name, &document)?;
                debug!(row, entry = %name, bytes = document.len(), "document rendered");
            }
            RowOutcome::Failed(error) => {
                warn!(row = error.row, error = %error.message, "row skipped");
                errors.push(error);
            }
        }
    }

    let (archive, entries) = archive.finish()?;
    info!(succeeded = entries.len(), failed = errors.len(), "batch finished");
    Ok(Batch {
        archive,
        success_count: entries.len(),
        errors,
        entries,
    })
}

fn render_outcome(template: &Template, record: &Record) -> RowOutcome {
    match render_row(template, record) {
        Ok(document) => RowOutcome::Rendered { row: record.number(), document },
        Err(error) => RowOutcome::Failed(RowError {
            row: record.number(),
            message: error.to_string(),
        }),
    }
}

/// Renders the document of one row: fresh template, every column substituted
/// in every tracked paragraph, serialized package.
pub fn render_row(template: &Template, record: &Record) -> Result<Vec<u8>, RustyMergeError> {
    let mut document = template.open()?;
    document.for_each_paragraph(|paragraph| substitute_record(paragraph, record).map(|_| ()))?;
    document.to_bytes()
}

/// Substitutes every column of a record into one paragraph, in column order.
///
/// # Returns
/// Number of run rewrites
pub fn substitute_record<P: TextRuns + ?Sized>(paragraph: &mut P, record: &Record) -> Result<usize, RustyMergeError> {
    let mut rewritten = 0;
    for (key, value) in record.iter() {
        rewritten += substitute(paragraph, key, value)
            .map_err(RustyMergeError::from)
            .with_prefix(&format!("Column '{key}'"))?;
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::value::Value;
    use crate::document::fixture::docx;
    use crate::document::fixture::paragraph;
    use crate::document::Document;
    use std::io::Cursor;
    use std::io::Read;
    use zip::ZipArchive;

    fn names(names: &[&str]) -> Dataset {
        let mut dataset = Dataset::new(["Name"]).unwrap();
        for name in names {
            dataset.push_record([("Name", *name)]).unwrap();
        }
        dataset
    }

    fn entry_texts(archive: &[u8]) -> Vec<(String, Vec<String>)> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
        (0..zip.len())
            .map(|index| {
                let mut file = zip.by_index(index).unwrap();
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).unwrap();
                (file.name().to_owned(), Document::parse(&bytes).unwrap().texts())
            })
            .collect()
    }

    #[test]
    fn one_document_per_row() {
        let template = Template::from_bytes(docx(&paragraph(&["Hello ", "{{Name}}"]))).unwrap();
        let batch = generate(&names(&["Ana", "Luis", "Zoe"]), &template).unwrap();

        assert_eq!(batch.success_count, 3);
        assert!(batch.errors.is_empty());
        assert_eq!(batch.entries, ["Document_1.docx", "Document_2.docx", "Document_3.docx"]);
        assert_eq!(
            entry_texts(&batch.archive),
            vec![
                ("Document_1.docx".to_owned(), vec!["Hello Ana".to_owned()]),
                ("Document_2.docx".to_owned(), vec!["Hello Luis".to_owned()]),
                ("Document_3.docx".to_owned(), vec!["Hello Zoe".to_owned()]),
            ]
        );
    }

    #[test]
    fn empty_dataset_gives_empty_archive() {
        let template = Template::from_bytes(docx(&paragraph(&["{{Name}}"]))).unwrap();
        let batch = generate(&names(&[]), &template).unwrap();
        assert_eq!(batch.success_count, 0);
        assert!(batch.errors.is_empty());
        assert!(entry_texts(&batch.archive).is_empty());
    }

    #[test]
    fn failed_row_is_isolated() {
        let mut dataset = Dataset::new(["Name", "Photo"]).unwrap();
        dataset.push_row(vec![Value::from("Ana"), Value::Missing]).unwrap();
        dataset.push_row(vec![Value::from("Luis"), Value::Binary(vec![1, 2, 3])]).unwrap();
        dataset.push_row(vec![Value::from("Zoe"), Value::Missing]).unwrap();
        let template = Template::from_bytes(docx(&paragraph(&["{{Name}}", "[{{Photo}}]"]))).unwrap();

        let batch = generate(&dataset, &template).unwrap();
        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.entries, ["Document_1.docx", "Document_3.docx"]);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].row, 2);
        assert!(batch.errors[0].message.contains("Photo"), "{}", batch.errors[0]);

        let texts = entry_texts(&batch.archive);
        assert_eq!(texts[0].1, ["Ana[]"]);
        assert_eq!(texts[1].1, ["Zoe[]"]);
    }

    #[test]
    fn unmatched_and_split_tokens_stay() {
        let body = format!("{}{}", paragraph(&["{{Name}} {{Unknown}}"]), paragraph(&["{{Na", "me}}"]));
        let template = Template::from_bytes(docx(&body)).unwrap();
        let batch = generate(&names(&["Ana"]), &template).unwrap();
        assert!(batch.errors.is_empty());
        assert_eq!(entry_texts(&batch.archive)[0].1, ["Ana {{Unknown}}", "{{Name}}"]);
    }

    #[test]
    fn same_inputs_same_output() {
        let template = Template::from_bytes(docx(&paragraph(&["Hello {{Name}}"]))).unwrap();
        let dataset = names(&["Ana", "Luis"]);
        let first = generate(&dataset, &template).unwrap();
        let second = generate(&dataset, &template).unwrap();
        assert_eq!(first.entries, second.entries);
        assert_eq!(entry_texts(&first.archive), entry_texts(&second.archive));
    }

    #[test]
    fn custom_entry_names() {
        let template = Template::from_bytes(docx(&paragraph(&["{{Name}}"]))).unwrap();
        let options = GenerateOptions {
            entry_prefix: "Letter".to_owned(),
            extension: "docm".to_owned(),
            ..GenerateOptions::default()
        };
        let batch = generate_with(&names(&["Ana"]), &template, &options).unwrap();
        assert_eq!(batch.entries, ["Letter_1.docm"]);
    }

    #[test]
    fn substitute_record_counts_rewrites() {
        let mut dataset = Dataset::new(["First", "Last"]).unwrap();
        dataset.push_record([("First", "Ana"), ("Last", "Diaz")]).unwrap();
        let record = dataset.records().next().unwrap();
        let mut runs = vec!["{{First}}".to_owned(), " ".to_owned(), "{{Last}}, {{First}}".to_owned()];
        assert_eq!(substitute_record(&mut runs, &record).unwrap(), 3);
        assert_eq!(runs, ["Ana", " ", "Diaz, Ana"]);
    }
}
