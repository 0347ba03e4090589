//! # Document Module
//!
//! Reads and writes Word (`.docx`) packages. Only the main document part is
//! parsed; every other package entry is carried through byte for byte.
pub(crate) mod body;
pub(crate) mod package;
pub mod paragraph;

use crate::document::body::Body;
use crate::document::package::Package;
use crate::document::paragraph::Paragraph;
use crate::document::paragraph::ParagraphMut;
use crate::document::paragraph::Run;
use crate::document::paragraph::SEPARATORS;
use crate::document::paragraph::Table;
use crate::error::ResultMessage;
use crate::error::RustyMergeError;
use crate::merge::substitute::placeholders;
use crate::merge::substitute::token;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised while reading a Word package.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document is password protected or in the legacy binary format; save it as .docx")]
    UnsupportedContainerError,

    #[error("Document part '{0}' is missing")]
    MainPartMissingError(String),

    #[error("Main document part has no body")]
    BodyMissingError,
}

/// A parsed Word document that can be edited paragraph by paragraph and written back.
pub struct Document {
    package: Package,
    body: Body,
}

impl Document {
    /// Parses a `.docx` package
    pub fn parse(bytes: &[u8]) -> Result<Document, RustyMergeError> {
        let package = Package::open(bytes)?;
        let body = Body::parse(package.main_part()).with_prefix(package.main_part_name())?;
        Ok(Document { package, body })
    }

    /// Paragraphs directly under the body
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.body.paragraphs
    }

    /// Top-level tables of the body
    pub fn tables(&self) -> &[Table] {
        &self.body.tables
    }

    /// Every tracked paragraph: body paragraphs first, then the paragraphs of
    /// each table cell in table, row and cell order.
    pub fn all_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        let cells = self
            .body
            .tables
            .iter()
            .flat_map(|table| table.rows.iter())
            .flat_map(|row| row.cells.iter())
            .flat_map(|cell| cell.paragraphs.iter());
        self.body.paragraphs.iter().chain(cells)
    }

    /// Visits every tracked paragraph mutably, in the order of [`Document::all_paragraphs`].
    ///
    /// Stops at the first error returned by the visitor.
    pub fn for_each_paragraph<E, F>(&mut self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&mut ParagraphMut<'_>) -> Result<(), E>,
    {
        let Body { events, paragraphs, tables } = &mut self.body;
        let cells = tables
            .iter_mut()
            .flat_map(|table| table.rows.iter_mut())
            .flat_map(|row| row.cells.iter_mut())
            .flat_map(|cell| cell.paragraphs.iter_mut());
        for paragraph in paragraphs.iter_mut().chain(cells) {
            visit(&mut ParagraphMut { paragraph, events: &mut *events })?;
        }
        Ok(())
    }

    /// Visible text of every tracked paragraph
    pub fn texts(&self) -> Vec<String> {
        self.all_paragraphs().map(Paragraph::text).collect()
    }

    /// Serializes the document into a complete `.docx` package
    pub fn to_bytes(&self) -> Result<Vec<u8>, RustyMergeError> {
        let main_part = self.body.to_xml()?;
        self.package.write(&main_part)
    }
}

/// A validated template package.
///
/// Keeps the source bytes so that every generated document starts from a
/// fresh parse.
#[derive(Clone, Debug)]
pub struct Template {
    source: Vec<u8>,
    placeholders: BTreeSet<String>,
    split_placeholders: BTreeSet<String>,
}

impl Template {
    /// Validates the bytes of a `.docx` template and collects its placeholders
    pub fn from_bytes(source: Vec<u8>) -> Result<Template, RustyMergeError> {
        let document = Document::parse(&source).with_prefix("Invalid template")?;
        let mut in_runs = BTreeSet::new();
        let mut split_placeholders = BTreeSet::new();
        for paragraph in document.all_paragraphs() {
            let paragraph_text = paragraph.text();
            let run_texts: Vec<String> = paragraph.runs().iter().map(Run::text).collect();
            for text in &run_texts {
                in_runs.extend(line_placeholders(text));
            }
            for key in line_placeholders(&paragraph_text) {
                let token = token(&key);
                let whole = count_token(run_texts.iter().map(String::as_str), &token);
                if count_token([paragraph_text.as_str()], &token) > whole {
                    split_placeholders.insert(key);
                }
            }
        }
        Ok(Template {
            source,
            placeholders: in_runs,
            split_placeholders,
        })
    }

    /// Parses a fresh copy of the template
    pub fn open(&self) -> Result<Document, RustyMergeError> {
        Document::parse(&self.source)
    }

    /// Keys of the placeholders that sit inside a single run and can be replaced
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    /// Keys of placeholders whose text is spread over several runs; these are left as is
    pub fn split_placeholders(&self) -> &BTreeSet<String> {
        &self.split_placeholders
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.source
    }
}

/// Placeholder keys that do not cross a tab or line break
fn line_placeholders(text: &str) -> BTreeSet<String> {
    text.split(SEPARATORS).flat_map(placeholders).collect()
}

/// Occurrences of a token that do not cross a tab or line break
fn count_token<'a>(texts: impl IntoIterator<Item = &'a str>, token: &str) -> usize {
    texts
        .into_iter()
        .flat_map(|text| text.split(SEPARATORS))
        .map(|line| line.matches(token).count())
        .sum()
}
