use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use std::borrow::Cow;

/// Characters standing for `w:tab` and `w:br`/`w:cr` in run text
pub const SEPARATORS: [char; 2] = ['\t', '\n'];

/// Ordered runs of formatted text whose texts can be read and replaced one by one.
pub trait TextRuns {
    /// Number of runs in the paragraph
    fn run_count(&self) -> usize;

    /// Text of one run; tabs read as `\t`, line breaks as `\n`
    fn run_text(&self, index: usize) -> Cow<'_, str>;

    /// Replaces the text of one run, keeping its formatting
    fn set_run_text(&mut self, index: usize, text: &str);

    /// Replaces every occurrence of `from` inside one run.
    ///
    /// Returns whether the run changed.
    fn replace_in_run(&mut self, index: usize, from: &str, to: &str) -> bool {
        let replaced = {
            let text = self.run_text(index);
            if !text.contains(from) {
                return false;
            }
            text.replace(from, to)
        };
        self.set_run_text(index, &replaced);
        true
    }

    /// Visible text: run texts concatenated in order
    fn text(&self) -> String {
        (0..self.run_count()).map(|index| self.run_text(index)).collect()
    }
}

/// Plain runs without formatting, one string per run.
impl TextRuns for Vec<String> {
    fn run_count(&self) -> usize {
        self.len()
    }

    fn run_text(&self, index: usize) -> Cow<'_, str> {
        Cow::Borrowed(&self[index])
    }

    fn set_run_text(&mut self, index: usize, text: &str) {
        self[index] = text.to_owned();
    }
}

/// A `w:t` node: positions of its start tag and of its single text event.
#[derive(Clone, Debug)]
pub(crate) struct TextNode {
    pub(crate) start: usize,
    pub(crate) event: usize,
    pub(crate) text: String,
}

/// Text-bearing child of a `w:r`, in document order.
#[derive(Clone, Debug)]
pub(crate) enum RunContent {
    Text(TextNode),
    /// `w:tab` (`\t`) or `w:br`/`w:cr` (`\n`); never rewritten
    Separator(char),
}

/// A `w:r` element; its text is the concatenation of its `w:t` nodes, tabs and breaks.
#[derive(Clone, Debug, Default)]
pub struct Run {
    pub(crate) content: Vec<RunContent>,
}

impl Run {
    pub fn text(&self) -> String {
        let mut text = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(node) => text.push_str(&node.text),
                RunContent::Separator(separator) => text.push(*separator),
            }
        }
        text
    }

    /// Text nodes grouped by the tabs and breaks between them
    fn segments_mut(&mut self) -> Vec<Vec<&mut TextNode>> {
        let mut segments = vec![Vec::new()];
        for content in &mut self.content {
            match content {
                RunContent::Text(node) => {
                    if let Some(segment) = segments.last_mut() {
                        segment.push(node);
                    }
                }
                RunContent::Separator(_) => segments.push(Vec::new()),
            }
        }
        segments
    }
}

/// A `w:p` element.
#[derive(Clone, Debug, Default)]
pub struct Paragraph {
    pub(crate) runs: Vec<Run>,
}

impl Paragraph {
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// A `w:tc` element with its direct paragraphs.
#[derive(Clone, Debug, Default)]
pub struct TableCell {
    pub(crate) paragraphs: Vec<Paragraph>,
}

impl TableCell {
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }
}

/// A `w:tr` element.
#[derive(Clone, Debug, Default)]
pub struct TableRow {
    pub(crate) cells: Vec<TableCell>,
}

impl TableRow {
    pub fn cells(&self) -> &[TableCell] {
        &self.cells
    }
}

/// A top-level `w:tbl` element.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub(crate) rows: Vec<TableRow>,
}

impl Table {
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }
}

/// Mutable access to one paragraph of a parsed document.
///
/// Edits are written straight into the document's event stream so that
/// serialization only has to replay the events.
pub struct ParagraphMut<'a> {
    pub(crate) paragraph: &'a mut Paragraph,
    pub(crate) events: &'a mut Vec<Event<'static>>,
}

impl TextRuns for ParagraphMut<'_> {
    fn run_count(&self) -> usize {
        self.paragraph.runs.len()
    }

    fn run_text(&self, index: usize) -> Cow<'_, str> {
        let run = &self.paragraph.runs[index];
        match run.content.as_slice() {
            [RunContent::Text(node)] => Cow::Borrowed(node.text.as_str()),
            _ => Cow::Owned(run.text()),
        }
    }

    /// Splits the text at tabs and breaks and writes each part between the
    /// run's own tabs and breaks, which stay in place. Extra separators end up
    /// in the last part. A part with no `w:t` to hold it joins the previous one.
    fn set_run_text(&mut self, index: usize, text: &str) {
        let segments = self.paragraph.runs[index].segments_mut();
        let mut parts = text.splitn(segments.len(), SEPARATORS);
        let mut targets: Vec<(Vec<&mut TextNode>, String)> = Vec::new();
        let mut leading = String::new();
        for segment in segments {
            let part = parts.next().unwrap_or_default();
            if !segment.is_empty() {
                targets.push((segment, std::mem::take(&mut leading) + part));
            } else if let Some((_, previous)) = targets.last_mut() {
                previous.push_str(part);
            } else {
                leading.push_str(part);
            }
        }
        for (segment, text) in targets {
            write_segment(self.events, segment, &text);
        }
    }

    /// Rewrites only the stretches between tabs and breaks that hold `from`.
    fn replace_in_run(&mut self, index: usize, from: &str, to: &str) -> bool {
        let mut replaced = false;
        for segment in self.paragraph.runs[index].segments_mut() {
            let text: String = segment.iter().map(|node| node.text.as_str()).collect();
            if text.contains(from) {
                write_segment(self.events, segment, &text.replace(from, to));
                replaced = true;
            }
        }
        replaced
    }
}

/// Writes the text into the first node of a segment and empties the others
fn write_segment(events: &mut [Event<'static>], segment: Vec<&mut TextNode>, text: &str) {
    for (position, node) in segment.into_iter().enumerate() {
        let content = if position == 0 { text } else { "" };
        node.text = content.to_owned();
        events[node.event] = Event::Text(BytesText::new(content).into_owned());
        if needs_space_preserve(content) {
            if let Event::Start(start) = &events[node.start] {
                if let Some(preserved) = with_space_preserve(start) {
                    events[node.start] = Event::Start(preserved);
                }
            }
        }
    }
}

/// Word drops leading and trailing whitespace unless `xml:space="preserve"` is set.
fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Returns a copy of the start tag carrying `xml:space="preserve"`, or None if it already has one.
fn with_space_preserve(start: &BytesStart<'static>) -> Option<BytesStart<'static>> {
    let has_space = start
        .attributes()
        .flatten()
        .any(|attribute| attribute.key.as_ref() == b"xml:space");
    if has_space {
        None
    } else {
        let mut preserved = start.clone();
        preserved.push_attribute(("xml:space", "preserve"));
        Some(preserved)
    }
}
