use crate::document::paragraph::Paragraph;
use crate::document::paragraph::Run;
use crate::document::paragraph::RunContent;
use crate::document::paragraph::Table;
use crate::document::paragraph::TableCell;
use crate::document::paragraph::TableRow;
use crate::document::paragraph::TextNode;
use crate::document::DocumentError;
use crate::error::RustyMergeError;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;

/// WordprocessingML namespaces (transitional and strict)
const WORDPROCESSING_NAMESPACES: [&str; 2] = [
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    "http://purl.oclc.org/ooxml/wordprocessingml/main",
];

/// Prefix used when the root element declares none of the namespaces
const DEFAULT_PREFIX: &str = "w";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Kind {
    Body,
    Table,
    Row,
    Cell,
    Paragraph,
    Run,
    Text,
    Tab,
    Break,
    Other,
}

impl Kind {
    /// Character a tab or break contributes to run text
    fn separator(self) -> Option<char> {
        match self {
            Kind::Tab => Some('\t'),
            Kind::Break => Some('\n'),
            _ => None,
        }
    }
}

/// Qualified element names of the WordprocessingML elements the body tree tracks.
struct Names {
    body: Vec<u8>,
    table: Vec<u8>,
    row: Vec<u8>,
    cell: Vec<u8>,
    paragraph: Vec<u8>,
    run: Vec<u8>,
    text: Vec<u8>,
    tab: Vec<u8>,
    line_break: Vec<u8>,
    carriage_return: Vec<u8>,
}

impl Names {
    fn new(prefix: &str) -> Names {
        let qualify = |local: &str| match prefix {
            "" => local.as_bytes().to_vec(),
            _ => format!("{prefix}:{local}").into_bytes(),
        };
        Names {
            body: qualify("body"),
            table: qualify("tbl"),
            row: qualify("tr"),
            cell: qualify("tc"),
            paragraph: qualify("p"),
            run: qualify("r"),
            text: qualify("t"),
            tab: qualify("tab"),
            line_break: qualify("br"),
            carriage_return: qualify("cr"),
        }
    }

    /// Finds the prefix bound to the WordprocessingML namespace on the root element
    fn from_root(root: &BytesStart) -> Names {
        let prefix = root
            .attributes()
            .flatten()
            .find_map(|attribute| {
                let key = std::str::from_utf8(attribute.key.as_ref()).ok()?;
                let value = std::str::from_utf8(&attribute.value).ok()?;
                if !WORDPROCESSING_NAMESPACES.contains(&value) {
                    return None;
                }
                match key {
                    "xmlns" => Some(String::new()),
                    _ => key.strip_prefix("xmlns:").map(str::to_owned),
                }
            })
            .unwrap_or_else(|| DEFAULT_PREFIX.to_owned());
        Names::new(&prefix)
    }

    fn kind(&self, name: &[u8]) -> Kind {
        match name {
            name if name == self.paragraph => Kind::Paragraph,
            name if name == self.run => Kind::Run,
            name if name == self.text => Kind::Text,
            name if name == self.table => Kind::Table,
            name if name == self.row => Kind::Row,
            name if name == self.cell => Kind::Cell,
            name if name == self.body => Kind::Body,
            name if name == self.tab => Kind::Tab,
            name if name == self.line_break || name == self.carriage_return => Kind::Break,
            _ => Kind::Other,
        }
    }
}

/// Open elements while building the tree. `None` marks elements outside the
/// tracked structure, such as paragraphs of text boxes or nested tables.
enum Frame {
    Body,
    Table(Option<Table>),
    Row(Option<TableRow>),
    Cell(Option<TableCell>),
    Paragraph(Option<Paragraph>),
    Run(Option<Run>),
    Text(Option<PendingText>),
    Other,
}

struct PendingText {
    start: usize,
    text: String,
}

/// Main document part as an event stream plus the paragraphs and tables of its body.
///
/// Body paragraphs and top-level tables are tracked; a run belongs to the
/// nearest enclosing paragraph, so runs inside hyperlinks and revisions count.
/// The content of each tracked `w:t` is collapsed into one text event.
pub(crate) struct Body {
    pub(crate) events: Vec<Event<'static>>,
    pub(crate) paragraphs: Vec<Paragraph>,
    pub(crate) tables: Vec<Table>,
}

impl Body {
    pub(crate) fn parse(xml: &[u8]) -> Result<Body, RustyMergeError> {
        let mut reader = XmlReader::preserving(xml);
        let mut body = Body {
            events: Vec::new(),
            paragraphs: Vec::new(),
            tables: Vec::new(),
        };
        let mut names: Option<Names> = None;
        let mut stack: Vec<Frame> = Vec::new();
        let mut has_body = false;

        while let Some(event) = reader.next_owned()? {
            if let Some(Frame::Text(Some(pending))) = stack.last_mut() {
                match &event {
                    Event::Text(text) => {
                        pending.text.push_bytes_text(text)?;
                        continue;
                    }
                    Event::GeneralRef(reference) => {
                        pending.text.push_bytes_ref(reference)?;
                        continue;
                    }
                    Event::CData(data) => {
                        pending.text.push_str(&data.decode()?);
                        continue;
                    }
                    _ => (),
                }
            }

            match &event {
                Event::Start(start) => {
                    let names = names.get_or_insert_with(|| Names::from_root(start));
                    let kind = names.kind(start.name().as_ref());
                    has_body |= kind == Kind::Body;
                    push_separator(kind, &mut stack);
                    let frame = open_frame(kind, &stack, body.events.len());
                    stack.push(frame);
                }
                Event::Empty(empty) => {
                    let names = names.get_or_insert_with(|| Names::from_root(empty));
                    let kind = names.kind(empty.name().as_ref());
                    has_body |= kind == Kind::Body;
                    push_separator(kind, &mut stack);
                    if kind == Kind::Paragraph {
                        if let Frame::Paragraph(Some(paragraph)) = open_frame(kind, &stack, body.events.len()) {
                            body.attach_paragraph(paragraph, &mut stack);
                        }
                    }
                }
                Event::End(_) => {
                    if let Some(frame) = stack.pop() {
                        body.close_frame(frame, &mut stack);
                    }
                }
                _ => (),
            }
            body.events.push(event);
        }

        if !has_body {
            Err(DocumentError::BodyMissingError)?
        }
        Ok(body)
    }

    /// Attaches a finished element to its parent frame
    fn close_frame(&mut self, frame: Frame, stack: &mut [Frame]) {
        match frame {
            Frame::Text(Some(pending)) => {
                self.events.push(Event::Text(BytesText::new(&pending.text).into_owned()));
                if let Some(Frame::Run(Some(run))) = stack.last_mut() {
                    run.content.push(RunContent::Text(TextNode {
                        start: pending.start,
                        event: self.events.len() - 1,
                        text: pending.text,
                    }));
                }
            }
            Frame::Run(Some(run)) => {
                if let Some(Some(paragraph)) = nearest_paragraph(stack) {
                    paragraph.runs.push(run);
                }
            }
            Frame::Paragraph(Some(paragraph)) => self.attach_paragraph(paragraph, stack),
            Frame::Cell(Some(cell)) => {
                if let Some(Frame::Row(Some(row))) = stack.last_mut() {
                    row.cells.push(cell);
                }
            }
            Frame::Row(Some(row)) => {
                if let Some(Frame::Table(Some(table))) = stack.last_mut() {
                    table.rows.push(row);
                }
            }
            Frame::Table(Some(table)) => self.tables.push(table),
            _ => (),
        }
    }

    fn attach_paragraph(&mut self, paragraph: Paragraph, stack: &mut [Frame]) {
        match stack.last_mut() {
            Some(Frame::Body) => self.paragraphs.push(paragraph),
            Some(Frame::Cell(Some(cell))) => cell.paragraphs.push(paragraph),
            _ => (),
        }
    }

    /// Serializes the event stream back to XML
    pub(crate) fn to_xml(&self) -> Result<Vec<u8>, RustyMergeError> {
        let mut writer = Writer::new(Vec::with_capacity(self.events.len() * 32));
        for event in &self.events {
            writer.write_event(event.borrow())?;
        }
        Ok(writer.into_inner())
    }
}

/// Creates the frame for an element opening at event position `position`
fn open_frame(kind: Kind, stack: &[Frame], position: usize) -> Frame {
    let parent = stack.last();
    match kind {
        Kind::Body => Frame::Body,
        Kind::Table => Frame::Table(matches!(parent, Some(Frame::Body)).then(Table::default)),
        Kind::Row => Frame::Row(matches!(parent, Some(Frame::Table(Some(_)))).then(TableRow::default)),
        Kind::Cell => Frame::Cell(matches!(parent, Some(Frame::Row(Some(_)))).then(TableCell::default)),
        Kind::Paragraph => Frame::Paragraph(
            matches!(parent, Some(Frame::Body) | Some(Frame::Cell(Some(_)))).then(Paragraph::default),
        ),
        Kind::Run => Frame::Run(in_tracked_paragraph(stack).then(Run::default)),
        Kind::Text => Frame::Text(matches!(parent, Some(Frame::Run(Some(_)))).then(|| PendingText {
            start: position,
            text: String::new(),
        })),
        Kind::Tab | Kind::Break | Kind::Other => Frame::Other,
    }
}

/// Records a tab or break that is a direct child of a tracked run
fn push_separator(kind: Kind, stack: &mut [Frame]) {
    if let (Some(separator), Some(Frame::Run(Some(run)))) = (kind.separator(), stack.last_mut()) {
        run.content.push(RunContent::Separator(separator));
    }
}

/// Whether the innermost open paragraph is tracked
fn in_tracked_paragraph(stack: &[Frame]) -> bool {
    let paragraph = stack.iter().rev().find_map(|frame| match frame {
        Frame::Paragraph(paragraph) => Some(paragraph),
        _ => None,
    });
    matches!(paragraph, Some(Some(_)))
}

/// The innermost open paragraph, tracked or not
fn nearest_paragraph(stack: &mut [Frame]) -> Option<&mut Option<Paragraph>> {
    stack.iter_mut().rev().find_map(|frame| match frame {
        Frame::Paragraph(paragraph) => Some(paragraph),
        _ => None,
    })
}
