//! Presentation-neutral rendering of messages.
//!
//! `render_message` turns a `Message` into blocks of styled spans that any
//! front end can lay out. Assistant answers are parsed as markdown; user and
//! error messages are shown verbatim.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::state::{Message, MessageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    User,
    Assistant,
    Error,
}

/// A run of text with uniform styling
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
    pub link: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn same_style(&self, other: &Span) -> bool {
        self.strong == other.strong
            && self.emphasis == other.emphasis
            && self.code == other.code
            && self.link == other.link
    }
}

pub type Line = Vec<Span>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Line>),
    Heading {
        level: u8,
        line: Line,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<Block>>,
    },
    Quote(Vec<Block>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    /// 1-based position in the answer's source list
    pub index: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub align: Align,
    pub tone: Tone,
    pub blocks: Vec<Block>,
    pub sources: Vec<SourceLink>,
}

pub fn render_message(message: &Message) -> RenderedMessage {
    let (align, tone) = match message.kind {
        MessageKind::User => (Align::End, Tone::User),
        MessageKind::Assistant => (Align::Start, Tone::Assistant),
        MessageKind::Error => (Align::Start, Tone::Error),
    };

    let blocks = match message.kind {
        MessageKind::Assistant => markdown_to_blocks(&message.content),
        MessageKind::User | MessageKind::Error => plain_blocks(&message.content),
    };

    let sources = message
        .sources
        .iter()
        .enumerate()
        .map(|(i, url)| SourceLink {
            index: i + 1,
            url: url.clone(),
        })
        .collect();

    RenderedMessage {
        align,
        tone,
        blocks,
        sources,
    }
}

/// Placeholder shown while an answer is pending. `frame` cycles the dots.
pub fn pending_text(frame: u8) -> String {
    format!("Thinking{}", ".".repeat(usize::from(frame % 3) + 1))
}

fn plain_blocks(content: &str) -> Vec<Block> {
    if content.is_empty() {
        return Vec::new();
    }
    let lines = content.lines().map(|l| vec![Span::plain(l)]).collect();
    vec![Block::Paragraph(lines)]
}

enum Container {
    Blocks(Vec<Block>),
    Quote(Vec<Block>),
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<Block>>,
    },
    Item(Vec<Block>),
}

#[derive(Default)]
struct BlockBuilder {
    containers: Vec<Container>,
    lines: Vec<Line>,
    strong: usize,
    emphasis: usize,
    link: Option<String>,
    code_block: Option<(Option<String>, String)>,
    heading: Option<u8>,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            containers: vec![Container::Blocks(Vec::new())],
            ..Self::default()
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.containers.last_mut() {
            Some(Container::Blocks(blocks) | Container::Quote(blocks) | Container::Item(blocks)) => {
                blocks.push(block)
            }
            // Loose content directly inside a list becomes its own item
            Some(Container::List { items, .. }) => items.push(vec![block]),
            None => self.containers.push(Container::Blocks(vec![block])),
        }
    }

    fn push_span(&mut self, span: Span) {
        if self.lines.is_empty() {
            self.lines.push(Vec::new());
        }
        let Some(line) = self.lines.last_mut() else {
            return;
        };
        if line.last().is_some_and(|prev| prev.same_style(&span)) {
            if let Some(prev) = line.last_mut() {
                prev.text.push_str(&span.text);
            }
        } else {
            line.push(span);
        }
    }

    fn push_text(&mut self, text: &str) {
        let span = Span {
            text: text.to_string(),
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            code: false,
            link: self.link.clone(),
        };
        self.push_span(span);
    }

    fn take_lines(&mut self) -> Vec<Line> {
        let mut lines = std::mem::take(&mut self.lines);
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    fn flush_paragraph(&mut self) {
        let lines = self.take_lines();
        if !lines.is_empty() {
            self.push_block(Block::Paragraph(lines));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_paragraph();
        // Unwind anything left open by truncated input
        while self.containers.len() > 1 {
            self.close_container();
        }
        match self.containers.pop() {
            Some(Container::Blocks(blocks)) => blocks,
            _ => Vec::new(),
        }
    }

    fn close_container(&mut self) {
        self.flush_paragraph();
        let Some(container) = self.containers.pop() else {
            return;
        };
        match container {
            Container::Quote(blocks) => self.push_block(Block::Quote(blocks)),
            Container::List {
                ordered,
                start,
                items,
            } => self.push_block(Block::List {
                ordered,
                start,
                items,
            }),
            Container::Item(blocks) => {
                if let Some(Container::List { items, .. }) = self.containers.last_mut() {
                    items.push(blocks);
                    return;
                }
                for block in blocks {
                    self.push_block(block);
                }
            }
            Container::Blocks(blocks) => {
                for block in blocks {
                    self.push_block(block);
                }
            }
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => self.flush_paragraph(),
            Event::End(TagEnd::Paragraph) => self.flush_paragraph(),
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_paragraph();
                self.heading = Some(level as u8);
            }
            Event::End(TagEnd::Heading(_)) => {
                let line = self.take_lines().into_iter().flatten().collect();
                let level = self.heading.take().unwrap_or(1);
                self.push_block(Block::Heading { level, line });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_paragraph();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let language = info.trim().to_string();
                        if language.is_empty() {
                            None
                        } else {
                            Some(language)
                        }
                    }
                    CodeBlockKind::Indented => None,
                };
                self.code_block = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, code)) = self.code_block.take() {
                    let code = code.trim_end_matches('\n').to_string();
                    self.push_block(Block::CodeBlock { language, code });
                }
            }
            Event::Start(Tag::List(start)) => {
                self.flush_paragraph();
                self.containers.push(Container::List {
                    ordered: start.is_some(),
                    start: start.unwrap_or(1),
                    items: Vec::new(),
                });
            }
            Event::Start(Tag::Item) => {
                self.flush_paragraph();
                self.containers.push(Container::Item(Vec::new()));
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.flush_paragraph();
                self.containers.push(Container::Quote(Vec::new()));
            }
            Event::End(TagEnd::List(_) | TagEnd::Item | TagEnd::BlockQuote(_)) => {
                self.close_container();
            }
            Event::Start(Tag::Strong) => self.strong += 1,
            Event::End(TagEnd::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::End(TagEnd::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::Start(Tag::Link { dest_url, .. }) => self.link = Some(dest_url.to_string()),
            Event::End(TagEnd::Link) => self.link = None,
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                match self.code_block.as_mut() {
                    Some((_, code)) => code.push_str(&text),
                    None => self.push_text(&text),
                }
            }
            Event::Code(code) => {
                let span = Span {
                    text: code.to_string(),
                    code: true,
                    link: self.link.clone(),
                    ..Span::default()
                };
                self.push_span(span);
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.lines.push(Vec::new()),
            Event::Rule => {
                self.flush_paragraph();
                self.push_block(Block::Rule);
            }
            _ => {}
        }
    }
}

/// Parse markdown into blocks of styled spans.
pub fn markdown_to_blocks(content: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut builder = BlockBuilder::new();
    for event in Parser::new_ext(content, options) {
        builder.handle(event);
    }
    builder.finish()
}
