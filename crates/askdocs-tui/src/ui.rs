use askdocs_core::render::{self as markup, pending_text, Block, RenderedMessage, Tone};
use askdocs_core::{render_message, Snapshot};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block as Border, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use crate::app::{App, InputMode};

const PLACEHOLDER: &str = "Ask a question about the documentation...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" askdocs ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", app.endpoint), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Border::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let snapshot = app.snapshot();
    let lines = chat_lines(&snapshot, app.animation_frame);
    let text = if lines.is_empty() {
        Text::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(lines)
    };

    // Count rows with the same word wrapper that renders them; no block yet
    // so the count is content only
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });
    let total = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    app.set_chat_metrics(inner_height, inner_width, total);

    let chat = chat.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if total > inner_height {
        let mut state = ScrollbarState::new(usize::from(total.saturating_sub(inner_height)))
            .position(usize::from(app.chat_scroll));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.is_pending();
    let editing = app.input_mode == InputMode::Editing;

    let (title, border_color) = if pending {
        (" Waiting for answer... ".to_string(), Color::DarkGray)
    } else if editing {
        (" Ask (Enter to send) ".to_string(), Color::Yellow)
    } else {
        (" Ask (i to type) ".to_string(), Color::DarkGray)
    };

    let block = Border::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if pending { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(block);
    frame.render_widget(input, area);

    // Show cursor when the box accepts input
    if editing && !pending {
        let cursor_x = u16::try_from(cursor_pos - scroll_offset).unwrap_or(u16::MAX);
        frame.set_cursor_position((
            area.x.saturating_add(cursor_x).saturating_add(1),
            area.y + 1,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" SCROLL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[("Enter", "send"), ("↑/↓", "scroll"), ("Esc", "scroll mode"), ("^C", "quit")],
        InputMode::Normal => &[
            ("j/k", "scroll"),
            ("g/G", "top/bottom"),
            ("y", "copy answer"),
            ("i", "ask"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Build the chat transcript: every message in order, then the thinking
/// indicator while a request is pending.
pub fn chat_lines(snapshot: &Snapshot, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in &snapshot.messages {
        push_message(&mut lines, &render_message(message));
        lines.push(Line::default());
    }

    if snapshot.pending {
        lines.push(label_line(Tone::Assistant, Alignment::Left));
        lines.push(Line::from(Span::styled(
            pending_text(animation_frame),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn label_line(tone: Tone, alignment: Alignment) -> Line<'static> {
    let (label, color) = match tone {
        Tone::User => ("You:", Color::Cyan),
        Tone::Assistant => ("Answer:", Color::Yellow),
        Tone::Error => ("Error:", Color::Red),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(alignment)
}

fn push_message(out: &mut Vec<Line<'static>>, rendered: &RenderedMessage) {
    let alignment = match rendered.align {
        markup::Align::Start => Alignment::Left,
        markup::Align::End => Alignment::Right,
    };
    let base = match rendered.tone {
        Tone::Error => Style::default().fg(Color::Red),
        Tone::User | Tone::Assistant => Style::default(),
    };

    out.push(label_line(rendered.tone, alignment));

    for (i, block) in rendered.blocks.iter().enumerate() {
        if i > 0 {
            out.push(Line::default());
        }
        push_block(out, block, "", base);
    }

    if !rendered.sources.is_empty() {
        out.push(Line::default());
        out.push(Line::from(Span::styled("Sources:", Style::default().fg(Color::DarkGray))));
        for source in &rendered.sources {
            out.push(Line::from(vec![
                Span::styled(format!("[{}] ", source.index), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    source.url.clone(),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                ),
            ]));
        }
    }

    if alignment != Alignment::Left {
        for line in out.iter_mut().rev().take_while(|l| l.alignment.is_none()) {
            line.alignment = Some(alignment);
        }
    }
}

fn styled(span: &markup::Span, base: Style) -> Span<'static> {
    let mut style = base;
    if span.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if span.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if span.code {
        style = style.fg(Color::Green);
    }
    if span.link.is_some() {
        style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(span.text.clone(), style)
}

fn prefixed(prefix: &str, spans: Vec<Span<'static>>, prefix_style: Style) -> Line<'static> {
    let mut all = Vec::with_capacity(spans.len() + 1);
    if !prefix.is_empty() {
        all.push(Span::styled(prefix.to_string(), prefix_style));
    }
    all.extend(spans);
    Line::from(all)
}

fn push_block(out: &mut Vec<Line<'static>>, block: &Block, indent: &str, base: Style) {
    let dim = Style::default().fg(Color::DarkGray);
    match block {
        Block::Paragraph(lines) => {
            for line in lines {
                let spans = line.iter().map(|s| styled(s, base)).collect();
                out.push(prefixed(indent, spans, dim));
            }
        }
        Block::Heading { line, .. } => {
            let heading = base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            let spans = line.iter().map(|s| styled(s, heading)).collect();
            out.push(prefixed(indent, spans, dim));
        }
        Block::CodeBlock { language, code } => {
            if let Some(language) = language {
                out.push(prefixed(
                    indent,
                    vec![Span::styled(language.clone(), dim.add_modifier(Modifier::ITALIC))],
                    dim,
                ));
            }
            for code_line in code.lines() {
                out.push(prefixed(
                    &format!("{}  ", indent),
                    vec![Span::styled(code_line.to_string(), Style::default().fg(Color::Green))],
                    dim,
                ));
            }
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            for (i, item) in items.iter().enumerate() {
                let marker = if *ordered {
                    format!("{}. ", *start + i as u64)
                } else {
                    "• ".to_string()
                };
                let hanging = format!("{}{}", indent, " ".repeat(marker.chars().count()));
                let lead = format!("{}{}", indent, marker);
                let first = out.len();
                for block in item {
                    push_block(out, block, &hanging, base);
                }

                // The item's first line starts with the hanging indent, possibly
                // followed by a nested marker; only the indent becomes the marker
                let rest = out
                    .get(first)
                    .and_then(|line| line.spans.first())
                    .and_then(|span| span.content.strip_prefix(hanging.as_str()))
                    .map(str::to_string);
                match rest {
                    Some(rest) => {
                        if let Some(span) = out.get_mut(first).and_then(|l| l.spans.first_mut()) {
                            span.content = format!("{}{}", lead, rest).into();
                        }
                    }
                    None => out.insert(first, Line::from(Span::styled(lead, dim))),
                }
            }
        }
        Block::Quote(blocks) => {
            let quote_indent = format!("{}│ ", indent);
            for block in blocks {
                push_block(out, block, &quote_indent, base.add_modifier(Modifier::ITALIC));
            }
        }
        Block::Rule => {
            out.push(prefixed(indent, vec![Span::styled("─".repeat(24), dim)], dim));
        }
    }
}
