use anyhow::Result;
use askdocs_core::MessageKind;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Lines moved per mouse wheel notch
const WHEEL_STEP: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick().await,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down()
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up()
        }
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        KeyCode::Char('y') => copy_last_answer(app),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
        }
        // The input box is disabled while an answer is pending
        _ if app.is_pending() => {}
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Up | KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Down | KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.clear();
            app.cursor = 0;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_STEP),
        _ => {}
    }
}

fn copy_last_answer(app: &App) {
    let snapshot = app.snapshot();
    let Some(answer) = snapshot
        .messages
        .iter()
        .rev()
        .find(|m| m.kind == MessageKind::Assistant)
    else {
        return;
    };

    let mut text = answer.content.clone();
    if !answer.sources.is_empty() {
        text.push_str("\n\nSources:\n");
        for source in &answer.sources {
            text.push_str(&format!("- {}\n", source));
        }
    }
    copy_to_clipboard(text);
}

type ClipboardHelper = (&'static str, &'static [&'static str]);

static CLIPBOARD_HELPERS: [ClipboardHelper; 3] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

fn copy_to_clipboard(text: String) {
    spawn_clipboard(&CLIPBOARD_HELPERS, text);
}

/// Pipe the text into the first helper that starts, on the blocking pool.
fn spawn_clipboard(helpers: &'static [ClipboardHelper], text: String) -> JoinHandle<bool> {
    tokio::task::spawn_blocking(move || {
        use std::io::Write;
        use std::process::{Command, Stdio};

        for (program, args) in helpers {
            if let Ok(mut child) = Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .spawn()
            {
                if let Some(mut stdin) = child.stdin.take() {
                    let _ = stdin.write_all(text.as_bytes());
                }
                let _ = child.wait();
                return true;
            }
        }
        tracing::debug!("no clipboard helper found");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdocs_core::{Answer, AskBackend, AskError, ChatSession, HistoryEntry};
    use crossterm::event::KeyEventState;
    use crossterm::event::KeyEventKind;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct NeverBackend;

    #[async_trait::async_trait]
    impl AskBackend for NeverBackend {
        async fn ask(&self, _question: &str, _history: &[HistoryEntry]) -> Result<Answer, AskError> {
            std::future::pending().await
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    fn app() -> App {
        App::new(ChatSession::new(Arc::new(NeverBackend)), "http://test".to_string())
    }

    #[tokio::test]
    async fn test_clipboard_helper_does_not_block_caller() {
        static SLOW: [ClipboardHelper; 1] = [("sleep", &["1"])];

        let started = Instant::now();
        let copy = spawn_clipboard(&SLOW, "answer".to_string());
        assert!(started.elapsed() < Duration::from_millis(500));

        // Outcome depends on the host having `sleep`; only completion matters
        let _ = copy.await.unwrap();
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_editing_with_cursor_moves() {
        let mut app = app();
        type_text(&mut app, "segmnt");
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Left));
        type_text(&mut app, "e");
        assert_eq!(app.input, "segment");

        handle_key(&mut app, key(KeyCode::Home));
        handle_key(&mut app, key(KeyCode::Delete));
        assert_eq!(app.input, "egment");
    }

    #[tokio::test]
    async fn test_input_disabled_while_pending() {
        let mut app = app();
        type_text(&mut app, "What is a segment?");
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.is_pending());
        assert!(app.input.is_empty());

        type_text(&mut app, "more");
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.input.is_empty());
        assert_eq!(app.snapshot().messages.len(), 1);

        // Leaving the input still works
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit, "q is text while editing");

        handle_key(&mut app, key(KeyCode::Esc));
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = self::app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
