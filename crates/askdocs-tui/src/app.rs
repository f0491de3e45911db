use askdocs_core::{ChatSession, Snapshot, SubmitRejected};
use ratatui::layout::Rect;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub session: ChatSession,
    pub endpoint: String,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,      // inner height of the chat area
    pub chat_width: u16,       // inner width of the chat area
    pub chat_total_lines: u16, // wrapped line count from the last render
    pub follow_bottom: bool,   // keep the newest message in view
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(session: ChatSession, endpoint: String) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session,
            endpoint,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,
            follow_bottom: true,
            chat_area: None,
            animation_frame: 0,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.session.is_pending()
    }

    /// Send the input box contents. Rejected input stays where it is.
    pub fn submit_input(&mut self) {
        match self.session.submit(&self.input) {
            Ok(()) => {
                self.input.clear();
                self.cursor = 0;
                self.animation_frame = 0;
                self.scroll_to_bottom();
            }
            Err(SubmitRejected::Empty) => {
                self.input.clear();
                self.cursor = 0;
            }
            Err(reason) => debug!(%reason, "submission ignored"),
        }
    }

    /// Settle a finished request and advance the thinking animation.
    pub async fn tick(&mut self) {
        if self.session.poll().await {
            self.scroll_to_bottom();
        }
        if self.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_bottom = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.chat_scroll = self.max_scroll();
    }

    /// Called by the renderer once it knows how tall the chat is.
    pub fn set_chat_metrics(&mut self, height: u16, width: u16, total_lines: u16) {
        self.chat_height = height;
        self.chat_width = width;
        self.chat_total_lines = total_lines;
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }
}
