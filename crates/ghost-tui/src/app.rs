use std::sync::Arc;

use ghost_core::{Conversation, Dispatch};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

/// Terminals narrower than this get the compact layout.
pub const COMPACT_WIDTH: u16 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Menu,
    Keybindings,
    About,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Keybindings,
    About,
    ClearInput,
    Quit,
}

impl MenuItem {
    pub fn all() -> [MenuItem; 4] {
        [
            MenuItem::Keybindings,
            MenuItem::About,
            MenuItem::ClearInput,
            MenuItem::Quit,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Keybindings => "Keybindings",
            MenuItem::About => "About Ghost",
            MenuItem::ClearInput => "Clear input",
            MenuItem::Quit => "Quit",
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub overlay: Overlay,
    pub menu_state: ListState,

    pub conversation: Conversation,
    pub input_cursor: usize, // cursor position in chars

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_lines: u16, // rows the transcript took at the last render
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // 0-2 for ellipsis animation
    pub animation_frame: u8,

    /// One-line notice shown in the footer until the next key press.
    pub notice: Option<String>,
}

impl App {
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            should_quit: false,
            // Input is focused on start
            input_mode: InputMode::Editing,
            overlay: Overlay::None,
            menu_state: ListState::default(),

            conversation: Conversation::new(dispatcher),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_lines: 0,
            follow_bottom: true,
            chat_area: None,

            animation_frame: 0,
            notice: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_awaiting()
    }

    pub fn input(&self) -> &str {
        self.conversation.input()
    }

    /// The send control is only live with non-blank input and nothing outstanding.
    pub fn can_send(&self) -> bool {
        !self.input().trim().is_empty() && !self.is_loading()
    }

    pub fn submit(&mut self) {
        if self.conversation.submit_input() {
            self.input_cursor = 0;
            self.scroll_to_bottom();
        }
    }

    /// Pick up a finished dispatch. Called once per loop iteration.
    pub async fn poll_dispatch(&mut self) {
        if self.conversation.poll().await {
            self.input_mode = InputMode::Editing;
            self.scroll_to_bottom();
        }
    }

    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(self.conversation.input(), self.input_cursor);
        self.conversation.input_mut().insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(self.conversation.input(), self.input_cursor);
            self.conversation.input_mut().remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let char_count = self.conversation.input().chars().count();
        if self.input_cursor < char_count {
            let byte_pos = char_to_byte_index(self.conversation.input(), self.input_cursor);
            self.conversation.input_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.conversation.input().chars().count();
    }

    pub fn clear_input(&mut self) {
        self.conversation.input_mut().clear();
        self.input_cursor = 0;
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_bottom = self.chat_scroll >= max;
    }

    pub fn scroll_top(&mut self) {
        self.follow_bottom = false;
        self.chat_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.chat_scroll = self.max_scroll();
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    /// Record the wrapped height of the transcript and re-pin the scroll offset.
    pub fn set_chat_lines(&mut self, lines: usize) {
        self.chat_lines = u16::try_from(lines).unwrap_or(u16::MAX);
        let max = self.max_scroll();
        if self.follow_bottom || self.chat_scroll > max {
            self.chat_scroll = max;
        }
    }

    // Menu

    pub fn open_menu(&mut self) {
        self.overlay = Overlay::Menu;
        if self.menu_state.selected().is_none() {
            self.menu_state.select(Some(0));
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    pub fn menu_nav_down(&mut self) {
        let len = MenuItem::all().len();
        let i = self.menu_state.selected().unwrap_or(0);
        self.menu_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn menu_nav_up(&mut self) {
        let i = self.menu_state.selected().unwrap_or(0);
        self.menu_state.select(Some(i.saturating_sub(1)));
    }

    pub fn activate_menu_item(&mut self) {
        let item = self
            .menu_state
            .selected()
            .and_then(|i| MenuItem::all().get(i).copied());

        match item {
            Some(MenuItem::Keybindings) => self.overlay = Overlay::Keybindings,
            Some(MenuItem::About) => self.overlay = Overlay::About,
            Some(MenuItem::ClearInput) => {
                if !self.is_loading() {
                    self.clear_input();
                }
                self.close_overlay();
            }
            Some(MenuItem::Quit) => self.should_quit = true,
            None => self.close_overlay(),
        }
    }

    /// Shut down the conversation; an outstanding dispatch is cancelled.
    pub fn shutdown(&mut self) {
        self.conversation.close();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fakes::Echo;

    /// Dispatchers for exercising the UI without a network.
    pub(crate) mod fakes {
        use async_trait::async_trait;
        use ghost_core::{Dispatch, DispatchError};

        pub struct Echo;

        pub struct Hang;

        #[async_trait]
        impl Dispatch for Echo {
            async fn dispatch(&self, prompt: &str) -> Result<String, DispatchError> {
                Ok(format!("echo: {}", prompt))
            }
        }

        #[async_trait]
        impl Dispatch for Hang {
            async fn dispatch(&self, _prompt: &str) -> Result<String, DispatchError> {
                std::future::pending().await
            }
        }
    }

    fn app() -> App {
        App::new(Arc::new(Echo))
    }

    #[test]
    fn char_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("héllo", 10), 6);
    }

    #[test]
    fn editing_is_utf8_safe() {
        let mut app = app();
        for c in "gh👻st".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.delete_before_cursor();
        assert_eq!(app.input(), "ghst");

        app.cursor_home();
        app.delete_at_cursor();
        assert_eq!(app.input(), "hst");

        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.input(), "hst!");
        assert_eq!(app.input_cursor, 4);
    }

    #[test]
    fn send_needs_non_blank_input() {
        let mut app = app();
        assert!(!app.can_send());
        app.insert_char(' ');
        assert!(!app.can_send());
        app.insert_char('x');
        assert!(app.can_send());
    }

    #[tokio::test]
    async fn submit_resets_cursor_and_settles() {
        let mut app = app();
        for c in "hi".chars() {
            app.insert_char(c);
        }
        app.input_mode = InputMode::Normal;

        app.submit();
        assert!(app.is_loading());
        assert_eq!(app.input_cursor, 0);
        assert!(!app.can_send());

        app.conversation.wait().await;
        app.poll_dispatch().await;
        assert_eq!(app.conversation.messages().len(), 2);
        assert_eq!(app.conversation.messages()[1].content(), "echo: hi");
    }

    #[tokio::test]
    async fn poll_after_settle_focuses_input() {
        let mut app = app();
        app.insert_char('x');
        app.submit();
        app.input_mode = InputMode::Normal;

        for _ in 0..100 {
            app.poll_dispatch().await;
            if !app.is_loading() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(!app.is_loading());
        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.follow_bottom);
    }

    #[test]
    fn rendered_height_pins_scroll_to_bottom() {
        let mut app = app();
        app.chat_height = 10;
        app.set_chat_lines(25);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_up(5);
        app.set_chat_lines(30);
        assert_eq!(app.chat_scroll, 10);

        app.scroll_down(100);
        assert_eq!(app.chat_scroll, 20);
        assert!(app.follow_bottom);
    }

    #[test]
    fn scrolling_up_stops_following() {
        let mut app = app();
        app.scroll_up(3);
        assert!(!app.follow_bottom);
        app.scroll_to_bottom();
        assert!(app.follow_bottom);
    }

    #[test]
    fn menu_clear_input() {
        let mut app = app();
        app.insert_char('a');
        app.open_menu();
        app.menu_nav_down();
        app.menu_nav_down();
        app.activate_menu_item();

        assert_eq!(app.input(), "");
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn menu_quit() {
        let mut app = app();
        app.open_menu();
        for _ in 0..10 {
            app.menu_nav_down();
        }
        app.activate_menu_item();
        assert!(app.should_quit);
    }
}
