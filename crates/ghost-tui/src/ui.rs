use ghost_core::{Message, Role};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, MenuItem, Overlay, COMPACT_WIDTH};

const GREETING: &str = "Hello, I'm Md Ridoan Mahmud Zisan.";
const GREETING_HINT: &str = "Try asking a question or sharing your thoughts.";
const PLACEHOLDER: &str = "Type your message...";

const USER_COLOR: Color = Color::Blue;
const GHOST_COLOR: Color = Color::Gray;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let compact = area.width < COMPACT_WIDTH;

    // Header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, compact);
    render_chat(app, frame, chat_area, compact);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area, compact);

    match app.overlay {
        Overlay::None => {}
        Overlay::Menu => render_menu(app, frame, area),
        Overlay::Keybindings => render_keybindings(frame, area),
        Overlay::About => render_about(frame, area),
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, compact: bool) {
    let mut spans = vec![
        Span::styled(" ≡ ", Style::default().fg(Color::White).bold()),
        Span::styled("👻 Ghost ", Style::default().fg(Color::Cyan).bold()),
    ];

    if !compact {
        spans.push(Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ));
    }

    if app.is_loading() {
        spans.push(Span::styled("  waiting for reply", Style::default().fg(Color::Yellow)));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, compact: bool) {
    app.chat_area = Some(area);

    // Inner size minus borders, for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let messages = app.conversation.messages();
    if messages.is_empty() && !app.is_loading() {
        render_empty_state(frame, block, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for msg in messages {
        push_message(&mut lines, msg, compact);
    }

    if app.is_loading() {
        lines.push(role_line(Role::Assistant, None));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    // Scroll against the wrapped height the paragraph will actually render
    app.set_chat_lines(chat.line_count(app.chat_width));

    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_empty_state(frame: &mut Frame, block: Block, area: Rect) {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let top_padding = inner.height.saturating_sub(3) / 3;
    let mut lines: Vec<Line> = (0..top_padding).map(|_| Line::default()).collect();
    lines.push(Line::from(Span::styled("👻", Style::default().fg(Color::Gray))));
    lines.push(Line::from(Span::styled(GREETING, Style::default().fg(Color::Gray).bold())));
    lines.push(Line::from(Span::styled(GREETING_HINT, Style::default().fg(Color::DarkGray))));

    let greeting = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(greeting, inner);
}

fn role_line(role: Role, time: Option<String>) -> Line<'static> {
    let (label, color) = match role {
        Role::User => ("You", USER_COLOR),
        Role::Assistant => ("Ghost", GHOST_COLOR),
    };

    let mut spans = vec![Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(time) = time {
        spans.push(Span::styled(
            format!("  {}", time),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn push_message(lines: &mut Vec<Line<'static>>, msg: &Message, compact: bool) {
    let time = msg.timestamp().format("%-I:%M:%S %p").to_string();

    // Compact layout keeps the time on the role line to save a row
    let (role, trailer) = if compact {
        (role_line(msg.role(), Some(time)), Line::default())
    } else {
        let trailer = Line::from(Span::styled(time, Style::default().fg(Color::DarkGray)));
        (role_line(msg.role(), None), trailer)
    };
    lines.push(role);

    let text_style = match msg.role() {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default(),
    };

    if msg.is_image() {
        lines.push(Line::from(vec![
            Span::styled("🖼  ", Style::default().fg(Color::Magenta)),
            Span::styled(
                msg.content().to_string(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::UNDERLINED),
            ),
        ]));
    } else if msg.content().is_empty() {
        lines.push(Line::default());
    } else {
        for line in msg.content().lines() {
            lines.push(Line::from(Span::styled(line.to_string(), text_style)));
        }
    }

    lines.push(trailer);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let editing = app.input_mode == InputMode::Editing && app.overlay == Overlay::None;

    let border_color = if loading {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Horizontal scroll to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let paragraph = if app.input().is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = app
            .input()
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let style = if loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(visible_text).style(style)
    };

    frame.render_widget(paragraph.block(block), area);

    if editing && !loading {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, compact: bool) {
    if let Some(notice) = &app.notice {
        let line = Line::from(Span::styled(
            format!(" {} ", notice),
            Style::default().fg(Color::Yellow),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let mut hints: Vec<(&str, &str, bool)> = match app.input_mode {
        InputMode::Editing => vec![
            ("Enter", "Send", app.can_send()),
            ("Esc", "scroll", true),
        ],
        InputMode::Normal => vec![
            ("i", "type", true),
            ("j/k", "scroll", true),
            ("q", "quit", true),
        ],
    };
    hints.push(("F2", "menu", true));
    if app.conversation.latest_image().is_some() {
        hints.push(("^O", "open image", true));
    }

    let mut spans = Vec::new();
    for (key, label, enabled) in hints {
        let style = if enabled { key_style } else { disabled_style };
        spans.push(Span::styled(format!(" {} ", key), style));
        // Narrow terminals only get the keys
        if !compact {
            let style = if enabled { label_style } else { disabled_style };
            spans.push(Span::styled(format!(" {} ", label), style));
        }
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_menu(app: &mut App, frame: &mut Frame, area: Rect) {
    let items = MenuItem::all();
    let popup_area = centered_popup(area, 30, items.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Menu ");

    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| {
            let style = if *item == MenuItem::ClearInput && app.is_loading() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", item.label())).style(style)
        })
        .collect();

    let list = List::new(list_items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.menu_state);
}

fn render_info_popup(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let width = lines.iter().map(|l| l.width() as u16).max().unwrap_or(0) + 4;
    let popup_area = centered_popup(area, width.max(30), lines.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup_area);
}

fn render_keybindings(frame: &mut Frame, area: Rect) {
    let rows = [
        ("Enter", "send message"),
        ("Esc", "leave the input to scroll"),
        ("i", "back to the input"),
        ("j/k PgUp/PgDn", "scroll the conversation"),
        ("g/G", "jump to top/bottom"),
        ("/image <prompt>", "generate an image"),
        ("Ctrl-O", "open the latest image"),
        ("F2 Ctrl-N", "toggle this menu"),
        ("Ctrl-C", "quit"),
    ];

    let lines = rows
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!(" {:<16}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();

    render_info_popup(frame, area, "Keybindings", lines);
}

fn render_about(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" 👻 Ghost", Style::default().fg(Color::Cyan).bold())),
        Line::from(format!(" version {}", env!("CARGO_PKG_VERSION"))),
        Line::default(),
        Line::from(format!(" {}", GREETING)),
        Line::from(" Prompts starting with /image are sent to"),
        Line::from(" the image generator; replies that are links"),
        Line::from(" are shown as images."),
    ];

    render_info_popup(frame, area, "About", lines);
}
