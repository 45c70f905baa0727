//! Turning session state into something a terminal can show.
//!
//! Everything here is a pure function of [`SessionState`]: the session
//! never draws anything by itself, and the terminal never keeps a copy of
//! the conversation.

use little_chat_core::SessionState;
use little_chat_core::conversation::Role;
use owo_colors::OwoColorize;

/// Text shown while waiting for an answer.
pub const LOADING_TEXT: &str = "Loading...";

/// Which side of the screen a row sticks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Align {
    /// Sticks to the left edge.
    Left,
    /// Sticks to the right edge.
    Right,
}

/// How a row looks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Style {
    /// A question from the user.
    User,
    /// An answer from the model.
    Bot,
    /// The loading indicator.
    Loading,
    /// The error banner.
    Error,
}

/// One thing to draw: a chat bubble, the loading indicator or the error
/// banner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Row {
    /// Which side this row sticks to.
    pub align: Align,
    /// How this row looks.
    pub style: Style,
    /// The text in it.
    pub text: String,
}

impl Row {
    fn new(align: Align, style: Style, text: impl Into<String>) -> Self {
        Self {
            align,
            style,
            text: text.into(),
        }
    }
}

/// Projects `state` to rows, top to bottom.
///
/// Every message becomes a bubble, the user's on the right and the
/// model's on the left. The loading indicator follows the messages while
/// a question is in flight, and the error banner comes last.
pub fn render(state: &SessionState) -> Vec<Row> {
    let mut rows: Vec<_> = state
        .conversation()
        .iter()
        .map(|msg| match msg.role() {
            Role::User => Row::new(Align::Right, Style::User, msg.text()),
            Role::Bot => Row::new(Align::Left, Style::Bot, msg.text()),
        })
        .collect();
    if state.is_loading() {
        rows.push(Row::new(Align::Left, Style::Loading, LOADING_TEXT));
    }
    if let Some(error) = state.error() {
        rows.push(Row::new(Align::Left, Style::Error, error));
    }
    rows
}

/// Tracks what has been printed to a terminal that can only append, so the
/// bottom of the conversation is always what's on screen.
///
/// The loading indicator is left out, since a terminal shows it as a
/// transient spinner rather than a printed line.
#[derive(Clone, Debug, Default)]
pub struct Scrollback {
    printed_messages: usize,
    /// Conversation length when the error banner was last printed.
    error_shown_at: Option<usize>,
}

impl Scrollback {
    /// Returns the rows of `state` that have not been printed yet.
    pub fn take_new_rows(&mut self, state: &SessionState) -> Vec<Row> {
        let message_count = state.conversation().len();
        let mut rows: Vec<_> = render(state)
            .into_iter()
            .take(message_count)
            .skip(self.printed_messages)
            .collect();
        self.printed_messages = message_count.max(self.printed_messages);

        // A failed submission always adds a user turn, so a banner for a
        // longer conversation belongs to a new failure.
        match state.error() {
            Some(error) if self.error_shown_at != Some(message_count) => {
                rows.push(Row::new(Align::Left, Style::Error, error));
                self.error_shown_at = Some(message_count);
            }
            Some(_) => {}
            None => self.error_shown_at = None,
        }
        rows
    }
}

/// A row laid out in a terminal: one line of text and its indentation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Line {
    /// Columns of blank space before the text.
    pub indent: usize,
    /// How the text looks.
    pub style: Style,
    /// The text, already padded into a bubble.
    pub text: String,
}

/// Lays `rows` out in a terminal that is `width` columns wide.
///
/// Bubbles are at most two thirds of the width, and are separated by a
/// blank line. The error banner takes the full width.
pub fn layout(rows: &[Row], width: usize) -> Vec<Vec<Line>> {
    let width = width.max(8);
    rows.iter()
        .map(|row| {
            let max_text = match row.style {
                Style::Error => width - 2,
                _ => (width * 2 / 3).max(4) - 2,
            };
            let wrapped = wrap(&row.text, max_text);
            let bubble_width = wrapped
                .iter()
                .map(|l| l.chars().count())
                .max()
                .unwrap_or(0)
                + 2;
            wrapped
                .into_iter()
                .map(|l| {
                    let pad = bubble_width - 2 - l.chars().count();
                    let text = format!(" {l}{} ", " ".repeat(pad));
                    let indent = match row.align {
                        Align::Left => 0,
                        Align::Right => width.saturating_sub(bubble_width),
                    };
                    Line {
                        indent,
                        style: row.style,
                        text,
                    }
                })
                .collect()
        })
        .collect()
}

/// Lays out and colors `rows`, ready to be printed.
pub fn paint(rows: &[Row], width: usize) -> String {
    let mut out = String::new();
    for (i, lines) in layout(rows, width).iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in lines {
            let text = &line.text;
            let painted = match line.style {
                Style::User => text.white().on_blue().to_string(),
                Style::Bot => text.black().on_bright_white().to_string(),
                Style::Loading => text.dimmed().to_string(),
                Style::Error => text.red().bold().to_string(),
            };
            out.push_str(&" ".repeat(line.indent));
            out.push_str(&painted);
            out.push('\n');
        }
    }
    out
}

/// Wraps `text` into lines of at most `max` characters, breaking at
/// whitespace where possible. Explicit line breaks are kept.
fn wrap(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(max);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if line_len == 0 {
                word.len()
            } else {
                word.len() + 1
            };
            if line_len > 0 && line_len + needed > max {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
