//! Character-grid display adapter.
//!
//! Implements [`RenderPort`] by composing each screen into a grid of
//! text rows.  Every row that changes is mirrored to the serial log at
//! debug level, so the console doubles as a headless display.  Draw
//! counters make the adapter usable as a recording surface in tests.

use core::fmt::Write as _;

use log::debug;

use crate::app::ports::RenderPort;
use crate::menu::render::{FieldStyle, Line, MAX_ROWS, Notice, NoticeTone, line};

pub struct TextDisplay {
    title: Line,
    rows: [Line; MAX_ROWS],
    notice: Option<Line>,
    clears: usize,
    row_draws: usize,
    notices: usize,
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay {
    pub fn new() -> Self {
        Self {
            title: Line::new(),
            rows: core::array::from_fn(|_| Line::new()),
            notice: None,
            clears: 0,
            row_draws: 0,
            notices: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Text of content row `index`; cleared and out-of-range rows read "".
    pub fn row(&self, index: usize) -> &str {
        self.rows.get(index).map_or("", |r| r.as_str())
    }

    /// Last notice drawn over the screen, until the next full clear.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Full-screen clears since construction.
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Individual content rows drawn since construction.
    pub fn row_draws(&self) -> usize {
        self.row_draws
    }

    pub fn notices(&self) -> usize {
        self.notices
    }

    /// Index of the first row containing `needle`.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.contains(needle))
    }

    fn put(&mut self, row: usize, text: Line) {
        let Some(slot) = self.rows.get_mut(row) else {
            return;
        };
        debug!("LCD[{:2}] {}", row, text);
        *slot = text;
        self.row_draws += 1;
    }
}

fn compose(args: core::fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    // Overflow only truncates.
    let _ = out.write_fmt(args);
    out
}

impl RenderPort for TextDisplay {
    fn clear(&mut self) {
        self.title.clear();
        for r in &mut self.rows {
            r.clear();
        }
        self.notice = None;
        self.clears += 1;
    }

    fn clear_row(&mut self, row: usize) {
        if let Some(r) = self.rows.get_mut(row) {
            r.clear();
        }
    }

    fn draw_header(&mut self, title: &str) {
        debug!("LCD[hdr] {}", title);
        self.title = line(title);
    }

    fn draw_list_row(&mut self, row: usize, text: &str, selected: bool) {
        let marker = if selected { '>' } else { ' ' };
        self.put(row, compose(format_args!("{} {}", marker, text)));
    }

    fn draw_field_row(&mut self, row: usize, label: &str, value: &str, style: FieldStyle) {
        let text = match style {
            FieldStyle::Normal => compose(format_args!("  {}: {}", label, value)),
            FieldStyle::Selected => compose(format_args!("> {}: {}", label, value)),
            FieldStyle::Editing => compose(format_args!("> {}: <{}>", label, value)),
            FieldStyle::Inactive => compose(format_args!("  ({}: {})", label, value)),
        };
        self.put(row, text);
    }

    fn draw_text_row(&mut self, row: usize, text: &str) {
        self.put(row, line(text));
    }

    fn draw_dialog(&mut self, title: &str, message: &str) {
        debug!("LCD[dlg] {} | {}", title, message);
        self.title = line(title);
        if let Some(first) = self.rows.first_mut() {
            *first = line(message);
        }
    }

    fn draw_notice(&mut self, notice: &Notice) {
        let tag = match notice.tone {
            NoticeTone::Success => "OK",
            NoticeTone::Warning => "!!",
            NoticeTone::Error => "ERR",
        };
        debug!("LCD[ntc] {} {}", tag, notice.text);
        self.notice = Some(notice.text.clone());
        self.notices += 1;
    }
}
