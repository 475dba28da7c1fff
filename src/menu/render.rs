//! Frame composition and diffed presentation.
//!
//! Screens never draw directly.  Each draw strategy composes a [`Frame`]
//! (title plus up to [`MAX_ROWS`] rows) from the menu context, and the
//! [`Renderer`] pushes it to a [`RenderPort`]:
//!
//! ```text
//!   full redraw     clear ─▶ header/dialog ─▶ every row
//!   partial redraw  for each row: last != new ─▶ clear_row ─▶ row
//! ```
//!
//! The renderer keeps the last presented frame as its snapshot, so a
//! partial redraw touches only the rows whose content actually changed.

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::app::ports::RenderPort;

/// Characters per display line.
pub const LINE_LEN: usize = 24;

/// Content rows below the header.
pub const MAX_ROWS: usize = 12;

pub type Line = String<LINE_LEN>;

/// Build a line from a `&str`, truncating at [`LINE_LEN`] bytes.
pub fn line(s: &str) -> Line {
    let mut out = Line::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Build a line from format arguments; overflow is truncated.
pub fn fmt_line(args: fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    let _ = out.write_fmt(args);
    out
}

// ───────────────────────────────────────────────────────────────
// Rows and frames
// ───────────────────────────────────────────────────────────────

/// Visual state of an editor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStyle {
    Normal,
    /// Cursor is on the field.
    Selected,
    /// Encoder is mutating the field.
    Editing,
    /// Field is rendered but cannot take focus edits (grayed).
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Blank,
    Text(Line),
    Item { text: Line, selected: bool },
    Field { label: Line, value: Line, style: FieldStyle },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub title: Line,
    /// Dialog message.  `Some` renders the frame as a modal dialog.
    pub dialog: Option<Line>,
    pub rows: Vec<Row, MAX_ROWS>,
}

impl Frame {
    pub fn new(title: &str) -> Self {
        Self {
            title: line(title),
            ..Default::default()
        }
    }

    pub fn dialog(title: &str, message: &str) -> Self {
        Self {
            title: line(title),
            dialog: Some(line(message)),
            rows: Vec::new(),
        }
    }

    /// Append a row.  Rows past [`MAX_ROWS`] are dropped.
    pub fn push(&mut self, row: Row) {
        let _ = self.rows.push(row);
    }

    pub fn text(&mut self, text: &str) {
        self.push(Row::Text(line(text)));
    }

    pub fn text_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.push(Row::Text(fmt_line(args)));
    }

    pub fn item(&mut self, text: &str, selected: bool) {
        self.push(Row::Item {
            text: line(text),
            selected,
        });
    }

    pub fn field(&mut self, label: &str, value: Line, style: FieldStyle) {
        self.push(Row::Field {
            label: line(label),
            value,
            style,
        });
    }

    pub fn blank(&mut self) {
        self.push(Row::Blank);
    }
}

// ───────────────────────────────────────────────────────────────
// Notices
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTone {
    Success,
    Warning,
    Error,
}

/// A toast: overlays the current screen until `expires_at_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: Line,
    pub tone: NoticeTone,
    pub expires_at_ms: u32,
}

impl Notice {
    pub fn new(text: &str, tone: NoticeTone, now_ms: u32, duration_ms: u32) -> Self {
        Self {
            text: line(text),
            tone,
            expires_at_ms: now_ms.wrapping_add(duration_ms),
        }
    }

    /// Wrap-safe deadline check.
    pub fn is_expired(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.expires_at_ms) < u32::MAX / 2
    }
}

// ───────────────────────────────────────────────────────────────
// Renderer
// ───────────────────────────────────────────────────────────────

/// Owns the last-presented frame and emits minimal draw calls.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<Frame>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the snapshot; the next present is a full redraw.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    /// Present `frame`.  Returns the number of rows drawn.
    pub fn present(&mut self, frame: &Frame, full: bool, surface: &mut impl RenderPort) -> usize {
        let structural = match &self.last {
            Some(prev) => prev.title != frame.title || prev.dialog != frame.dialog,
            None => true,
        };

        let drawn = if full || structural {
            surface.clear();
            match &frame.dialog {
                Some(message) => surface.draw_dialog(&frame.title, message),
                None => surface.draw_header(&frame.title),
            }
            for (i, row) in frame.rows.iter().enumerate() {
                draw_row(surface, i, row);
            }
            frame.rows.len()
        } else {
            self.present_diff(frame, surface)
        };

        self.last = Some(frame.clone());
        drawn
    }

    fn present_diff(&self, frame: &Frame, surface: &mut impl RenderPort) -> usize {
        let Some(prev) = &self.last else {
            return 0;
        };
        let span = prev.rows.len().max(frame.rows.len());
        let mut drawn = 0;
        for i in 0..span {
            let old = prev.rows.get(i);
            let new = frame.rows.get(i);
            if old == new {
                continue;
            }
            surface.clear_row(i);
            if let Some(row) = new {
                draw_row(surface, i, row);
                drawn += 1;
            }
        }
        drawn
    }
}

fn draw_row(surface: &mut impl RenderPort, index: usize, row: &Row) {
    match row {
        Row::Blank => {}
        Row::Text(text) => surface.draw_text_row(index, text),
        Row::Item { text, selected } => surface.draw_list_row(index, text, *selected),
        Row::Field { label, value, style } => surface.draw_field_row(index, label, value, *style),
    }
}
