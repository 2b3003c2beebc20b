use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::style;
use super::FieldId;
use super::RenderContext;
use crate::theme::Em;
use crate::theme::TextTransform;

pub const DEFAULT_PLACEHOLDER: &str = "Click to edit...";

type CommitFn = Box<dyn FnOnce(FieldId, String) + Send>;

/// What a key did to an open editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// The text or cursor changed.
    Edited,
    /// The user left the field; call [`TextEditor::blur`].
    Blur,
    /// The user abandoned the edit; drop the editor.
    Cancel,
    Ignored,
}

/// In-place editing state for one field.
///
/// The committed value is delivered once, through the callback, when the
/// editor loses focus. Cancelling never calls it.
pub struct TextEditor {
    field: FieldId,
    original: String,
    buffer: String,
    /// Byte offset into `buffer`, always on a grapheme boundary.
    cursor: usize,
    on_commit: Option<CommitFn>,
}

impl TextEditor {
    pub fn new(field: FieldId, initial: Option<&str>) -> Self {
        let buffer = initial.unwrap_or_default().to_string();
        Self {
            field,
            original: buffer.clone(),
            cursor: buffer.len(),
            buffer,
            on_commit: None,
        }
    }

    pub fn on_commit(mut self, callback: impl FnOnce(FieldId, String) + Send + 'static) -> Self {
        self.on_commit = Some(Box::new(callback));
        self
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer != self.original
    }

    pub fn insert(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(start) = self.prev_boundary() {
            self.buffer.replace_range(start..self.cursor, "");
            self.cursor = start;
        }
    }

    pub fn delete(&mut self) {
        if let Some(end) = self.next_boundary() {
            self.buffer.replace_range(self.cursor..end, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(start) = self.prev_boundary() {
            self.cursor = start;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(end) = self.next_boundary() {
            self.cursor = end;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.buffer[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.buffer[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorKey {
        match key.code {
            KeyCode::Esc => EditorKey::Cancel,
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.insert('\n');
                EditorKey::Edited
            }
            KeyCode::Enter | KeyCode::Tab | KeyCode::BackTab => EditorKey::Blur,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert(c);
                EditorKey::Edited
            }
            KeyCode::Backspace => {
                self.backspace();
                EditorKey::Edited
            }
            KeyCode::Delete => {
                self.delete();
                EditorKey::Edited
            }
            KeyCode::Left => {
                self.move_left();
                EditorKey::Edited
            }
            KeyCode::Right => {
                self.move_right();
                EditorKey::Edited
            }
            KeyCode::Home => {
                self.move_home();
                EditorKey::Edited
            }
            KeyCode::End => {
                self.move_end();
                EditorKey::Edited
            }
            _ => EditorKey::Ignored,
        }
    }

    /// Ends editing. The callback fires only if the text differs from the
    /// value the editor opened with; a blur that leaves it as it was saves
    /// nothing, so no request goes out for it.
    pub fn blur(mut self) -> Option<String> {
        if !self.is_dirty() {
            return None;
        }
        if let Some(callback) = self.on_commit.take() {
            callback(self.field, self.buffer.clone());
        }
        Some(self.buffer)
    }

    /// Splits the buffer into rows of at most `width` columns and reports
    /// the row and column of the cursor.
    pub fn rows(&self, width: u16) -> (Vec<String>, (u16, u16)) {
        let width = width.max(1) as usize;
        let mut rows = vec![String::new()];
        let mut cursor = (0, 0);
        let mut col = 0;
        for (offset, grapheme) in self.buffer.grapheme_indices(true) {
            if offset == self.cursor {
                cursor = (rows.len() as u16 - 1, col as u16);
            }
            if grapheme == "\n" {
                rows.push(String::new());
                col = 0;
                continue;
            }
            let w = grapheme.width();
            if col + w > width && col > 0 {
                rows.push(String::new());
                col = 0;
                if offset == self.cursor {
                    cursor = (rows.len() as u16 - 1, 0);
                }
            }
            if let Some(row) = rows.last_mut() {
                row.push_str(grapheme);
            }
            col += w;
        }
        if self.cursor >= self.buffer.len() {
            if col >= width {
                rows.push(String::new());
                col = 0;
            }
            cursor = (rows.len() as u16 - 1, col as u16);
        }
        (rows, cursor)
    }
}

impl std::fmt::Debug for TextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEditor")
            .field("field", &self.field)
            .field("buffer", &self.buffer)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

enum Mode<'a> {
    Display,
    Selected,
    Editing(&'a TextEditor),
}

/// A slide text field: plain text when read-only, highlighted when
/// selected, and an editor with a cursor while being edited.
pub struct EditableText<'a> {
    value: Option<&'a str>,
    placeholder: &'a str,
    prefix: &'a str,
    style: Style,
    alignment: Alignment,
    transform: TextTransform,
    spacing: Em,
    accent: Style,
    mode: Mode<'a>,
}

impl<'a> EditableText<'a> {
    pub fn new(value: Option<&'a str>) -> Self {
        Self {
            value: value.filter(|v| !v.is_empty()),
            placeholder: DEFAULT_PLACEHOLDER,
            prefix: "",
            style: Style::default(),
            alignment: Alignment::Left,
            transform: TextTransform::None,
            spacing: Em(0.0),
            accent: Style::default(),
            mode: Mode::Display,
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Text shown before a non-empty value, outside the edited text.
    pub fn prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn alignment(mut self, alignment: impl Into<Alignment>) -> Self {
        self.alignment = alignment.into();
        self
    }

    pub fn transform(mut self, transform: TextTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn letter_spacing(mut self, spacing: Em) -> Self {
        self.spacing = spacing;
        self
    }

    /// Binds the text to `field` so selection and editing show up.
    pub fn field(mut self, ctx: &RenderContext<'a>, field: FieldId) -> Self {
        self.accent = Style::default().fg(ctx.colors.accent.into());
        self.mode = match ctx.editor_for(field) {
            Some(editor) => Mode::Editing(editor),
            None if ctx.is_selected(field) => Mode::Selected,
            None => Mode::Display,
        };
        self
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    fn display_text(&self) -> String {
        match self.value {
            Some(value) => {
                let text = style::transform(value, self.transform);
                format!("{}{}", self.prefix, style::letter_space(&text, self.spacing))
            }
            None => self.placeholder.to_string(),
        }
    }

    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        match self.mode {
            Mode::Editing(editor) => {
                let (rows, (cursor_row, cursor_col)) = editor.rows(width);
                let cursor_style = self.style.add_modifier(Modifier::REVERSED);
                rows.into_iter()
                    .enumerate()
                    .map(|(i, row)| {
                        if i as u16 != cursor_row {
                            return Line::from(Span::styled(row, self.style));
                        }
                        split_at_cursor(&row, cursor_col, self.style, cursor_style)
                    })
                    .collect()
            }
            _ => {
                let mut style = if self.value.is_some() {
                    self.style
                } else {
                    self.style.add_modifier(Modifier::DIM)
                };
                if matches!(self.mode, Mode::Selected) {
                    style = style
                        .add_modifier(Modifier::UNDERLINED)
                        .underline_color(self.accent.fg.unwrap_or_default());
                }
                style::wrap(&self.display_text(), width)
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, style)))
                    .collect()
            }
        }
    }

    /// Rows the text needs at `width`.
    pub fn height(&self, width: u16) -> u16 {
        self.lines(width).len().max(1) as u16
    }
}

fn split_at_cursor(row: &str, col: u16, style: Style, cursor_style: Style) -> Line<'static> {
    let mut before = String::new();
    let mut at = None;
    let mut after = String::new();
    let mut pos = 0;
    for grapheme in row.graphemes(true) {
        if pos < col as usize {
            before.push_str(grapheme);
        } else if at.is_none() {
            at = Some(grapheme.to_string());
        } else {
            after.push_str(grapheme);
        }
        pos += grapheme.width();
    }
    Line::from(vec![
        Span::styled(before, style),
        Span::styled(at.unwrap_or_else(|| " ".to_string()), cursor_style),
        Span::styled(after, style),
    ])
}

impl WidgetRef for EditableText<'_> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines(area.width))
            .alignment(self.alignment)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeRegistry;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn editing_moves_over_graphemes() {
        let mut editor = TextEditor::new(FieldId::Title, Some("café"));
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.value(), "caf");
        editor.handle_key(key(KeyCode::Home));
        editor.handle_key(key(KeyCode::Char('>')));
        editor.handle_key(key(KeyCode::Right));
        editor.handle_key(key(KeyCode::Delete));
        assert_eq!(editor.value(), ">cf");
    }

    #[test]
    fn blur_reports_changed_value_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut editor = TextEditor::new(FieldId::Body, Some("old"))
            .on_commit(move |field, value| sink.lock().unwrap().push((field, value)));
        assert_eq!(editor.handle_key(key(KeyCode::Char('!'))), EditorKey::Edited);
        assert_eq!(editor.handle_key(key(KeyCode::Tab)), EditorKey::Blur);
        assert_eq!(editor.blur(), Some("old!".to_string()));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(FieldId::Body, "old!".to_string())]
        );
    }

    #[test]
    fn unchanged_or_cancelled_edits_report_nothing() {
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let editor = TextEditor::new(FieldId::Title, Some("same"))
            .on_commit(move |_, _| *sink.lock().unwrap() += 1);
        assert_eq!(editor.blur(), None);

        // typed and then removed again
        let sink = Arc::clone(&seen);
        let mut editor = TextEditor::new(FieldId::Title, Some("same"))
            .on_commit(move |_, _| *sink.lock().unwrap() += 1);
        editor.handle_key(key(KeyCode::Char('!')));
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.blur(), None);

        let sink = Arc::clone(&seen);
        let mut editor = TextEditor::new(FieldId::Title, Some("same"))
            .on_commit(move |_, _| *sink.lock().unwrap() += 1);
        editor.insert('x');
        assert_eq!(editor.handle_key(key(KeyCode::Esc)), EditorKey::Cancel);
        drop(editor);
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn rows_track_the_cursor() {
        let mut editor = TextEditor::new(FieldId::Body, Some("abcdef"));
        assert_eq!(editor.rows(4), (vec!["abcd".to_string(), "ef".to_string()], (1, 2)));
        editor.move_home();
        editor.move_right();
        assert_eq!(editor.rows(4).1, (0, 1));
        let full = TextEditor::new(FieldId::Body, Some("abcd"));
        assert_eq!(full.rows(4).1, (1, 0));
    }

    #[test]
    fn read_only_shows_value_or_placeholder() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 1));
        EditableText::new(None).render_ref(buf.area, &mut buf);
        assert_eq!(row_text(&buf, 0), DEFAULT_PLACEHOLDER);

        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 1));
        EditableText::new(Some("Plan"))
            .placeholder("Slide Title")
            .transform(TextTransform::Uppercase)
            .render_ref(buf.area, &mut buf);
        assert_eq!(row_text(&buf, 0), "PLAN");
    }

    #[test]
    fn editing_shows_raw_buffer_with_cursor() {
        let registry = ThemeRegistry::builtin().unwrap();
        let editor = TextEditor::new(FieldId::Title, Some("Plan"));
        let ctx = RenderContext::new(registry.resolve_theme("minimal"))
            .editable(true)
            .selected(Some(FieldId::Title), Some(&editor));
        let text = EditableText::new(Some("Plan"))
            .transform(TextTransform::Uppercase)
            .field(&ctx, FieldId::Title);

        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 1));
        text.render_ref(buf.area, &mut buf);
        assert_eq!(row_text(&buf, 0), "Plan");
        assert!(buf[(4, 0)].modifier.contains(Modifier::REVERSED));
    }
}
