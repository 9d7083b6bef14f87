//! Single-line input popup used for form fields and the scan surface.

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::dates;

/// How typed text is shaped and shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Free text.
    Text,
    /// Digits and one decimal separator.
    Decimal,
    /// `DD/MM/YYYY`, reformatted on every keystroke.
    Date,
    /// Shown as `*`.
    Secret,
}

/// What the confirmed value is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputTarget {
    LoginCpf,
    LoginMatricula,
    DraftIdentity,
    DraftQuantity,
    DraftValidity,
    /// Payload typed or sent by a keyboard-wedge scanner.
    ScanPayload,
}

/// Input popup state.
#[derive(Clone, Debug)]
pub struct InputBoxState {
    pub prompt: String,
    pub value: String,
    /// Cursor position in characters.
    pub cursor: usize,
    pub kind: InputKind,
    pub target: InputTarget,
}

impl InputBoxState {
    /// Open with `value` and the cursor at its end.
    pub fn new(prompt: &str, value: &str, kind: InputKind, target: InputTarget) -> Self {
        let mut s = Self {
            prompt: prompt.into(),
            value: value.into(),
            cursor: value.chars().count(),
            kind,
            target,
        };
        s.reshape();
        s
    }

    pub fn insert_char(&mut self, c: char) {
        if self.kind == InputKind::Decimal && !(c.is_ascii_digit() || c == ',' || c == '.') {
            return;
        }
        let mut chars: Vec<char> = self.value.chars().collect();
        chars.insert(self.cursor.min(chars.len()), c);
        self.value = chars.into_iter().collect();
        self.cursor += 1;
        self.reshape();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut chars: Vec<char> = self.value.chars().collect();
        if self.cursor <= chars.len() {
            chars.remove(self.cursor - 1);
        }
        self.value = chars.into_iter().collect();
        self.cursor -= 1;
        self.reshape();
    }

    pub fn delete(&mut self) {
        let mut chars: Vec<char> = self.value.chars().collect();
        if self.cursor < chars.len() {
            chars.remove(self.cursor);
            self.value = chars.into_iter().collect();
            self.reshape();
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Date fields are remasked after each edit; the cursor follows the end.
    fn reshape(&mut self) {
        match self.kind {
            InputKind::Date => {
                self.value = dates::mask_date(&self.value);
                self.move_end();
            }
            _ => {
                self.cursor = self.cursor.min(self.value.chars().count());
            }
        }
    }

    fn display_value(&self) -> String {
        match self.kind {
            InputKind::Secret => "*".repeat(self.value.chars().count()),
            _ => self.value.clone(),
        }
    }
}

/// Draw the popup over the current screen.
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 70, 7);
    f.render_widget(Clear, popup_area);

    let title = if state.target == InputTarget::ScanPayload {
        "Scan"
    } else {
        "Input"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(popup_area);

    let prompt = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt, inner[0]);

    // horizontal scroll so the cursor stays visible
    let width = inner[1].width as usize;
    let offset = state.cursor.saturating_sub(width.saturating_sub(2));
    let chars: Vec<char> = state.display_value().chars().collect();
    let visible: Vec<char> = chars.iter().skip(offset).take(width).copied().collect();
    let at = state.cursor.saturating_sub(offset).min(visible.len());
    let before: String = visible[..at].iter().collect();
    let after: String = visible[at..].iter().collect();
    let field =
        Paragraph::new(format!("{before}|{after}")).style(Style::default().fg(Color::Green));
    f.render_widget(field, inner[1]);

    let help = Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner[3]);
}

/// Centered rectangle `width_percent` wide and `height` rows tall.
fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(rows[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(kind: InputKind) -> InputBoxState {
        InputBoxState::new("p", "", kind, InputTarget::DraftQuantity)
    }

    #[test]
    fn date_field_is_masked_per_keystroke() {
        let mut b = boxed(InputKind::Date);
        for c in "01022024".chars() {
            b.insert_char(c);
        }
        assert_eq!(b.value, "01/02/2024");
        assert_eq!(b.cursor, 10);
        b.insert_char('9');
        assert_eq!(b.value, "01/02/2024");
        b.backspace();
        assert_eq!(b.value, "01/02/202");
    }

    #[test]
    fn decimal_field_ignores_letters() {
        let mut b = boxed(InputKind::Decimal);
        for c in "2a,5".chars() {
            b.insert_char(c);
        }
        assert_eq!(b.value, "2,5");
    }

    #[test]
    fn cursor_editing() {
        let mut b = boxed(InputKind::Text);
        for c in "abc".chars() {
            b.insert_char(c);
        }
        b.move_left();
        b.insert_char('X');
        assert_eq!(b.value, "abXc");
        b.move_home();
        b.delete();
        assert_eq!(b.value, "bXc");
        b.move_end();
        b.backspace();
        assert_eq!(b.value, "bX");
        b.clear_line();
        assert_eq!((b.value.as_str(), b.cursor), ("", 0));
    }

    #[test]
    fn secret_is_masked_for_display() {
        let b = InputBoxState::new("cpf", "123", InputKind::Secret, InputTarget::LoginCpf);
        assert_eq!(b.display_value(), "***");
        assert_eq!(b.cursor, 3);
    }
}
