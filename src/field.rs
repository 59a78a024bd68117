/// Editable text with a byte cursor that always sits on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    pub value: String,
    cursor: usize,
}

impl FieldValue {
    pub fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    pub fn move_up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            return;
        }
        let col = self.value[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.index_at_col(prev_start, col);
    }

    pub fn move_down(&mut self) {
        let end = self.line_end(self.cursor);
        if end >= self.value.len() {
            return;
        }
        let col = self.value[self.line_start(self.cursor)..self.cursor]
            .chars()
            .count();
        self.cursor = self.index_at_col(end + 1, col);
    }

    pub fn backspace(&mut self) {
        let end = self.cursor;
        self.move_left();
        self.value.drain(self.cursor..end);
    }

    pub fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }

    /// Same length as the value, every char replaced by a bullet.
    pub fn masked(&self) -> String {
        "•".repeat(self.value.chars().count())
    }

    fn line_start(&self, at: usize) -> usize {
        self.value[..at].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self, at: usize) -> usize {
        self.value[at..]
            .find('\n')
            .map(|i| at + i)
            .unwrap_or(self.value.len())
    }

    fn index_at_col(&self, start: usize, col: usize) -> usize {
        let end = self.line_end(start);
        self.value[start..end]
            .char_indices()
            .nth(col)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text() {
        let mut field = FieldValue::new("café");
        field.backspace();
        assert_eq!(field.value, "caf");
        field.insert_char('é');
        field.move_left();
        field.move_left();
        field.insert_char('-');
        assert_eq!(field.value, "ca-fé");
        assert_eq!(field.with_caret(), "ca-▌fé");
    }

    #[test]
    fn vertical_moves_keep_column() {
        let mut field = FieldValue::new("first line\nab\nthird");
        field.move_up();
        assert_eq!(field.cursor, "first line\nab".len());
        field.move_up();
        assert_eq!(field.cursor, 2);
        field.move_down();
        field.move_down();
        assert_eq!(field.cursor, "first line\nab\nth".len());
        field.move_end();
        assert_eq!(field.cursor, field.value.len());
        field.move_home();
        assert_eq!(field.cursor, "first line\nab\n".len());
    }

    #[test]
    fn boundaries_are_safe() {
        let mut field = FieldValue::new("");
        field.backspace();
        field.move_left();
        field.move_right();
        field.move_up();
        field.move_down();
        assert_eq!(field.cursor, 0);
        field.insert_char('k');
        assert_eq!(field.masked(), "•");
        assert_eq!(field.take(), "k");
        assert!(field.is_blank());
    }
}
