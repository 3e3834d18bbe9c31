//! Input field handling for the terminal user interface.

/// A single-line text input with a character-indexed cursor.
#[derive(Clone, Default)]
pub struct InputField {
    pub value: String,
    /// Cursor position in characters, not bytes.
    pub cursor: usize,
    pub active: bool,
    /// Maximum number of characters accepted, if any.
    pub max_chars: Option<usize>,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            ..Self::default()
        }
    }

    /// Limit the field to `max` characters.
    pub fn limited(mut self, max: usize) -> Self {
        self.max_chars = Some(max);
        self
    }

    pub fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor. Ignored once the limit is reached.
    pub fn handle_char(&mut self, c: char) {
        if self.max_chars.is_some_and(|max| self.char_count() >= max) {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text_by_character() {
        let mut field = InputField::with_value("café");
        assert_eq!(field.cursor, 4);
        field.move_cursor_left();
        field.handle_backspace();
        assert_eq!(field.value, "caé");
        field.handle_char('f');
        assert_eq!(field.value, "café");
        field.handle_delete();
        assert_eq!(field.value, "caf");
        field.move_home();
        field.handle_char('>');
        assert_eq!(field.value, ">caf");
    }

    #[test]
    fn limit_blocks_extra_input() {
        let mut field = InputField::new().limited(3);
        for c in "abcd".chars() {
            field.handle_char(c);
        }
        assert_eq!(field.value, "abc");
        assert_eq!(field.char_count(), 3);
    }
}
