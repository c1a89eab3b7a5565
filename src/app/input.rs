/// Single line text field with a character-based cursor
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    content: String,
    cursor: usize,
    max_len: Option<usize>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    /// Returns false when the limit is reached
    pub fn insert(&mut self, c: char) -> bool {
        if self.max_len.is_some_and(|max| self.len() >= max) {
            return false;
        }
        let byte_pos = self.cursor_byte_position();
        self.content.insert(byte_pos, c);
        self.cursor += 1;
        true
    }

    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.remove_at_cursor();
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        self.remove_at_cursor();
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn remove_at_cursor(&mut self) {
        let byte_pos = self.cursor_byte_position();
        let next_byte_pos = self.content[byte_pos..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| byte_pos + i)
            .unwrap_or(self.content.len());
        self.content.drain(byte_pos..next_byte_pos);
    }

    fn cursor_byte_position(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_are_char_aware() {
        let mut input = InputBuffer::new();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.move_left();
        input.move_left();
        assert!(input.delete_back());
        assert_eq!(input.content(), "hélo");
        input.move_start();
        assert!(input.delete_forward());
        assert_eq!(input.content(), "élo");
        assert!(!{
            input.move_start();
            input.delete_back()
        });
    }

    #[test]
    fn limit_rejects_extra_characters() {
        let mut input = InputBuffer::with_limit(3);
        assert!(input.insert('a'));
        assert!(input.insert('b'));
        assert!(input.insert('c'));
        assert!(!input.insert('d'));
        assert_eq!(input.content(), "abc");
    }
}
