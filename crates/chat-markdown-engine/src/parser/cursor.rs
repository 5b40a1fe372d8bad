/// A cursor for character-by-character scanning of the remaining input.
///
/// Positions are byte offsets into `s` and always sit on a char boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being scanned.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`.
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Peeks at the current char without advancing.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The unscanned remainder.
    pub fn rest(&self) -> &'a str {
        self.s.get(self.i..).unwrap_or_default()
    }

    /// Advances by one char, returning it.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += c.len_utf8();
        Some(c)
    }

    /// Advances while `pred` holds, returning how many chars were consumed.
    pub fn bump_while(&mut self, mut pred: impl FnMut(char) -> bool) -> usize {
        let mut n = 0;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.i += c.len_utf8();
            n += 1;
        }
        n
    }

    /// The text consumed so far.
    pub fn consumed(&self) -> &'a str {
        &self.s[..self.i.min(self.s.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello");
        assert_eq!(cur.peek(), Some('h'));
        assert_eq!(cur.bump(), Some('h'));
        assert_eq!(cur.consumed(), "h");
        assert_eq!(cur.rest(), "ello");
    }

    #[test]
    fn multibyte_chars_advance_by_their_width() {
        let mut cur = Cursor::new("¯x");
        assert_eq!(cur.bump(), Some('¯'));
        assert_eq!(cur.consumed().len(), 2);
        assert_eq!(cur.peek(), Some('x'));
    }

    #[test]
    fn empty_string_input() {
        let mut cur = Cursor::new("");
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.bump(), None);
        assert_eq!(cur.rest(), "");
    }

    #[test]
    fn bump_while_stops_at_first_mismatch() {
        let mut cur = Cursor::new("abc1");
        assert_eq!(cur.bump_while(|c| c.is_ascii_alphabetic()), 3);
        assert_eq!(cur.peek(), Some('1'));
        assert_eq!(cur.bump_while(|c| c.is_ascii_alphabetic()), 0);
    }

    #[test]
    fn bump_at_eof_returns_none() {
        let mut cur = Cursor::new("x");
        assert_eq!(cur.bump(), Some('x'));
        assert_eq!(cur.bump(), None);
        assert_eq!(cur.bump(), None);
    }
}
