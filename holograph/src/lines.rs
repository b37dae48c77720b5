//! The ordered text lines of a hologram.
//!
//! All operations are zero-based and index-addressed. Writes past the end
//! grow the model with blank lines instead of failing, so callers may
//! address lines sparsely; structural inserts and removals shift every
//! later line by one index.

/// How [`Lines::insert_blank`] resolved its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The index was in range: a blank line now sits there and every later
    /// line moved down by one.
    Inserted,
    /// The index was past the end: blank lines were appended instead.
    Appended,
}

/// An ordered, mutable sequence of text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines(Vec<String>);

impl Lines {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Overwrite the line at `index`, growing the model with blank lines
    /// first when `index` is past the end. Never fails.
    pub fn set(&mut self, index: usize, text: impl Into<String>) {
        while index >= self.0.len() {
            self.0.push(String::new());
        }
        self.0[index] = text.into();
    }

    /// Insert a blank line at `index`, shifting later lines down by one.
    ///
    /// An index at or past the end appends instead: one blank line, then
    /// more until the model is `index` lines long.
    pub fn insert_blank(&mut self, index: usize) -> InsertOutcome {
        if index >= self.0.len() {
            self.0.push(String::new());
            while index > self.0.len() {
                self.0.push(String::new());
            }
            return InsertOutcome::Appended;
        }
        self.0.insert(index, String::new());
        InsertOutcome::Inserted
    }

    /// Remove the line at `index`, shifting later lines up by one. Returns
    /// `false` (leaving the model unchanged) when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.0.len() {
            return false;
        }
        self.0.remove(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Lines {
        Lines::new(texts.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_set_in_range() {
        let mut model = lines(&["a", "b"]);
        model.set(1, "c");
        assert_eq!(model.as_slice(), &["a", "c"]);
    }

    #[test]
    fn test_set_grows_with_blanks() {
        let mut model = lines(&["a", "b"]);
        model.set(5, "f");
        assert_eq!(model.len(), 6);
        assert_eq!(model.as_slice(), &["a", "b", "", "", "", "f"]);
    }

    #[test]
    fn test_insert_blank_shifts_down() {
        let mut model = lines(&["a", "b", "c"]);
        assert_eq!(model.insert_blank(1), InsertOutcome::Inserted);
        assert_eq!(model.as_slice(), &["a", "", "b", "c"]);
    }

    #[test]
    fn test_insert_blank_past_end_appends() {
        let mut model = lines(&["a", "b"]);
        assert_eq!(model.insert_blank(5), InsertOutcome::Appended);
        // pads until the model is five lines long
        assert_eq!(model.as_slice(), &["a", "b", "", "", ""]);
    }

    #[test]
    fn test_insert_blank_at_len_appends_one() {
        let mut model = lines(&["a"]);
        assert_eq!(model.insert_blank(1), InsertOutcome::Appended);
        assert_eq!(model.as_slice(), &["a", ""]);
    }

    #[test]
    fn test_remove() {
        let mut model = lines(&["a", "b", "c"]);
        assert!(model.remove(1));
        assert_eq!(model.as_slice(), &["a", "c"]);
        assert!(!model.remove(2));
        assert_eq!(model.as_slice(), &["a", "c"]);
    }
}
