/// An unsegmented sentence with character-indexed slicing.
///
/// Positions are counted in `char`s, so multi-byte text can be cut
/// anywhere without landing inside a code point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    text: String,
    // Byte offset of every char boundary, including the end of the text.
    bounds: Vec<usize>,
}

impl Sentence {
    pub fn new<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let bounds = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Sentence { text, bounds }
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the characters in `[start, end)`.
    ///
    /// # Panics
    /// Panics if `start > end` or `end > self.len()`.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[self.bounds[start]..self.bounds[end]]
    }
}
