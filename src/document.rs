/// A zero-based position as editors count it: lines, then UTF-16 code units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// The text of a script along with a way of mapping byte offsets to
/// positions.
pub trait Document {
    fn text(&self) -> &str;

    fn position_at(&self, offset: usize) -> Position;
}

#[derive(Clone, Debug)]
pub struct TextDocument {
    text: String,
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> TextDocument {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        TextDocument { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The byte offset of `position`, clamped to its line.
    pub fn offset_at(&self, position: Position) -> usize {
        let Some(&start) = self.line_starts.get(position.line as usize) else {
            return self.text.len();
        };
        let end = self
            .line_starts
            .get(position.line as usize + 1)
            .map_or(self.text.len(), |next| next - 1);
        let mut units = 0;
        for (i, c) in self.text[start..end].char_indices() {
            if units >= position.character as usize {
                return start + i;
            }
            units += c.len_utf16();
        }
        end
    }
}

impl Document for TextDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let character: usize = self.text[start..offset].chars().map(char::len_utf16).sum();
        Position {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            character: u32::try_from(character).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    #[test]
    fn test_position_at() {
        let doc = TextDocument::new("let a;\n\nlet b = 'é𝄞x';\n");
        assert_eq!(doc.position_at(0), pos(0, 0));
        assert_eq!(doc.position_at(4), pos(0, 4));
        assert_eq!(doc.position_at(7), pos(1, 0));
        assert_eq!(doc.position_at(8), pos(2, 0));
        // 'é' is one UTF-16 unit, '𝄞' two.
        let x = doc.text().find('x').unwrap();
        assert_eq!(doc.position_at(x), pos(2, 12));
        assert_eq!(doc.position_at(10_000), pos(3, 0));
        assert_eq!(doc.line_count(), 4);
    }

    #[test]
    fn test_offset_at_inverts_position_at() {
        let doc = TextDocument::new("a = 'ü';\nb = 2;");
        for offset in [0, 4, 5, 7, 9, 13] {
            assert_eq!(doc.offset_at(doc.position_at(offset)), offset);
        }
        assert_eq!(doc.offset_at(pos(0, 99)), 9);
        assert_eq!(doc.offset_at(pos(7, 0)), doc.text().len());
    }
}
