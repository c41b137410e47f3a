//! Source positions for tokens, AST nodes and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of a Steps file, 1-based on both axes.
///
/// Line 0 marks a location that has no place in any file, such as a
/// project-level error about a missing building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "line")]
    pub start_line: u32,
    #[serde(rename = "column")]
    pub start_col: u32,
    pub end_line: u32,
    #[serde(rename = "end_column")]
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// An empty span at one position, used for single-character errors.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Smallest span containing both `self` and `other`.
    ///
    /// Used to stretch a statement's span from its keyword to its last token.
    pub fn merge(self, other: Span) -> Span {
        let start = (self.start_line, self.start_col).min((other.start_line, other.start_col));
        let end = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(start.0, start.1, end.0, end.1)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A numbered source line quoted next to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub number: u32,
    pub text: String,
}

/// A `.building`, `.floor` or `.step` file as text, named by its project path.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset where each line begins.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Text of line `number` (1-based) without its line ending.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        let start = *self.line_starts.get(index)?;
        let end = match self.line_starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.source.len(),
        };
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    /// The lines within `radius` of `line`, stopping at either end of the file.
    pub fn context_lines(&self, line: u32, radius: u32) -> Vec<ContextLine> {
        if line == 0 {
            return Vec::new();
        }
        let first = line.saturating_sub(radius).max(1);
        (first..=line.saturating_add(radius))
            .map_while(|number| {
                self.line(number).map(|text| ContextLine {
                    number,
                    text: text.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETER: &str = "building: greeter\n    set name to \"Ada\"\n    display name\n";

    #[test]
    fn test_statement_span_covers_keyword_to_last_token() {
        let keyword = Span::new(2, 5, 2, 8);
        let value = Span::new(2, 17, 2, 22);
        assert_eq!(keyword.merge(value), Span::new(2, 5, 2, 22));
        assert_eq!(value.merge(keyword), Span::new(2, 5, 2, 22));
    }

    #[test]
    fn test_merge_across_lines_keeps_outer_columns() {
        let header = Span::new(1, 1, 1, 15);
        let body = Span::new(3, 5, 4, 2);
        assert_eq!(header.merge(body), Span::new(1, 1, 4, 2));
    }

    #[test]
    fn test_span_displays_start_position() {
        assert_eq!(Span::point(3, 7).to_string(), "3:7");
    }

    #[test]
    fn test_span_json_uses_diagnostic_field_names() {
        let json = serde_json::to_string(&Span::new(2, 4, 2, 9)).unwrap();
        assert_eq!(json, r#"{"line":2,"column":4,"end_line":2,"end_column":9}"#);
    }

    #[test]
    fn test_lines_of_a_building() {
        let file = SourceFile::new("greeter.building", GREETER);
        assert_eq!(file.line(1), Some("building: greeter"));
        assert_eq!(file.line(3), Some("    display name"));
        assert_eq!(file.line(4), Some(""));
        assert_eq!(file.line(5), None);
        assert_eq!(file.line(0), None);
    }

    #[test]
    fn test_windows_line_endings_are_stripped() {
        let file = SourceFile::new("greeter.building", GREETER.replace('\n', "\r\n"));
        assert_eq!(file.line(2), Some("    set name to \"Ada\""));
    }

    #[test]
    fn test_context_window_around_an_error() {
        let file = SourceFile::new("math/double.step", "a\nb\nc\nd\ne\nf");
        let numbers: Vec<u32> = file.context_lines(3, 2).iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(file.context_lines(3, 2)[2].text, "c");
    }

    #[test]
    fn test_context_window_stops_at_file_edges() {
        let file = SourceFile::new("math/math.floor", "floor: math\n    step: double");
        let numbers: Vec<u32> = file.context_lines(2, 2).iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(file.context_lines(0, 2).is_empty());
    }
}
