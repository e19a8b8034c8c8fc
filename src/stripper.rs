//! Comment removal for C-family source text.
//!
//! The scanner is a single pass over the input with one unit of lookahead. It
//! drops `// ...` and `/* ... */` regions while passing string and character
//! literals through verbatim, so a `"http://..."` or `'/*'` is never mistaken
//! for a comment. Newlines inside removed regions are kept, which leaves the
//! line numbers of the surrounding code unchanged.
//!
//! The scanner is generic over its input unit: it runs over `char`s for text
//! and over raw `u8`s for files that are not valid UTF-8. Every delimiter it
//! looks for is ASCII, and UTF-8 continuation bytes never collide with ASCII,
//! so both forms produce the same output for valid UTF-8.

use std::iter::{FusedIterator, Peekable};

/// The lexical region the scanner is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Plain code.
    #[default]
    Default,
    /// Inside a `"..."` literal.
    InString,
    /// Inside a `'...'` literal.
    InChar,
    /// Inside a `//` comment, up to the next newline.
    InLineComment,
    /// Inside a `/* ... */` comment.
    InBlockComment,
}

/// A unit of source text the scanner can operate on.
pub trait SourceUnit: Copy {
    /// Returns `true` if this unit is the given ASCII byte.
    fn is(self, ascii: u8) -> bool;
}

impl SourceUnit for char {
    fn is(self, ascii: u8) -> bool {
        self == char::from(ascii)
    }
}

impl SourceUnit for u8 {
    fn is(self, ascii: u8) -> bool {
        self == ascii
    }
}

/// An iterator adaptor that yields its input with comments removed.
///
/// # Examples
///
/// ```
/// use decomment::stripper::CommentStripper;
///
/// let code: String = CommentStripper::new("a /* b */ c".chars()).collect();
/// assert_eq!(code, "a  c");
/// ```
pub struct CommentStripper<I: Iterator> {
    input: Peekable<I>,
    state: ScanState,
    // Second half of an escape pair, emitted on the next call.
    pending: Option<I::Item>,
}

impl<I> CommentStripper<I>
where
    I: Iterator,
    I::Item: SourceUnit,
{
    /// Creates a stripper in the `Default` state.
    pub fn new(input: I) -> Self {
        Self {
            input: input.peekable(),
            state: ScanState::Default,
            pending: None,
        }
    }

    /// The state the scanner is in after the units consumed so far.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Consumes the lookahead unit if it is `ascii`.
    fn next_is(&mut self, ascii: u8) -> bool {
        self.input.next_if(|&unit| unit.is(ascii)).is_some()
    }
}

impl<I> Iterator for CommentStripper<I>
where
    I: Iterator,
    I::Item: SourceUnit,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(unit) = self.pending.take() {
            return Some(unit);
        }

        while let Some(unit) = self.input.next() {
            match self.state {
                ScanState::Default => {
                    if unit.is(b'"') {
                        self.state = ScanState::InString;
                    } else if unit.is(b'\'') {
                        self.state = ScanState::InChar;
                    } else if unit.is(b'/') {
                        if self.next_is(b'/') {
                            self.state = ScanState::InLineComment;
                            continue;
                        }
                        if self.next_is(b'*') {
                            self.state = ScanState::InBlockComment;
                            continue;
                        }
                    }
                    return Some(unit);
                }
                ScanState::InString | ScanState::InChar => {
                    let terminator = if self.state == ScanState::InString {
                        b'"'
                    } else {
                        b'\''
                    };
                    if unit.is(b'\\') {
                        // Blind skip: whatever follows the backslash is literal text.
                        self.pending = self.input.next();
                    } else if unit.is(terminator) {
                        self.state = ScanState::Default;
                    }
                    return Some(unit);
                }
                ScanState::InLineComment => {
                    if unit.is(b'\n') {
                        self.state = ScanState::Default;
                        return Some(unit);
                    }
                }
                ScanState::InBlockComment => {
                    if unit.is(b'*') && self.next_is(b'/') {
                        self.state = ScanState::Default;
                    } else if unit.is(b'\r') || unit.is(b'\n') {
                        return Some(unit);
                    }
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = usize::from(self.pending.is_some());
        let (_, upper) = self.input.size_hint();
        (pending, upper.map(|n| n + pending))
    }
}

impl<I> FusedIterator for CommentStripper<I>
where
    I: FusedIterator,
    I::Item: SourceUnit,
{
}

/// Returns `source` with all comments removed.
///
/// This never fails: unterminated comments run to the end of the input and
/// unterminated literals are passed through as they are.
pub fn strip_comments(source: &str) -> String {
    CommentStripper::new(source.chars()).collect()
}

/// Byte-level variant of [`strip_comments`] for input that may not be UTF-8.
///
/// Bytes that are not part of a comment are copied unchanged, including any
/// invalid UTF-8 sequences.
pub fn strip_comment_bytes(source: &[u8]) -> Vec<u8> {
    CommentStripper::new(source.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_line_comment_keeps_newline() {
        assert_eq!(strip_comments("int x = 5; // set x\n"), "int x = 5; \n");
    }

    #[test]
    fn test_url_in_string_is_not_a_comment() {
        let src = r#"char *s = "http://example.com";"#;
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_block_comment_keeps_inner_newlines() {
        assert_eq!(strip_comments("/* multi\nline */int y;"), "\nint y;");
    }

    #[test]
    fn test_escaped_quote_in_char_literal() {
        let src = r"char c = '\'';";
        assert_eq!(strip_comments(src), src);
        // `'\\'` closes, then the trailing `'` opens a literal that runs to the end.
        let src = r"char c = '\\''; // tail";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_escaped_quote_in_string_literal() {
        let src = "puts(\"say \\\"/* hi */\\\"\"); /* gone */";
        assert_eq!(strip_comments(src), "puts(\"say \\\"/* hi */\\\"\"); ");
    }

    #[test]
    fn test_escaped_backslash_closes_string() {
        // `"\\"` is a complete literal, so the comment after it is real.
        assert_eq!(strip_comments(r#"s = "\\"; // c"#), r#"s = "\\"; "#);
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(strip_comments("/* abc"), "");
        assert_eq!(strip_comments("x;/* a\nb"), "x;\n");
    }

    #[test]
    fn test_unterminated_string_passes_through() {
        assert_eq!(strip_comments("\"abc"), "\"abc");
        assert_eq!(strip_comments("\"abc // not a comment"), "\"abc // not a comment");
    }

    #[test]
    fn test_trailing_backslash_in_literal() {
        assert_eq!(strip_comments("\"abc\\"), "\"abc\\");
        assert_eq!(strip_comment_bytes(b"'\\"), b"'\\");
    }

    #[test]
    fn test_division_is_not_a_comment() {
        assert_eq!(strip_comments("a = b / c;"), "a = b / c;");
        assert_eq!(strip_comments("a = b /"), "a = b /");
        assert_eq!(strip_comments("a = b/*c*//d;"), "a = b/d;");
    }

    #[test]
    fn test_crlf_preserved_in_block_comment() {
        assert_eq!(strip_comments("a;/* x\r\ny\r\n*/b;\r\n"), "a;\r\n\r\nb;\r\n");
    }

    #[test]
    fn test_line_comment_drops_carriage_return() {
        // Only the `\n` terminates a line comment, so a CRLF loses its `\r`.
        assert_eq!(strip_comments("a; // x\r\nb;"), "a; \nb;");
    }

    #[test]
    fn test_comment_openers_inside_comments() {
        assert_eq!(strip_comments("/* // */x"), "x");
        assert_eq!(strip_comments("// /* \nx */"), "\nx */");
        assert_eq!(strip_comments("/* \"quoted */ x"), " x");
        assert_eq!(strip_comments("/***/y"), "y");
        assert_eq!(strip_comments("/**/*/"), "*/");
    }

    #[test]
    fn test_quotes_inside_comments_are_ignored() {
        assert_eq!(strip_comments("// don't\nint a;"), "\nint a;");
        assert_eq!(strip_comments("/* it's */ int b;"), " int b;");
    }

    #[test]
    fn test_state_after_input() {
        let mut stripper = CommentStripper::new("x /* open".chars());
        while stripper.next().is_some() {}
        assert_eq!(stripper.state(), ScanState::InBlockComment);

        let mut stripper = CommentStripper::new("\"open".chars());
        while stripper.next().is_some() {}
        assert_eq!(stripper.state(), ScanState::InString);
    }

    #[test]
    fn test_invalid_utf8_survives_byte_scan() {
        let src = b"char s[] = \"\xff\xfe\"; /* \xc3 */\n";
        assert_eq!(strip_comment_bytes(src), b"char s[] = \"\xff\xfe\"; \n".to_vec());
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(strip_comments("x = \"héllo\"; // 注释\n"), "x = \"héllo\"; \n");
        assert_eq!(strip_comments("c = '\\é'; /* ü */"), "c = '\\é'; ");
    }

    fn c_like() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[a-z /*\"'\\\\\r\n;é]{0,64}").unwrap()
    }

    proptest! {
        #[test]
        fn prop_idempotent(src in c_like()) {
            let once = strip_comments(&src);
            prop_assert_eq!(strip_comments(&once), once);
        }

        #[test]
        fn prop_newline_count_preserved(src in c_like()) {
            let out = strip_comments(&src);
            prop_assert_eq!(out.matches('\n').count(), src.matches('\n').count());
        }

        #[test]
        fn prop_output_never_longer(src in c_like()) {
            prop_assert!(strip_comments(&src).len() <= src.len());
        }

        #[test]
        fn prop_bytes_match_chars(src in c_like()) {
            prop_assert_eq!(strip_comment_bytes(src.as_bytes()), strip_comments(&src).into_bytes());
        }

        #[test]
        fn prop_clean_input_unchanged(src in "[a-z0-9 /;\n(){}=+]{0,64}") {
            prop_assume!(!src.contains("//") && !src.contains("/*"));
            prop_assert_eq!(strip_comments(&src), src);
        }

        #[test]
        fn prop_string_interior_preserved(
            code in "[a-z =;]{0,16}",
            interior in "[a-z /*'\r\n]{0,32}",
        ) {
            let src = format!("{code}\"{interior}\";");
            prop_assert_eq!(strip_comments(&src), src);
        }

        #[test]
        fn prop_char_interior_preserved(
            code in "[a-z =;]{0,16}",
            interior in "[a-z /*\"]{0,8}",
        ) {
            let src = format!("{code}'{interior}';");
            prop_assert_eq!(strip_comments(&src), src);
        }
    }
}
