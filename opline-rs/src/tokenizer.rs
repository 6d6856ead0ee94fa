//! Command line tokenizer.
//!
//! Splits a raw line into tokens on a separator, honoring `'`/`"` quoted
//! strings that span several separator-delimited chunks, backslash escapes and
//! an optional split limit.
//!
//! Escapes:
//!
//! | Sequence | Result |
//! |----------|--------|
//! | `\\` | `\` |
//! | `\"` / `\'` | literal quote, never opens or closes a string |
//! | `\` + newline | newline, never separates tokens |
//! | `\t` / `\n` | tab / newline |
//! | `\uXXXX` | code point from 4 hex digits |
//! | `\xXX` | code point from 2 hex digits |
//!
//! Any other backslash sequence is kept verbatim.
//!
//! ```
//! use opline::tokenizer::{split_string, tokenize, Separator};
//!
//! assert_eq!(tokenize(r#"cmd "a b" c"#), ["cmd", "a b", "c"]);
//! assert_eq!(tokenize(r#"cmd "a\"b""#), ["cmd", "a\"b"]);
//! assert_eq!(
//!     split_string("a b c d", Separator::Whitespace, Some(2)),
//!     ["a", "b", "c d"]
//! );
//! ```

// Escaped characters are parked in the private use area while quotes are
// being matched, then restored on every finished token.
const ESCAPED_BACKSLASH: char = '\u{E000}';
const ESCAPED_DOUBLE_QUOTE: char = '\u{E001}';
const ESCAPED_SINGLE_QUOTE: char = '\u{E002}';
const ESCAPED_NEWLINE: char = '\u{E003}';

/// Token separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// Any Unicode whitespace (default).
    #[default]
    Whitespace,

    /// A single character.
    Char(char),
}

impl Separator {
    fn matches(self, c: char) -> bool {
        match self {
            Separator::Whitespace => c.is_whitespace(),
            Separator::Char(sep) => c == sep,
        }
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Tokenize with the default whitespace separator and no limit.
pub fn tokenize(text: &str) -> Vec<String> {
    split_string(text, Separator::Whitespace, None)
}

/// Split `text` into tokens.
///
/// With `max = Some(n)` at most `n + 1` tokens are produced: once `n + 1`
/// tokens exist, every further piece is appended to the last token together
/// with the separator run that preceded it.
///
/// An unterminated quoted string at the end of input becomes the final token,
/// opening quote included, instead of an error.
pub fn split_string(text: &str, separator: Separator, max: Option<usize>) -> Vec<String> {
    let encoded = encode_control_chars(text);
    let mut tokens = Tokens {
        items: Vec::new(),
        max,
    };

    // Open quoted string: (gap before it, text so far, opening quote)
    let mut pending: Option<(String, String, char)> = None;

    for (gap, raw) in chunks(&encoded, separator) {
        let chunk = parse_escape_sequences(&raw);

        match pending.take() {
            None => {
                if let Some(quote) = opening_quote(&chunk) {
                    pending = Some((gap, chunk, quote));
                } else {
                    tokens.push(&gap, decode_control_chars(strip_outer_quotes(&chunk)));
                }
            }
            Some((start_gap, mut buf, quote)) => {
                buf.push_str(&gap);
                buf.push_str(&chunk);
                if closes(&chunk, quote) {
                    tokens.push(&start_gap, decode_control_chars(strip_outer_quotes(&buf)));
                } else {
                    pending = Some((start_gap, buf, quote));
                }
            }
        }
    }

    if let Some((start_gap, buf, _)) = pending {
        tokens.push(&start_gap, decode_control_chars(&buf));
    }

    tokens.items
}

struct Tokens {
    items: Vec<String>,
    max: Option<usize>,
}

impl Tokens {
    fn push(&mut self, gap: &str, piece: String) {
        let full = self.max.is_some_and(|max| self.items.len() > max);
        match self.items.last_mut() {
            Some(last) if full => {
                last.push_str(gap);
                last.push_str(&piece);
            }
            _ => self.items.push(piece),
        }
    }
}

/// Maximal runs of non-separator characters, each paired with the separator
/// run in front of it.
fn chunks(text: &str, separator: Separator) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut gap = String::new();
    let mut chunk = String::new();

    for c in text.chars() {
        if separator.matches(c) {
            if !chunk.is_empty() {
                out.push((std::mem::take(&mut gap), std::mem::take(&mut chunk)));
            }
            gap.push(c);
        } else {
            chunk.push(c);
        }
    }
    if !chunk.is_empty() {
        out.push((gap, chunk));
    }
    out
}

/// The quote character if `chunk` starts a string that continues past it.
///
/// A lone quote both starts and ends with itself, so it never opens a span.
fn opening_quote(chunk: &str) -> Option<char> {
    let first = chunk.chars().next().filter(|c| is_quote(*c))?;
    (chunk.chars().last() != Some(first)).then_some(first)
}

/// Whether `chunk` ends with an unescaped `quote`.
fn closes(chunk: &str, quote: char) -> bool {
    let mut rev = chunk.chars().rev();
    if rev.next() != Some(quote) {
        return false;
    }
    rev.take_while(|c| *c == '\\').count() % 2 == 0
}

fn strip_outer_quotes(text: &str) -> &str {
    let text = match text.chars().next() {
        Some(c) if is_quote(c) => &text[c.len_utf8()..],
        _ => text,
    };
    match text.chars().last() {
        Some(c) if is_quote(c) => &text[..text.len() - c.len_utf8()],
        _ => text,
    }
}

fn encode_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let marker = match chars.peek() {
            Some('\\') => ESCAPED_BACKSLASH,
            Some('"') => ESCAPED_DOUBLE_QUOTE,
            Some('\'') => ESCAPED_SINGLE_QUOTE,
            Some('\n') => ESCAPED_NEWLINE,
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.next();
        out.push(marker);
    }
    out
}

fn decode_control_chars(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ESCAPED_BACKSLASH => '\\',
            ESCAPED_DOUBLE_QUOTE => '"',
            ESCAPED_SINGLE_QUOTE => '\'',
            ESCAPED_NEWLINE => '\n',
            other => other,
        })
        .collect()
}

fn parse_escape_sequences(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars[i + 1] {
            't' => {
                out.push('\t');
                i += 2;
            }
            'n' => {
                out.push('\n');
                i += 2;
            }
            'u' => match hex_char(&chars[i + 2..], 4) {
                Some(c) => {
                    out.push(c);
                    i += 6;
                }
                None => {
                    out.push_str("\\u");
                    i += 2;
                }
            },
            'x' => match hex_char(&chars[i + 2..], 2) {
                Some(c) => {
                    out.push(c);
                    i += 4;
                }
                None => {
                    out.push_str("\\x");
                    i += 2;
                }
            },
            other => {
                out.push('\\');
                out.push(other);
                i += 2;
            }
        }
    }
    out
}

fn hex_char(chars: &[char], digits: usize) -> Option<char> {
    let hex = chars.get(..digits)?;
    if !hex.iter().all(char::is_ascii_hexdigit) {
        return None;
    }
    let code = u32::from_str_radix(&hex.iter().collect::<String>(), 16).ok()?;
    char::from_u32(code)
}

// ============================================================================
// Token stream
// ============================================================================

/// Cursor over a tokenized command line.
///
/// The cursor starts on the first token (the root command name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<String>,
    position: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Tokenize `line` with the default separator.
    pub fn from_line(line: &str) -> Self {
        Self::new(tokenize(line))
    }

    /// Token under the cursor.
    pub fn get(&self) -> Option<&str> {
        self.get_position(self.position)
    }

    pub fn get_position(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Move the cursor forward and return the new current token.
    pub fn advance(&mut self) -> Option<&str> {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        self.get()
    }

    pub fn in_range(&self) -> bool {
        self.position < self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The current token and everything after it.
    pub fn remaining(&self) -> &[String] {
        self.tokens.get(self.position..).unwrap_or(&[])
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_tokens() {
        assert_eq!(tokenize("kick  player1\treason"), ["kick", "player1", "reason"]);
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_double_quoted_span() {
        assert_eq!(tokenize(r#"cmd "a b" c"#), ["cmd", "a b", "c"]);
    }

    #[test]
    fn test_single_quoted_span() {
        assert_eq!(tokenize("say 'hello there' now"), ["say", "hello there", "now"]);
    }

    #[test]
    fn test_quoted_span_keeps_inner_separators() {
        assert_eq!(tokenize(r#"say "a   b""#), ["say", "a   b"]);
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        assert_eq!(tokenize(r#"cmd "a\"b""#), ["cmd", "a\"b"]);
        assert_eq!(tokenize(r#"say "a \" b" c"#), ["say", "a \" b", "c"]);
    }

    #[test]
    fn test_escaped_backslash_before_closing_quote() {
        assert_eq!(tokenize(r#"say "a \\" b"#), ["say", "a \\", "b"]);
    }

    #[test]
    fn test_mismatched_quote_keeps_growing() {
        assert_eq!(tokenize(r#"say "it's fine" ok"#), ["say", "it's fine", "ok"]);
    }

    #[test]
    fn test_quoted_single_token_is_stripped() {
        assert_eq!(tokenize(r#"say "hi""#), ["say", "hi"]);
        assert_eq!(tokenize(r#"say """#), ["say", ""]);
    }

    #[test]
    fn test_lone_quote_is_empty_token() {
        assert_eq!(tokenize(r#"a " b"#), ["a", "", "b"]);
        assert_eq!(tokenize(r#"say " padded ""#), ["say", "", "padded", ""]);
        assert_eq!(tokenize("'"), [""]);
    }

    #[test]
    fn test_lone_quote_closes_open_span() {
        assert_eq!(tokenize(r#"say "a " b"#), ["say", "a ", "b"]);
    }

    #[test]
    fn test_unterminated_quote_is_flushed() {
        assert_eq!(tokenize(r#"say "hello world"#), ["say", "\"hello world"]);
        assert_eq!(tokenize(r#"say 'it\tis"#), ["say", "'it\tis"]);
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(tokenize(r"a\tb"), ["a\tb"]);
        assert_eq!(tokenize(r"a\nb"), ["a\nb"]);
        assert_eq!(tokenize(r"A\x42"), ["AB"]);
        assert_eq!(tokenize(r"\q"), ["\\q"]);
        assert_eq!(tokenize(r"\uZZZZ"), ["\\uZZZZ"]);
        assert_eq!(tokenize(r"it\'s"), ["it's"]);
    }

    #[test]
    fn test_escaped_newline_does_not_split() {
        assert_eq!(tokenize("a\\\nb c"), ["a\nb", "c"]);
    }

    #[test]
    fn test_limit_below_threshold() {
        assert_eq!(
            split_string("a b", Separator::Whitespace, Some(2)),
            ["a", "b"]
        );
    }

    #[test]
    fn test_limit_at_threshold() {
        assert_eq!(
            split_string("a b c", Separator::Whitespace, Some(2)),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_limit_past_threshold() {
        assert_eq!(
            split_string("a b c d", Separator::Whitespace, Some(2)),
            ["a", "b", "c d"]
        );
        assert_eq!(
            split_string("a b c d  e", Separator::Whitespace, Some(2)),
            ["a", "b", "c d  e"]
        );
    }

    #[test]
    fn test_limit_zero_keeps_one_token() {
        assert_eq!(
            split_string("ban x \"for spam\"", Separator::Whitespace, Some(0)),
            ["ban x for spam"]
        );
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            split_string("a,b,,'c,d'", Separator::Char(','), None),
            ["a", "b", "c,d"]
        );
    }

    #[test]
    fn test_token_stream_cursor() {
        let mut stream = TokenStream::from_line("give sword 3");
        assert_eq!(stream.get(), Some("give"));
        assert_eq!(stream.advance(), Some("sword"));
        assert_eq!(stream.remaining(), ["sword", "3"]);
        assert_eq!(stream.advance(), Some("3"));
        assert_eq!(stream.advance(), None);
        assert!(!stream.in_range());
        assert!(stream.remaining().is_empty());
        assert_eq!(stream.advance(), None);
        assert_eq!(stream.get_position(0), Some("give"));
    }
}
