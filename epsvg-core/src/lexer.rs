//! Tokenizer and the lazy object reader.
//!
//! [`Lexer`] turns source bytes into tokens; [`ObjectReader`] assembles
//! tokens into whole objects, collecting `{ ... }` into executable
//! arrays and `[ ... ]` into literal arrays. The reader is pull-based
//! and restartable: callers take one object at a time, and anything not
//! yet pulled remains available, so execution can interleave with
//! parsing.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{ArrayObj, Object, StringObj};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i32),
    Real(f64),
    /// `/name`
    LiteralName(String),
    /// A bare regular-character run.
    ExecutableName(String),
    /// `(..)` or `<..>` string contents.
    Str(Vec<u8>),
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    /// `<<`
    DictOpen,
    /// `>>`
    DictClose,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// Byte-oriented tokenizer for PostScript source text.
#[derive(Debug)]
pub struct Lexer {
    bytes: Vec<u8>,
    pos: usize,
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

impl Lexer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            bytes: source.bytes().collect(),
            pos: 0,
        }
    }

    /// Current byte offset (start of the next unread token).
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_blanks(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.bump() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Produce the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> PsResult<Option<Token>> {
        self.skip_blanks();
        let Some(b) = self.bump() else {
            return Ok(None);
        };
        match b {
            b'[' => Ok(Some(Token::LBracket)),
            b']' => Ok(Some(Token::RBracket)),
            b'{' => Ok(Some(Token::LBrace)),
            b'}' => Ok(Some(Token::RBrace)),
            b'(' => Ok(Some(Token::Str(self.scan_string()?))),
            b')' => Err(lex_error("unmatched )")),
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    Ok(Some(Token::DictOpen))
                } else {
                    Ok(Some(Token::Str(self.scan_hex_string()?)))
                }
            }
            b'>' => {
                if self.bump() == Some(b'>') {
                    Ok(Some(Token::DictClose))
                } else {
                    Err(lex_error("unmatched >"))
                }
            }
            b'/' => {
                // `//name` (immediate evaluation) reads as a plain
                // literal name here.
                if self.peek() == Some(b'/') {
                    self.pos += 1;
                }
                Ok(Some(Token::LiteralName(self.scan_regular_run())))
            }
            _ => {
                self.pos -= 1;
                let text = self.scan_regular_run();
                Ok(Some(classify_regular(&text)))
            }
        }
    }

    fn scan_regular_run(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        self.bytes[start..self.pos]
            .iter()
            .map(|&b| char::from(b))
            .collect()
    }

    /// Scan a `(..)` string body; the opening paren is already consumed.
    fn scan_string(&mut self) -> PsResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(b) = self.bump() else {
                return Err(lex_error("unterminated string"));
            };
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => {
                    let Some(escaped) = self.bump() else {
                        return Err(lex_error("unterminated string escape"));
                    };
                    match escaped {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(8),
                        b'f' => out.push(12),
                        b'\n' => {}
                        b'\r' => {
                            // \<CRLF> is a single line continuation
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            #[allow(clippy::cast_possible_truncation)]
                            out.push(value as u8);
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    /// Scan a `<..>` hex string body; the `<` is already consumed.
    fn scan_hex_string(&mut self) -> PsResult<Vec<u8>> {
        let mut nibbles = Vec::new();
        loop {
            let Some(b) = self.bump() else {
                return Err(lex_error("unterminated hex string"));
            };
            match b {
                b'>' => break,
                _ if is_whitespace(b) => {}
                b'0'..=b'9' => nibbles.push(b - b'0'),
                b'a'..=b'f' => nibbles.push(b - b'a' + 10),
                b'A'..=b'F' => nibbles.push(b - b'A' + 10),
                other => {
                    return Err(lex_error(format!(
                        "invalid hex digit {:?}",
                        char::from(other)
                    )))
                }
            }
        }
        // An odd final digit is padded with zero
        if nibbles.len() % 2 == 1 {
            nibbles.push(0);
        }
        Ok(nibbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect())
    }
}

fn lex_error(message: impl Into<String>) -> PsError {
    PsError::new(ErrorKind::IoError, message)
}

/// Classify a regular-character run as a number or an executable name.
fn classify_regular(text: &str) -> Token {
    if looks_numeric(text) {
        if let Ok(i) = text.parse::<i32>() {
            return Token::Integer(i);
        }
        if let Ok(r) = text.parse::<f64>() {
            return Token::Real(r);
        }
    }
    if let Some(value) = parse_radix(text) {
        return Token::Integer(value);
    }
    Token::ExecutableName(text.to_string())
}

/// Whether a token is shaped like a decimal number. This keeps `f64`'s
/// parser from accepting things PostScript treats as names (`inf`,
/// `NaN`).
fn looks_numeric(text: &str) -> bool {
    !text.is_empty()
        && text.starts_with(|c: char| c.is_ascii_digit() || c == '+' || c == '-' || c == '.')
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Parse a `base#digits` radix numeral.
fn parse_radix(text: &str) -> Option<i32> {
    let (base_text, digits) = text.split_once('#')?;
    let base: u32 = base_text.parse().ok()?;
    if !(2..=36).contains(&base) || digits.is_empty() {
        return None;
    }
    // Wraps like PostScript: 16#ffffffff is -1
    #[allow(clippy::cast_possible_wrap)]
    u32::from_str_radix(digits, base).ok().map(|v| v as i32)
}

// ---------------------------------------------------------------------------
// Object reader
// ---------------------------------------------------------------------------

/// Assembles tokens into whole objects, one pull at a time.
#[derive(Debug)]
pub struct ObjectReader {
    lexer: Lexer,
}

impl ObjectReader {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Byte offset of the next unread token.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.lexer.pos()
    }

    /// Pull the next whole object, or `None` at end of input.
    pub fn next_object(&mut self) -> PsResult<Option<Object>> {
        let Some(token) = self.lexer.next_token()? else {
            return Ok(None);
        };
        Ok(Some(self.object_from(token)?))
    }

    fn object_from(&mut self, token: Token) -> PsResult<Object> {
        match token {
            Token::Integer(i) => Ok(Object::integer(i)),
            Token::Real(r) => Ok(Object::real(r)),
            Token::LiteralName(n) => Ok(Object::literal_name(n)),
            Token::ExecutableName(n) => Ok(Object::executable_name(n)),
            Token::Str(bytes) => Ok(Object::string(StringObj::from_bytes(bytes))),
            Token::LBrace => {
                let items = self.collect_until(&Token::RBrace)?;
                Ok(Object::procedure(ArrayObj::from_objects(items)))
            }
            Token::LBracket => {
                let items = self.collect_until(&Token::RBracket)?;
                Ok(Object::array(ArrayObj::from_objects(items)))
            }
            Token::RBrace | Token::RBracket => Err(PsError::new(
                ErrorKind::UnmatchedMark,
                "unexpected closing delimiter",
            )),
            // Dict delimiters resolve through systemdict at run time
            Token::DictOpen => Ok(Object::executable_name("<<")),
            Token::DictClose => Ok(Object::executable_name(">>")),
        }
    }

    fn collect_until(&mut self, closing: &Token) -> PsResult<Vec<Object>> {
        let mut items = Vec::new();
        loop {
            let Some(token) = self.lexer.next_token()? else {
                return Err(PsError::new(
                    ErrorKind::IoError,
                    "unterminated procedure or array",
                ));
            };
            if token == *closing {
                return Ok(items);
            }
            items.push(self.object_from(token)?);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Value;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some(token) = lexer.next_token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("42 -17 +3 3.14 -.5 1e3 2147483648"),
            vec![
                Token::Integer(42),
                Token::Integer(-17),
                Token::Integer(3),
                Token::Real(3.14),
                Token::Real(-0.5),
                Token::Real(1000.0),
                // Too big for an integer: falls over to real
                Token::Real(2_147_483_648.0),
            ]
        );
    }

    #[test]
    fn radix_numbers() {
        assert_eq!(tokens("16#ff 2#1010"), vec![
            Token::Integer(255),
            Token::Integer(10)
        ]);
        assert_eq!(tokens("16#FFFFFFFF"), vec![Token::Integer(-1)]);
        // Invalid radix forms are names
        assert_eq!(
            tokens("1#0 37#z"),
            vec![
                Token::ExecutableName("1#0".into()),
                Token::ExecutableName("37#z".into())
            ]
        );
    }

    #[test]
    fn numeric_lookalikes_are_names() {
        assert_eq!(
            tokens("inf NaN - 3.1.4"),
            vec![
                Token::ExecutableName("inf".into()),
                Token::ExecutableName("NaN".into()),
                Token::ExecutableName("-".into()),
                Token::ExecutableName("3.1.4".into()),
            ]
        );
    }

    #[test]
    fn names_and_delimiters() {
        assert_eq!(
            tokens("/foo bar/baz[qux]"),
            vec![
                Token::LiteralName("foo".into()),
                Token::ExecutableName("bar".into()),
                Token::LiteralName("baz".into()),
                Token::LBracket,
                Token::ExecutableName("qux".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn immediate_name_reads_as_literal() {
        assert_eq!(tokens("//foo"), vec![Token::LiteralName("foo".into())]);
    }

    #[test]
    fn comments_skipped() {
        assert_eq!(
            tokens("1 % a comment\n2"),
            vec![Token::Integer(1), Token::Integer(2)]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            tokens(r"(a\n\t\\\(\)b)"),
            vec![Token::Str(b"a\n\t\\()b".to_vec())]
        );
        assert_eq!(tokens(r"(\101\12)"), vec![Token::Str(b"A\n".to_vec())]);
    }

    #[test]
    fn string_nested_parens() {
        assert_eq!(
            tokens("(a(b)c)"),
            vec![Token::Str(b"a(b)c".to_vec())]
        );
    }

    #[test]
    fn string_line_continuation() {
        assert_eq!(tokens("(a\\\nb)"), vec![Token::Str(b"ab".to_vec())]);
    }

    #[test]
    fn unterminated_string_is_io_error() {
        let mut lexer = Lexer::new("(abc");
        assert_eq!(
            lexer.next_token().unwrap_err().kind,
            ErrorKind::IoError
        );
    }

    #[test]
    fn hex_strings() {
        assert_eq!(
            tokens("<48 65 6C6C 6F>"),
            vec![Token::Str(b"Hello".to_vec())]
        );
        // Odd digit count pads with zero
        assert_eq!(tokens("<901fa>"), vec![Token::Str(vec![0x90, 0x1f, 0xa0])]);
    }

    #[test]
    fn dict_delimiters() {
        assert_eq!(
            tokens("<< /a 1 >>"),
            vec![
                Token::DictOpen,
                Token::LiteralName("a".into()),
                Token::Integer(1),
                Token::DictClose,
            ]
        );
    }

    #[test]
    fn reader_builds_procedures() {
        let mut reader = ObjectReader::new("{1 2 add}");
        let obj = reader.next_object().unwrap().unwrap();
        assert!(!obj.literal);
        let proc = obj.to_proc().unwrap();
        assert_eq!(proc.len(), 3);
        assert_eq!(proc.get(0).unwrap().to_int().unwrap(), 1);
        assert!(matches!(proc.get(2).unwrap().value, Value::Name(ref n) if n == "add"));
    }

    #[test]
    fn reader_builds_nested_procedures() {
        let mut reader = ObjectReader::new("{1 {2} ifelse}");
        let proc = reader.next_object().unwrap().unwrap().to_proc().unwrap();
        assert_eq!(proc.len(), 3);
        let inner = proc.get(1).unwrap();
        assert!(inner.to_proc().is_ok());
    }

    #[test]
    fn reader_builds_literal_arrays() {
        let mut reader = ObjectReader::new("[1 (two) /three]");
        let obj = reader.next_object().unwrap().unwrap();
        assert!(obj.literal);
        let array = obj.to_array().unwrap();
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn reader_is_restartable() {
        let mut reader = ObjectReader::new("1 2 3");
        assert_eq!(
            reader.next_object().unwrap().unwrap().to_int().unwrap(),
            1
        );
        // Remaining input is still there for later pulls
        assert_eq!(
            reader.next_object().unwrap().unwrap().to_int().unwrap(),
            2
        );
        assert_eq!(
            reader.next_object().unwrap().unwrap().to_int().unwrap(),
            3
        );
        assert!(reader.next_object().unwrap().is_none());
    }

    #[test]
    fn stray_closers_are_unmatched() {
        let mut reader = ObjectReader::new("}");
        assert_eq!(
            reader.next_object().unwrap_err().kind,
            ErrorKind::UnmatchedMark
        );
        let mut reader = ObjectReader::new("]");
        assert_eq!(
            reader.next_object().unwrap_err().kind,
            ErrorKind::UnmatchedMark
        );
    }

    #[test]
    fn unterminated_procedure_is_io_error() {
        let mut reader = ObjectReader::new("{1 2");
        assert_eq!(
            reader.next_object().unwrap_err().kind,
            ErrorKind::IoError
        );
    }
}
