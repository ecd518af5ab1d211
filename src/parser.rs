use crate::ast::PathSegment;
use crate::error::CodecError;

/// Parser state: tracks position in the field name.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

/// Parse a flat field name such as `foo.bar[0].name` into path segments.
///
/// The first segment is always a key. Malformed names (unterminated or
/// non-numeric brackets, empty keys, a key glued to a closing bracket)
/// are rejected rather than guessed at.
pub fn parse_path(input: &str) -> Result<Vec<PathSegment>, CodecError> {
    let mut parser = Parser { input, pos: 0 };

    if input.is_empty() {
        return Err(parser.error("Field name is empty"));
    }
    if parser.peek_char() == Some('[') {
        return Err(parser.error("Field name must start with a key"));
    }

    let mut segments = vec![PathSegment::Key(parser.parse_key()?)];

    while let Some(ch) = parser.peek_char() {
        match ch {
            '.' => {
                parser.advance(1);
                segments.push(PathSegment::Key(parser.parse_key()?));
            }
            '[' => {
                segments.push(parser.parse_index()?);
                // After `]` only `.`, `[` or the end of the name may follow
                match parser.peek_char() {
                    None | Some('.') | Some('[') => {}
                    Some(_) => return Err(parser.error("Expected '.' or '[' after ']'")),
                }
            }
            _ => return Err(parser.error(format!("Unexpected '{}'", ch))),
        }
    }

    Ok(segments)
}

/// Whether a key can appear in a field name without changing its meaning.
pub fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['.', '[', ']'])
}

impl<'a> Parser<'a> {
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> CodecError {
        CodecError::invalid_path(self.input, message, self.pos)
    }

    /// Key characters run until the next delimiter.
    fn parse_key(&mut self) -> Result<String, CodecError> {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch == '.' || ch == '[' || ch == ']' {
                break;
            }
            self.advance(ch.len_utf8());
        }
        if self.pos == start {
            return match self.peek_char() {
                Some(']') => Err(self.error("Unexpected ']'")),
                _ => Err(self.error("Expected a key")),
            };
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// `[` digits? `]`
    fn parse_index(&mut self) -> Result<PathSegment, CodecError> {
        let open = self.pos;
        self.eat_char('[');

        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.advance(1);
        }
        let digits = &self.input[start..self.pos];

        if !self.eat_char(']') {
            return match self.peek_char() {
                None => Err(CodecError::invalid_path(
                    self.input,
                    "Unterminated '['",
                    open,
                )),
                Some(ch) => Err(self.error(format!("Expected digit or ']', found '{}'", ch))),
            };
        }

        if digits.is_empty() {
            return Ok(PathSegment::Append);
        }
        digits
            .parse::<usize>()
            .map(PathSegment::Index)
            .map_err(|_| CodecError::invalid_path(self.input, "Array index out of range", start))
    }
}
