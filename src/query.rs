//! `application/x-www-form-urlencoded` reading and writing for field entries.

use crate::ast::FieldEntry;
use crate::error::CodecError;
use crate::tree::FormValue;

/// Serialize entries as `name=value&name=value`, percent-encoding both sides.
///
/// Spaces become `+`. Booleans are written as `true`/`false` and `Null` as an
/// empty value; container values have no urlencoded form and are skipped.
pub fn to_query_string(entries: &[FieldEntry]) -> String {
    let mut buf = String::new();
    for entry in entries {
        let value = match entry.value.to_field_text() {
            Some(text) => text,
            None => {
                log::debug!("skipping non-scalar value for {}", entry.name);
                continue;
            }
        };
        if !buf.is_empty() {
            buf.push('&');
        }
        write_component(&mut buf, &entry.name);
        buf.push('=');
        write_component(&mut buf, &value);
    }
    buf
}

/// Parse a urlencoded query into entries, in order. A leading `?` is ignored;
/// a pair without `=` gets an empty value.
pub fn parse_query_string(input: &str) -> Result<Vec<FieldEntry>, CodecError> {
    let input = input.trim();
    let input = input.strip_prefix('?').unwrap_or(input);

    let mut entries = Vec::new();
    for pair in input.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        entries.push(FieldEntry {
            name: decode_component(name)?,
            value: FormValue::String(decode_component(value)?),
        });
    }
    Ok(entries)
}

/// Characters left untouched by `encodeURIComponent`.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

fn write_component(buf: &mut String, s: &str) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in s.as_bytes() {
        if b == b' ' {
            buf.push('+');
        } else if is_unreserved(b) {
            buf.push(b as char);
        } else {
            buf.push('%');
            buf.push(HEX[(b >> 4) as usize] as char);
            buf.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
}

fn decode_component(s: &str) -> Result<String, CodecError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
                let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                    _ => {
                        return Err(CodecError::InvalidQuery(format!(
                            "Malformed escape at position {} in \"{}\"",
                            i, s
                        )))
                    }
                }
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out)
        .map_err(|_| CodecError::InvalidQuery(format!("\"{}\" does not decode to UTF-8", s)))
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
