//! Key lookup over raw JSON job documents.
//!
//! The lookup never decodes or copies anything: it hands back a slice of the
//! original document. String values come back without their quotes and with
//! escape sequences untouched, containers come back with their brackets, and
//! scalars come back as their literal text.

/// Finds the value of a named member in a JSON document.
pub trait JsonLookup {
    /// Returns the raw bytes of the first value named `key`, or `None`.
    fn value_of<'d>(&self, document: &'d [u8], key: &str) -> Option<&'d [u8]>;
}

/// Scans the members of the top-level object in document order.
///
/// Only direct members of the outermost object are candidates. A key that
/// appears more than once resolves to its first occurrence, and keys inside
/// nested objects are never matched; callers reach nested values by looking
/// up the container first and then searching the returned slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberScanner;

impl JsonLookup for MemberScanner {
    fn value_of<'d>(&self, document: &'d [u8], key: &str) -> Option<&'d [u8]> {
        let mut cursor = Cursor::new(document);
        cursor.skip_ws();
        cursor.expect(b'{')?;

        loop {
            cursor.skip_ws();
            match cursor.peek()? {
                b'}' => return None,
                b'"' => {}
                _ => return None,
            }
            let name = cursor.string()?;
            cursor.skip_ws();
            cursor.expect(b':')?;
            cursor.skip_ws();
            let value = cursor.value()?;

            if name == key.as_bytes() {
                return Some(value);
            }

            cursor.skip_ws();
            match cursor.next()? {
                b',' => continue,
                _ => return None,
            }
        }
    }
}

struct Cursor<'d> {
    bytes: &'d [u8],
    pos: usize,
}

impl<'d> Cursor<'d> {
    fn new(bytes: &'d [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        (self.next()? == byte).then_some(())
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    /// Consumes a quoted string and returns its raw contents.
    fn string(&mut self) -> Option<&'d [u8]> {
        self.expect(b'"')?;
        let start = self.pos;
        loop {
            match self.next()? {
                b'\\' => {
                    self.next()?;
                }
                b'"' => return Some(&self.bytes[start..self.pos - 1]),
                _ => {}
            }
        }
    }

    fn value(&mut self) -> Option<&'d [u8]> {
        match self.peek()? {
            b'"' => self.string(),
            b'{' | b'[' => self.container(),
            _ => self.literal(),
        }
    }

    /// Consumes a balanced object or array, brackets included.
    fn container(&mut self) -> Option<&'d [u8]> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                b'"' => {
                    self.string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Some(&self.bytes[start..self.pos]);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Consumes a number, `true`, `false` or `null`.
    fn literal(&mut self) -> Option<&'d [u8]> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if matches!(byte, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(&self.bytes[start..self.pos])
    }
}
