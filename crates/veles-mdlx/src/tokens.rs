//! Token stream for the MDL text notation.
//!
//! MDL is a brace-delimited notation with comma/whitespace/colon separators,
//! C++-style `//` line comments, and quoted strings. [`TokenReader`] is a
//! single-pass scanner over a borrowed string; [`TokenWriter`] is the
//! indentation-aware mirror that produces exactly the textual shapes the
//! reader consumes.

use crate::{Error, Result};

/// A streaming tokenizer over MDL text.
///
/// `next()` yields either a semantic token, a single `{`/`}`, a quoted
/// string's contents, or `None` at end of input. Whitespace, commas, colons,
/// and comments are never yielded.
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    text: &'a str,
    index: usize,
}

impl<'a> TokenReader<'a> {
    /// Create a tokenizer over MDL text.
    pub const fn new(text: &'a str) -> Self {
        Self { text, index: 0 }
    }

    /// Scan the next token, or `None` at end of input.
    pub fn next(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        let mut start: Option<usize> = None;

        while self.index < bytes.len() {
            let byte = bytes[self.index];

            match byte {
                // Comments run to end of line and yield nothing. A pending
                // token is terminated first.
                b'/' if start.is_none() && bytes.get(self.index + 1) == Some(&b'/') => {
                    while self.index < bytes.len() && bytes[self.index] != b'\n' {
                        self.index += 1;
                    }
                }
                // Quoted strings are returned verbatim, without the quotes.
                b'"' if start.is_none() => {
                    let open = self.index + 1;
                    let close = self.text[open..].find('"').map(|i| open + i)?;
                    self.index = close + 1;
                    return Some(&self.text[open..close]);
                }
                b' ' | b'\t' | b'\r' | b'\n' | b',' | b':' => {
                    if let Some(s) = start {
                        let token = &self.text[s..self.index];
                        self.index += 1;
                        return Some(token);
                    }
                    self.index += 1;
                }
                // Braces terminate a pending token without being consumed,
                // or stand alone as single-character tokens.
                b'{' | b'}' => {
                    if let Some(s) = start {
                        return Some(&self.text[s..self.index]);
                    }
                    self.index += 1;
                    return Some(&self.text[self.index - 1..self.index]);
                }
                _ => {
                    if start.is_none() {
                        start = Some(self.index);
                    }
                    self.index += 1;
                }
            }
        }

        start.map(|s| &self.text[s..])
    }

    /// Look at the next token without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        let mut probe = self.clone();
        probe.next()
    }

    /// Read a token, failing with the enclosing record's name at end of input.
    pub fn word(&mut self, record: &'static str) -> Result<&'a str> {
        self.next().ok_or(Error::UnexpectedEnd { record })
    }

    /// Read a token and require it to equal `expected`.
    pub fn expect(&mut self, expected: &str, record: &'static str) -> Result<()> {
        let token = self.word(record)?;
        if token != expected {
            return Err(Error::bad_token(token, record));
        }
        Ok(())
    }

    /// Parse the next token as an i32.
    pub fn read_i32(&mut self, record: &'static str) -> Result<i32> {
        let token = self.word(record)?;
        token.parse().map_err(|_| Error::bad_token(token, record))
    }

    /// Parse the next token as a u32.
    pub fn read_u32(&mut self, record: &'static str) -> Result<u32> {
        let token = self.word(record)?;
        token.parse().map_err(|_| Error::bad_token(token, record))
    }

    /// Parse the next token as an f32.
    pub fn read_f32(&mut self, record: &'static str) -> Result<f32> {
        let token = self.word(record)?;
        token.parse().map_err(|_| Error::bad_token(token, record))
    }

    /// Consume a `{ v0, v1, ... }` block, filling every slot of `out`.
    pub fn read_f32_block(&mut self, out: &mut [f32], record: &'static str) -> Result<()> {
        self.expect("{", record)?;
        for slot in out.iter_mut() {
            *slot = self.read_f32(record)?;
        }
        self.expect("}", record)
    }

    /// Consume a `{ v0, v1, ... }` block of u32 values.
    pub fn read_u32_block(&mut self, out: &mut [u32], record: &'static str) -> Result<()> {
        self.expect("{", record)?;
        for slot in out.iter_mut() {
            *slot = self.read_u32(record)?;
        }
        self.expect("}", record)
    }

    /// Consume a 3-float color block, swizzling file order R,G,B into
    /// storage order B,G,R. The swizzle is a format quirk of MDL colors and
    /// is reversed by [`TokenWriter::color`], so round trips are identity.
    pub fn read_color(&mut self, out: &mut [f32; 3], record: &'static str) -> Result<()> {
        self.expect("{", record)?;
        out[2] = self.read_f32(record)?;
        out[1] = self.read_f32(record)?;
        out[0] = self.read_f32(record)?;
        self.expect("}", record)
    }

    /// Consume a block of `count` inner blocks of `size` floats each,
    /// filling `out` in row-major order.
    pub fn read_vector_block(
        &mut self,
        out: &mut Vec<f32>,
        count: usize,
        size: usize,
        record: &'static str,
    ) -> Result<()> {
        self.expect("{", record)?;
        out.reserve(count * size);
        for _ in 0..count {
            self.expect("{", record)?;
            for _ in 0..size {
                out.push(self.read_f32(record)?);
            }
            self.expect("}", record)?;
        }
        self.expect("}", record)
    }

    /// Consume a flat block of `count` integer scalars.
    pub fn read_scalar_block_u32(
        &mut self,
        out: &mut Vec<u32>,
        count: usize,
        record: &'static str,
    ) -> Result<()> {
        self.expect("{", record)?;
        out.reserve(count);
        for _ in 0..count {
            out.push(self.read_u32(record)?);
        }
        self.expect("}", record)
    }

    /// Enter a block: consume the opening `{`.
    pub fn enter_block(&mut self, record: &'static str) -> Result<()> {
        self.expect("{", record)
    }

    /// Yield the next key token inside a block, or `None` at the closing
    /// brace (which is consumed). The stream position is the sole iteration
    /// state: callers must consume each key's values before asking for the
    /// next key.
    pub fn block_key(&mut self, record: &'static str) -> Result<Option<&'a str>> {
        let token = self.word(record)?;
        if token == "}" {
            Ok(None)
        } else {
            Ok(Some(token))
        }
    }
}

/// Indentation-aware writer producing MDL text.
#[derive(Debug, Default)]
pub struct TokenWriter {
    buffer: String,
    depth: usize,
}

impl TokenWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer, returning the accumulated text.
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Write one indented line.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buffer.push('\t');
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    /// Open a `Name {` block and indent.
    pub fn start_block(&mut self, name: &str) {
        self.line(&format!("{} {{", name));
        self.depth += 1;
    }

    /// Open a block with an arbitrary header (e.g. `Faces 1 9 {`).
    pub fn start_raw_block(&mut self, header: &str) {
        self.line(&format!("{} {{", header));
        self.depth += 1;
    }

    /// Open a `Name count {` block and indent.
    pub fn start_counted_block(&mut self, name: &str, count: usize) {
        self.line(&format!("{} {} {{", name, count));
        self.depth += 1;
    }

    /// Open a `Kind "name" {` block and indent.
    pub fn start_named_block(&mut self, kind: &str, name: &str) {
        self.line(&format!("{} \"{}\" {{", kind, name));
        self.depth += 1;
    }

    /// Close the current block: dedent and write `}`.
    pub fn end_block(&mut self) {
        self.depth -= 1;
        self.line("}");
    }

    /// Write `Name value,`.
    pub fn attrib(&mut self, name: &str, value: impl std::fmt::Display) {
        self.line(&format!("{} {},", name, value));
    }

    /// Write `Name "value",`.
    pub fn quoted(&mut self, name: &str, value: &str) {
        self.line(&format!("{} \"{}\",", name, value));
    }

    /// Write a bare `Name,` flag line.
    pub fn flag(&mut self, name: &str) {
        self.line(&format!("{},", name));
    }

    /// Write `Name { v0, v1, ... },` for floats.
    pub fn float_block(&mut self, name: &str, values: &[f32]) {
        self.line(&format!("{} {{ {} }},", name, join_floats(values)));
    }

    /// Write `Name { v0, v1, ... },` for integers.
    pub fn u32_block(&mut self, name: &str, values: &[u32]) {
        let joined = values
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&format!("{} {{ {} }},", name, joined));
    }

    /// Write a color attribute, reversing the storage swizzle back to the
    /// file's R,G,B order.
    pub fn color(&mut self, name: &str, value: &[f32; 3]) {
        self.float_block(name, &[value[2], value[1], value[0]]);
    }

    /// Write `{ v0, v1, ... },` as its own line (vector array element).
    pub fn vector(&mut self, values: &[f32]) {
        self.line(&format!("{{ {} }},", join_floats(values)));
    }
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_boundaries() {
        let mut stream = TokenReader::new("Header \"A String\" {\n\tName Value, // A Comment\n}");

        assert_eq!(stream.next(), Some("Header"));
        assert_eq!(stream.next(), Some("A String"));
        assert_eq!(stream.next(), Some("{"));
        assert_eq!(stream.next(), Some("Name"));
        assert_eq!(stream.next(), Some("Value"));
        assert_eq!(stream.next(), Some("}"));
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_colon_separates() {
        let mut stream = TokenReader::new("0: { 1, 2, 3 },");
        assert_eq!(stream.next(), Some("0"));
        assert_eq!(stream.next(), Some("{"));
        assert_eq!(stream.next(), Some("1"));
    }

    #[test]
    fn test_brace_terminates_pending_token() {
        let mut stream = TokenReader::new("Sequences{");
        assert_eq!(stream.next(), Some("Sequences"));
        assert_eq!(stream.next(), Some("{"));
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut stream = TokenReader::new("Version { FormatVersion 800 }");
        assert_eq!(stream.peek(), Some("Version"));
        assert_eq!(stream.next(), Some("Version"));
    }

    #[test]
    fn test_color_swizzle_symmetry() {
        let mut writer = TokenWriter::new();
        let stored = [0.25f32, 0.5, 0.75];
        writer.color("Color", &stored);
        let text = writer.finish();
        // File order is R,G,B; storage index 2 holds R.
        assert_eq!(text, "Color { 0.75, 0.5, 0.25 },\n");

        let mut stream = TokenReader::new(&text);
        assert_eq!(stream.next(), Some("Color"));
        let mut roundtrip = [0.0f32; 3];
        stream.read_color(&mut roundtrip, "test").unwrap();
        assert_eq!(roundtrip, stored);
    }

    #[test]
    fn test_bad_token_names_record() {
        let mut stream = TokenReader::new("NotANumber");
        let err = stream.read_f32("Sequence").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("NotANumber"));
        assert!(message.contains("Sequence"));
    }

    #[test]
    fn test_writer_indentation() {
        let mut writer = TokenWriter::new();
        writer.start_counted_block("Sequences", 1);
        writer.start_named_block("Anim", "Stand");
        writer.u32_block("Interval", &[0, 1000]);
        writer.end_block();
        writer.end_block();

        assert_eq!(
            writer.finish(),
            "Sequences 1 {\n\tAnim \"Stand\" {\n\t\tInterval { 0, 1000 },\n\t}\n}\n"
        );
    }
}
