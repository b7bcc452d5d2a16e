use alloc::vec::Vec;

use memchr::memchr;

/// The row terminator written after every row.
///
/// Regardless of the delimiter and quote in use, rows are always terminated
/// by `\r\n`.
pub const TERMINATOR: &[u8] = b"\r\n";

/// A builder for configuring a CSV writer.
#[derive(Debug)]
pub struct WriterBuilder {
    wtr: Writer,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder { wtr: Writer::default() }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration.
    pub fn build(&self) -> Writer {
        let mut wtr = self.wtr.clone();
        wtr.build_requires_quotes();
        wtr
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.wtr.delimiter = delimiter;
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default value is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.wtr.quote = quote;
        self
    }
}

/// The quoting rules for writing CSV fields.
///
/// A field is quoted if and only if it contains the quote character, the
/// delimiter, `\r` or `\n`. Inside a quoted field, every quote character is
/// doubled. Empty fields are written without quotes.
///
/// This type holds no I/O state of its own; it only knows how to turn the
/// bytes of one field into their escaped form.
#[derive(Clone, Debug)]
pub struct Writer {
    delimiter: u8,
    quote: u8,
    /// A table indexed by byte that says whether that byte forces quoting.
    requires_quotes: [bool; 256],
}

impl Default for Writer {
    fn default() -> Writer {
        let mut wtr = Writer {
            delimiter: b',',
            quote: b'"',
            requires_quotes: [false; 256],
        };
        wtr.build_requires_quotes();
        wtr
    }
}

impl Writer {
    /// Creates a new CSV writer with the default configuration.
    pub fn new() -> Writer {
        Writer::default()
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Set the field delimiter.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
        self.build_requires_quotes();
    }

    /// The quote character.
    pub fn quote(&self) -> u8 {
        self.quote
    }

    /// Set the quote character.
    pub fn set_quote(&mut self, quote: u8) {
        self.quote = quote;
        self.build_requires_quotes();
    }

    /// Returns true if `field` must be quoted to survive a round trip.
    pub fn needs_quotes(&self, field: &[u8]) -> bool {
        field.iter().any(|&b| self.requires_quotes[b as usize])
    }

    /// Append the escaped form of `field` to `out`.
    ///
    /// No delimiter is written; the caller decides where fields go.
    pub fn field(&self, field: &[u8], out: &mut Vec<u8>) {
        if !self.needs_quotes(field) {
            out.extend_from_slice(field);
            return;
        }
        out.reserve(field.len() + 2);
        out.push(self.quote);
        let mut rest = field;
        while let Some(i) = memchr(self.quote, rest) {
            out.extend_from_slice(&rest[..i + 1]);
            out.push(self.quote);
            rest = &rest[i + 1..];
        }
        out.extend_from_slice(rest);
        out.push(self.quote);
    }

    fn build_requires_quotes(&mut self) {
        self.requires_quotes = [false; 256];
        self.requires_quotes[self.delimiter as usize] = true;
        self.requires_quotes[self.quote as usize] = true;
        self.requires_quotes[b'\r' as usize] = true;
        self.requires_quotes[b'\n' as usize] = true;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{Writer, WriterBuilder};

    fn b(s: &str) -> &[u8] {
        s.as_bytes()
    }

    fn escaped(wtr: &Writer, field: &str) -> Vec<u8> {
        let mut out = Vec::new();
        wtr.field(b(field), &mut out);
        out
    }

    macro_rules! assert_field {
        ($wtr:expr, $input:expr, $expected:expr) => {{
            assert_eq!(b($expected), &escaped(&$wtr, $input)[..]);
        }};
    }

    #[test]
    fn bare_fields() {
        let wtr = Writer::new();
        assert_field!(wtr, "", "");
        assert_field!(wtr, "abc", "abc");
        assert_field!(wtr, " a b ", " a b ");
        assert_field!(wtr, "a|b'c", "a|b'c");
    }

    #[test]
    fn quoted_fields() {
        let wtr = Writer::new();
        assert_field!(wtr, "a,b", "\"a,b\"");
        assert_field!(wtr, "a\rb", "\"a\rb\"");
        assert_field!(wtr, "a\nb", "\"a\nb\"");
        assert_field!(wtr, "\r\n", "\"\r\n\"");
    }

    #[test]
    fn doubled_quotes() {
        let wtr = Writer::new();
        assert_field!(wtr, "\"", "\"\"\"\"");
        assert_field!(wtr, "\"1\"", "\"\"\"1\"\"\"");
        assert_field!(wtr, ",1\r\n\"", "\",1\r\n\"\"\"");
        assert_field!(wtr, "a\"\"b", "\"a\"\"\"\"b\"");
    }

    #[test]
    fn custom_delimiter_and_quote() {
        let wtr = WriterBuilder::new().delimiter(b'|').quote(b'\'').build();
        assert_field!(wtr, "a,b\"c", "a,b\"c");
        assert_field!(wtr, "a|b", "'a|b'");
        assert_field!(wtr, "it's", "'it''s'");
        assert!(!wtr.needs_quotes(b("a,b")));
        assert!(wtr.needs_quotes(b("a|b")));
    }

    #[test]
    fn setters_rebuild_table() {
        let mut wtr = Writer::new();
        assert!(wtr.needs_quotes(b("a,b")));
        wtr.set_delimiter(b'\t');
        assert!(!wtr.needs_quotes(b("a,b")));
        assert!(wtr.needs_quotes(b("a\tb")));
        wtr.set_quote(b'\'');
        assert!(!wtr.needs_quotes(b("\"")));
        assert!(wtr.needs_quotes(b("'")));
        assert_eq!(b'\t', wtr.delimiter());
        assert_eq!(b'\'', wtr.quote());
    }
}
