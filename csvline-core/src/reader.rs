use alloc::vec::Vec;
use core::fmt;

use log::{debug, trace};

/// The parser's current position in the character dispatch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Discarding `\r` and `\n` between rows. This is the initial state, so
    /// leading blank lines are skipped as well.
    ConsumeNewlines,
    /// Accumulating the bytes of a field.
    Read,
    /// A quote was seen inside a quoted field. The next byte decides whether
    /// it was an escaped quote or the end of the field.
    QuoteCheck,
    /// All input has been consumed. Terminal.
    Eof,
}

/// A push based CSV field parser.
///
/// This parser is a small finite state machine. Callers hand it input one
/// byte at a time with [`advance`](Reader::advance), or a slice at a time
/// with [`read_field`](Reader::read_field), and it appends the unescaped
/// contents of the current field to a caller provided buffer.
///
/// # Format
///
/// * Fields are separated by a single byte delimiter (`b','` by default).
/// * A field may be wrapped in a single byte quote (`b'"'` by default), in
///   which case delimiters and line terminators inside of it are data and a
///   literal quote is written as two quotes.
/// * Rows end at `\r\n`, `\r` or `\n`. Runs of line terminators between rows
///   are collapsed, so blank rows never produce fields.
/// * The last row does not need a line terminator.
///
/// # Position
///
/// The parser counts lines from `1` and columns from `0`. Every consumed byte
/// advances the column by one, except `\n`, which advances the line and
/// resets the column to `0`. Errors report the position of the byte that
/// caused them.
#[derive(Clone, Debug)]
pub struct Reader {
    /// The current state.
    state: State,
    /// Whether the current field started with a quote.
    quoted: bool,
    /// The number of bytes written to the current field.
    field_len: usize,
    /// The delimiter that separates fields.
    delimiter: u8,
    /// The quotation byte.
    quote: u8,
    /// Whether to recover from malformed quoting instead of failing.
    lenient: bool,
    /// The current line number.
    line: u64,
    /// The current column number.
    col: u64,
}

impl Default for Reader {
    fn default() -> Reader {
        Reader {
            state: State::ConsumeNewlines,
            quoted: false,
            field_len: 0,
            delimiter: b',',
            quote: b'"',
            lenient: false,
            line: 1,
            col: 0,
        }
    }
}

/// Builds a CSV field parser with various configuration knobs.
///
/// Unlike the parser itself, nothing here ever fails. Every option can also
/// be changed later on the built `Reader`.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    rdr: Reader,
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV parser from this configuration.
    pub fn build(&self) -> Reader {
        self.rdr.clone()
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.rdr.delimiter = delimiter;
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.rdr.quote = quote;
        self
    }

    /// Whether to recover from malformed quoting.
    ///
    /// When disabled (the default), malformed quoting is reported as a
    /// `ParseError`. When enabled, the offending quote is kept as data.
    pub fn lenient(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.rdr.lenient = yes;
        self
    }
}

/// The result of feeding input to the parser.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadFieldResult {
    /// The input given was consumed without completing a field.
    InputEmpty,
    /// The end of a field was found.
    ///
    /// Note that when `record_end` is true, then the end of this field also
    /// corresponds to the end of a row.
    Field {
        /// Whether this was the last field in a row or not.
        record_end: bool,
    },
    /// All CSV data has been read.
    ///
    /// This is only returned after the caller signalled the end of input.
    /// Every later call returns it again.
    End,
}

/// The kind of malformed quoting found by the parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A quote closed a quoted field but was followed by something other
    /// than a quote, a delimiter or a line terminator.
    UnescapedQuote,
    /// A quote appeared in a field that did not start with a quote.
    QuoteInUnquotedField,
    /// The input ended inside a quoted field.
    UnterminatedQuotedField,
}

impl ParseErrorKind {
    fn description(&self) -> &'static str {
        match *self {
            ParseErrorKind::UnescapedQuote => "unescaped quote",
            ParseErrorKind::QuoteInUnquotedField => {
                "quote found in unquoted field"
            }
            ParseErrorKind::UnterminatedQuotedField => {
                "unterminated quoted field, reached end of input"
            }
        }
    }
}

/// A syntax error found while parsing in strict mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseError {
    kind: ParseErrorKind,
    line: u64,
    col: u64,
}

impl ParseError {
    /// Create a parse error at the given position.
    pub fn new(kind: ParseErrorKind, line: u64, col: u64) -> ParseError {
        ParseError { kind, line, col }
    }

    /// What went wrong.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// The line of the offending byte, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The column of the offending byte. Columns count the bytes read on
    /// the current line, so `0` is the start of a line, before any byte.
    pub fn col(&self) -> u64 {
        self.col
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at line: {}, col: {}",
            self.kind.description(),
            self.line,
            self.col
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

impl Reader {
    /// Create a new CSV parser with a default configuration.
    pub fn new() -> Reader {
        ReaderBuilder::new().build()
    }

    /// Reset the parser such that it behaves as if it had never been used.
    ///
    /// The delimiter, quote and lenient settings are kept.
    pub fn reset(&mut self) {
        self.state = State::ConsumeNewlines;
        self.quoted = false;
        self.field_len = 0;
        self.line = 1;
        self.col = 0;
    }

    /// Return the current line number as measured by the number of
    /// occurrences of `\n`.
    ///
    /// Line numbers start at `1` and are reset when `reset` is called.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Return the number of bytes consumed since the last `\n`.
    pub fn col(&self) -> u64 {
        self.col
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Set the field delimiter. Takes effect on the next byte.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
    }

    /// The quote character.
    pub fn quote(&self) -> u8 {
        self.quote
    }

    /// Set the quote character. Takes effect on the next byte.
    pub fn set_quote(&mut self, quote: u8) {
        self.quote = quote;
    }

    /// Whether malformed quoting is recovered from.
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Enable or disable lenient parsing. Takes effect on the next byte.
    pub fn set_lenient(&mut self, yes: bool) {
        self.lenient = yes;
    }

    /// Returns true once the end of input has been reached.
    pub fn is_done(&self) -> bool {
        self.state == State::Eof
    }

    /// Returns true when the parser sits between rows, i.e., the next field
    /// it completes will be the first field of a row.
    pub fn is_start_of_row(&self) -> bool {
        self.state == State::ConsumeNewlines
    }

    /// Parse CSV data in `input` and append field data to `field`.
    ///
    /// Calling this routine parses at most a single field and returns the
    /// state of the parser along with the number of bytes consumed from
    /// `input`. When a field is complete, the caller should take its contents
    /// and clear `field` before calling again.
    ///
    /// # Termination
    ///
    /// This parser interprets an empty `input` buffer as an indication that
    /// there is no CSV data left to read. Namely, when the caller has
    /// exhausted all CSV data, the caller should continue to call
    /// `read_field` with an empty input buffer until `ReadFieldResult::End`
    /// is returned.
    ///
    /// # Errors
    ///
    /// In strict mode, malformed quoting returns a `ParseError`. The parser
    /// does not recover from it; call `reset` to start over.
    pub fn read_field(
        &mut self,
        input: &[u8],
        field: &mut Vec<u8>,
    ) -> Result<(ReadFieldResult, usize), ParseError> {
        if self.is_done() {
            return Ok((ReadFieldResult::End, 0));
        }
        if input.is_empty() {
            return self.advance(None, field).map(|res| (res, 0));
        }
        for (i, &b) in input.iter().enumerate() {
            match self.advance(Some(b), field)? {
                ReadFieldResult::InputEmpty => {}
                res => return Ok((res, i + 1)),
            }
        }
        Ok((ReadFieldResult::InputEmpty, input.len()))
    }

    /// Feed a single byte, or the end of input when `input` is `None`, to
    /// the parser.
    ///
    /// Bytes that belong to the current field are appended to `field`.
    /// Once the end of input has been seen, this always returns
    /// `ReadFieldResult::End` and ignores `input`.
    pub fn advance(
        &mut self,
        input: Option<u8>,
        field: &mut Vec<u8>,
    ) -> Result<ReadFieldResult, ParseError> {
        if self.state == State::Eof {
            return Ok(ReadFieldResult::End);
        }
        if let Some(c) = input {
            self.count(c);
        }
        loop {
            match self.state {
                State::Eof => return Ok(ReadFieldResult::End),
                State::ConsumeNewlines => match input {
                    None => {
                        trace!("end of input at line {}", self.line);
                        self.state = State::Eof;
                        return Ok(ReadFieldResult::End);
                    }
                    Some(b'\r') | Some(b'\n') => {
                        return Ok(ReadFieldResult::InputEmpty);
                    }
                    // The first byte of a row goes through `Read` as-is.
                    Some(_) => self.state = State::Read,
                },
                State::QuoteCheck => match input {
                    Some(c) if c == self.quote && c != self.delimiter => {
                        self.push(field, c);
                        self.state = State::Read;
                        return Ok(ReadFieldResult::InputEmpty);
                    }
                    Some(c) if c != self.delimiter && !is_terminator(c) => {
                        // `col` already counts `c`, so the lone quote sits
                        // one column to the left.
                        let col = self.col.saturating_sub(1);
                        if !self.lenient {
                            return Err(self.error(
                                ParseErrorKind::UnescapedQuote,
                                col,
                            ));
                        }
                        debug!(
                            "keeping unescaped quote at line: {}, col: {}",
                            self.line, col
                        );
                        let quote = self.quote;
                        self.push(field, quote);
                        self.push(field, c);
                        self.state = State::Read;
                        return Ok(ReadFieldResult::InputEmpty);
                    }
                    _ => {
                        self.quoted = false;
                        self.state = State::Read;
                    }
                },
                State::Read => return self.read(input, field),
            }
        }
    }

    fn read(
        &mut self,
        input: Option<u8>,
        field: &mut Vec<u8>,
    ) -> Result<ReadFieldResult, ParseError> {
        let c = match input {
            None if self.quoted => {
                if !self.lenient {
                    return Err(self.error(
                        ParseErrorKind::UnterminatedQuotedField,
                        self.col,
                    ));
                }
                debug!(
                    "closing unterminated quoted field at line: {}, col: {}",
                    self.line, self.col
                );
                return Ok(self.end_field(true));
            }
            None => return Ok(self.end_field(true)),
            Some(c) => c,
        };
        if c == self.quote {
            if self.quoted {
                self.state = State::QuoteCheck;
                return Ok(ReadFieldResult::InputEmpty);
            }
            if self.field_len == 0 {
                self.quoted = true;
                return Ok(ReadFieldResult::InputEmpty);
            }
            if !self.lenient {
                return Err(
                    self.error(ParseErrorKind::QuoteInUnquotedField, self.col)
                );
            }
            debug!(
                "keeping quote in unquoted field at line: {}, col: {}",
                self.line, self.col
            );
        } else if !self.quoted && c == self.delimiter {
            return Ok(self.end_field(false));
        } else if !self.quoted && is_terminator(c) {
            return Ok(self.end_field(true));
        }
        self.push(field, c);
        Ok(ReadFieldResult::InputEmpty)
    }

    fn end_field(&mut self, record_end: bool) -> ReadFieldResult {
        self.quoted = false;
        self.field_len = 0;
        if record_end {
            self.state = State::ConsumeNewlines;
        }
        ReadFieldResult::Field { record_end }
    }

    #[inline(always)]
    fn push(&mut self, field: &mut Vec<u8>, b: u8) {
        field.push(b);
        self.field_len += 1;
    }

    #[inline(always)]
    fn count(&mut self, c: u8) {
        if c == b'\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
    }

    fn error(&self, kind: ParseErrorKind, col: u64) -> ParseError {
        ParseError::new(kind, self.line, col)
    }
}

#[inline(always)]
fn is_terminator(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}
