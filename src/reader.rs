use std::fs::File;
use std::io;
#[cfg(feature = "serde")]
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;
use std::string::FromUtf8Error;

use csvline_core::{self, ReadFieldResult};
use log::debug;
#[cfg(feature = "serde")]
use serde::de::DeserializeOwned;

#[cfg(feature = "serde")]
use crate::de::deserialize_row;
use crate::error::{Error, Result};
use crate::source::{IoSource, SliceSource, Source};

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, the quote
/// character and whether malformed quoting is an error. Every setting can
/// also be changed on a `Reader` between reads.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    builder: csvline_core::ReaderBuilder,
    capacity: Option<usize>,
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV parser from this configuration that reads data from
    /// `rdr`.
    ///
    /// Note that the CSV reader is buffered automatically, so you should
    /// not wrap `rdr` in a buffered reader like `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<IoSource<R>> {
        let src = match self.capacity {
            None => IoSource::new(rdr),
            Some(cap) => IoSource::with_capacity(cap, rdr),
        };
        self.from_source(src)
    }

    /// Build a CSV parser from this configuration that reads data from the
    /// given file path. The file is closed when the reader is dropped.
    ///
    /// # Errors
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Reader<IoSource<File>>> {
        Ok(self.from_reader(File::open(path)?))
    }

    /// Build a CSV parser from this configuration that reads data from an
    /// in-memory buffer.
    pub fn from_slice<'a>(&self, data: &'a [u8]) -> Reader<SliceSource<'a>> {
        self.from_source(SliceSource::new(data))
    }

    /// Build a CSV parser from this configuration that reads data from any
    /// byte source.
    pub fn from_source<S: Source>(&self, src: S) -> Reader<S> {
        Reader {
            core: self.builder.build(),
            src,
            end_of_row: false,
            field_line: 1,
            err: None,
            retry: None,
        }
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.builder.quote(quote);
        self
    }

    /// Whether to recover from malformed quoting instead of returning a
    /// parse error.
    ///
    /// This is disabled by default.
    pub fn lenient(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.lenient(yes);
        self
    }

    /// Set the capacity (in bytes) of the buffer used when reading from an
    /// `io::Read`.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = Some(capacity);
        self
    }
}

/// A position in CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    line: u64,
    col: u64,
}

impl Position {
    /// The line number, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The number of bytes consumed on the current line.
    pub fn col(&self) -> u64 {
        self.col
    }
}

/// A pull based CSV reader.
///
/// The reader hands out one field at a time with `read_field` (or the raw
/// bytes with `read_byte_field`), and tells the caller whether that field
/// ended a row with `end_of_row`. Row-wise reads such as `read_row` are
/// built on top of field reads and continue from wherever the field cursor
/// currently is.
///
/// Blank lines are skipped and the last row does not need a line terminator.
///
/// # Errors
///
/// Parse errors (in strict mode) and I/O errors are sticky: every later read
/// returns the same error. The end of input is not an error; reads simply
/// return `None` from then on.
///
/// # Retrying a field
///
/// When `read_field` fails because a field is not valid UTF-8, or when
/// `read_field_as` fails to convert a field, the raw field is kept and the
/// next field read returns it again. This lets the caller try a different
/// conversion without losing data.
///
/// # Example
///
/// ```
/// let mut rdr = csvline::Reader::from_slice(b"a,b\r\n\r\n1,2\r\n");
/// assert_eq!(Some(vec!["a".to_string(), "b".to_string()]), rdr.read_row()?);
/// assert_eq!(Some(1), rdr.read_field_as::<i32>()?);
/// assert!(!rdr.end_of_row());
/// assert_eq!(Some(2), rdr.read_field_as::<i32>()?);
/// assert!(rdr.end_of_row());
/// assert_eq!(None, rdr.read_row()?);
/// # Ok::<(), csvline::Error>(())
/// ```
#[derive(Debug)]
pub struct Reader<S> {
    core: csvline_core::Reader,
    src: S,
    /// Whether the last field returned ended its row.
    end_of_row: bool,
    /// The line on which the last field returned ended.
    field_line: u64,
    /// A sticky parse or I/O error.
    err: Option<Error>,
    /// The raw bytes of a field whose conversion failed.
    retry: Option<Vec<u8>>,
}

impl<R: io::Read> Reader<IoSource<R>> {
    /// Create a new CSV reader with a default configuration that reads from
    /// `rdr`.
    ///
    /// To borrow a reader instead of taking ownership of it, pass
    /// `&mut rdr`.
    pub fn from_reader(rdr: R) -> Reader<IoSource<R>> {
        ReaderBuilder::new().from_reader(rdr)
    }
}

impl Reader<IoSource<File>> {
    /// Create a new CSV reader with a default configuration that reads the
    /// file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<IoSource<File>>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<'a> Reader<SliceSource<'a>> {
    /// Create a new CSV reader with a default configuration that reads from
    /// an in-memory buffer.
    pub fn from_slice(data: &'a [u8]) -> Reader<SliceSource<'a>> {
        ReaderBuilder::new().from_slice(data)
    }
}

impl<S: Source> Reader<S> {
    /// Create a new CSV reader with a default configuration that reads from
    /// any byte source.
    pub fn from_source(src: S) -> Reader<S> {
        ReaderBuilder::new().from_source(src)
    }

    /// Read the next field as raw bytes.
    ///
    /// Returns `None` once all input has been read. Calling this again after
    /// that keeps returning `None` without touching the source.
    pub fn read_byte_field(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(raw) = self.retry.take() {
            return Ok(Some(raw));
        }
        if let Some(ref err) = self.err {
            return Err(err.clone());
        }
        if self.core.is_done() {
            return Ok(None);
        }
        let mut field = Vec::new();
        loop {
            let input = match self.src.next_byte() {
                Ok(input) => input,
                Err(err) => return Err(self.fail(Error::from(err))),
            };
            // Taken before the byte is counted, so that a field ended by
            // `\n` reports its own line.
            let line = self.core.line();
            match self.core.advance(input, &mut field) {
                Ok(ReadFieldResult::InputEmpty) => {}
                Ok(ReadFieldResult::Field { record_end }) => {
                    self.end_of_row = record_end;
                    self.field_line = line;
                    return Ok(Some(field));
                }
                Ok(ReadFieldResult::End) => {
                    self.end_of_row = true;
                    return Ok(None);
                }
                Err(err) => return Err(self.fail(Error::Parse(err))),
            }
        }
    }

    /// Read the next field as a string.
    ///
    /// Returns `None` once all input has been read.
    ///
    /// # Errors
    ///
    /// Besides sticky parse and I/O errors, this returns `Error::Utf8` when
    /// the field is not valid UTF-8. The raw bytes are then returned again
    /// by the next field read.
    pub fn read_field(&mut self) -> Result<Option<String>> {
        let raw = match self.read_byte_field()? {
            None => return Ok(None),
            Some(raw) => raw,
        };
        match String::from_utf8(raw) {
            Ok(field) => Ok(Some(field)),
            Err(err) => {
                self.retry = Some(err.as_bytes().to_vec());
                Err(utf8_error(err, self.field_line))
            }
        }
    }

    /// Read the next field and parse it with `FromStr`.
    ///
    /// Returns `None` once all input has been read.
    ///
    /// # Errors
    ///
    /// When the conversion fails, this returns `Error::TypeConversion` and
    /// the field is returned again by the next field read.
    pub fn read_field_as<T>(&mut self) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let field = match self.read_field()? {
            None => return Ok(None),
            Some(field) => field,
        };
        match field.parse() {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                let reason = err.to_string();
                self.retry = Some(field.clone().into_bytes());
                Err(Error::TypeConversion { field, reason })
            }
        }
    }

    /// Returns true if the field most recently returned was the last field
    /// in its row, or if all input has been read.
    pub fn end_of_row(&self) -> bool {
        self.end_of_row || self.core.is_done()
    }

    /// Returns true once all input has been read.
    pub fn is_done(&self) -> bool {
        self.retry.is_none() && self.core.is_done()
    }

    /// Returns true if there is another row, or the rest of the current
    /// row, to read.
    ///
    /// Between rows this skips blank lines, so that the next byte read is
    /// the first byte of the next row.
    pub fn has_row(&mut self) -> Result<bool> {
        if self.retry.is_some() {
            return Ok(true);
        }
        if let Some(ref err) = self.err {
            return Err(err.clone());
        }
        if !self.core.is_start_of_row() {
            return Ok(!self.core.is_done());
        }
        let mut scratch = Vec::new();
        loop {
            let input = match self.src.next_byte() {
                Ok(input) => input,
                Err(err) => return Err(self.fail(Error::from(err))),
            };
            match input {
                Some(b) if b != b'\r' && b != b'\n' => {
                    self.src.unread(b);
                    return Ok(true);
                }
                _ => match self.core.advance(input, &mut scratch) {
                    Ok(ReadFieldResult::End) => {
                        self.end_of_row = true;
                        return Ok(false);
                    }
                    Ok(_) => {}
                    Err(err) => return Err(self.fail(Error::Parse(err))),
                },
            }
        }
    }

    /// Read the rest of the current row, or the next row when positioned
    /// between rows.
    ///
    /// Returns `None` once all input has been read.
    ///
    /// # Errors
    ///
    /// When a field of the row is not valid UTF-8, the whole row is still
    /// consumed and `Error::Utf8` is returned for it. Unlike `read_field`,
    /// nothing is kept for a retry, so the next call reads the next row.
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        let mut raw = vec![];
        while let Some(field) = self.read_byte_field()? {
            raw.push((field, self.field_line));
            if self.end_of_row() {
                break;
            }
        }
        if raw.is_empty() {
            return Ok(None);
        }
        decode_row(raw).map(Some)
    }

    /// Read at most `n` fields of the next row, consuming the whole row.
    ///
    /// Fields past the first `n` are read and discarded, and the returned
    /// row has `too_many_fields` set. Rows with fewer than `n` fields are
    /// returned as they are.
    pub fn read_row_limited(&mut self, n: usize) -> Result<Option<LimitedRow>> {
        if !self.has_row()? {
            return Ok(None);
        }
        let mut raw = Vec::with_capacity(n);
        let mut too_many_fields = false;
        while let Some(field) = self.read_byte_field()? {
            if raw.len() < n {
                raw.push((field, self.field_line));
            } else {
                too_many_fields = true;
            }
            if self.end_of_row() {
                break;
            }
        }
        if too_many_fields {
            debug!(
                "discarded fields past {} at line {}",
                n, self.field_line
            );
        }
        Ok(Some(LimitedRow { fields: decode_row(raw)?, too_many_fields }))
    }

    /// Read every remaining row.
    pub fn read_all(&mut self) -> Result<Vec<Vec<String>>> {
        self.rows().collect()
    }

    /// Returns a borrowed iterator over the remaining rows.
    ///
    /// The iterator stops after yielding its first error.
    pub fn rows(&mut self) -> Rows<S> {
        Rows { rdr: self, done: false }
    }

    /// Returns a cursor over the fields of the next row, or `None` once all
    /// input has been read.
    ///
    /// When the reader is in the middle of a row, the cursor covers the
    /// rest of that row.
    pub fn get_row(&mut self) -> Result<Option<Row<S>>> {
        if !self.has_row()? {
            return Ok(None);
        }
        Ok(Some(Row { rdr: self, done: false }))
    }

    /// Deserialize the next row into `D`.
    ///
    /// Returns `None` once all input has been read. A row that fails to
    /// deserialize is still consumed.
    #[cfg(feature = "serde")]
    pub fn deserialize_row<D: DeserializeOwned>(&mut self) -> Result<Option<D>> {
        match self.read_row()? {
            None => Ok(None),
            Some(row) => Ok(Some(deserialize_row(&row)?)),
        }
    }

    /// Returns a borrowed iterator that deserializes each remaining row into
    /// `D`.
    ///
    /// Unlike `rows`, a row that fails to decode as UTF-8 or to deserialize
    /// does not end the iteration; only parse and I/O errors do.
    #[cfg(feature = "serde")]
    pub fn deserialize<D: DeserializeOwned>(&mut self) -> DeserializeRows<S, D> {
        DeserializeRows { rdr: self, done: false, _priv: PhantomData }
    }

    /// Returns the current position of the parser.
    pub fn position(&self) -> Position {
        Position { line: self.core.line(), col: self.core.col() }
    }

    /// The current line number, starting at `1`.
    pub fn line(&self) -> u64 {
        self.core.line()
    }

    /// The number of bytes consumed on the current line.
    pub fn col(&self) -> u64 {
        self.core.col()
    }
}

impl<S> Reader<S> {
    /// The field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.core.delimiter()
    }

    /// Set the field delimiter. Takes effect on the next field read.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.core.set_delimiter(delimiter);
    }

    /// The quote character.
    pub fn quote(&self) -> u8 {
        self.core.quote()
    }

    /// Set the quote character. Takes effect on the next field read.
    pub fn set_quote(&mut self, quote: u8) {
        self.core.set_quote(quote);
    }

    /// Whether malformed quoting is recovered from.
    pub fn is_lenient(&self) -> bool {
        self.core.is_lenient()
    }

    /// Enable or disable lenient parsing. Takes effect on the next field
    /// read.
    pub fn set_lenient(&mut self, yes: bool) {
        self.core.set_lenient(yes);
    }

    /// Returns a reference to the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.src
    }

    /// Returns a mutable reference to the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.src
    }

    /// Unwraps this reader, returning the underlying source.
    pub fn into_inner(self) -> S {
        self.src
    }

    fn fail(&mut self, err: Error) -> Error {
        debug!("CSV reader stopped: {}", err);
        self.err = Some(err.clone());
        err
    }
}

fn utf8_error(err: FromUtf8Error, line: u64) -> Error {
    let utf8 = err.utf8_error();
    Error::Utf8 { line, field: err.into_bytes(), err: utf8 }
}

/// Decode a row of raw fields, each paired with the line it ended on.
fn decode_row(raw: Vec<(Vec<u8>, u64)>) -> Result<Vec<String>> {
    raw.into_iter()
        .map(|(field, line)| {
            String::from_utf8(field).map_err(|err| utf8_error(err, line))
        })
        .collect()
}

/// A row read with `Reader::read_row_limited`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LimitedRow {
    /// The first fields of the row, up to the requested limit.
    pub fields: Vec<String>,
    /// Whether the row had more fields than the limit. This is a warning;
    /// `fields` is still valid.
    pub too_many_fields: bool,
}

/// A borrowed iterator over the rows of a CSV reader.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// CSV `Reader`.
pub struct Rows<'r, S: 'r> {
    rdr: &'r mut Reader<S>,
    done: bool,
}

impl<'r, S: Source> Iterator for Rows<'r, S> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Result<Vec<String>>> {
        if self.done {
            return None;
        }
        match self.rdr.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// A borrowed iterator that deserializes rows.
#[cfg(feature = "serde")]
pub struct DeserializeRows<'r, S: 'r, D> {
    rdr: &'r mut Reader<S>,
    done: bool,
    _priv: PhantomData<D>,
}

#[cfg(feature = "serde")]
impl<'r, S: Source, D: DeserializeOwned> Iterator for DeserializeRows<'r, S, D> {
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        if self.done {
            return None;
        }
        match self.rdr.deserialize_row() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = err.is_sticky();
                Some(Err(err))
            }
        }
    }
}

/// A cursor over the fields of one row.
///
/// A `Row` mutably borrows its `Reader`, so the reader cannot be used (or
/// dropped) while the row is alive.
pub struct Row<'r, S: 'r> {
    rdr: &'r mut Reader<S>,
    done: bool,
}

impl<'r, S: Source> Row<'r, S> {
    /// Read the next field of this row, or `None` after its last field.
    pub fn read_field(&mut self) -> Result<Option<String>> {
        if self.done {
            return Ok(None);
        }
        let field = self.rdr.read_field()?;
        self.done = field.is_none() || self.rdr.end_of_row();
        Ok(field)
    }

    /// Read the next field of this row and parse it with `FromStr`.
    ///
    /// On a failed conversion the field is kept, so the next read returns
    /// it again.
    pub fn read_field_as<T>(&mut self) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if self.done {
            return Ok(None);
        }
        let value = self.rdr.read_field_as()?;
        self.done = value.is_none() || self.rdr.end_of_row();
        Ok(value)
    }

    /// Returns true once the last field of this row has been read.
    pub fn end_of_row(&self) -> bool {
        self.done
    }

    /// Read the remaining fields of this row.
    pub fn read_vec(&mut self) -> Result<Vec<String>> {
        let mut fields = vec![];
        while let Some(field) = self.read_field()? {
            fields.push(field);
        }
        Ok(fields)
    }

    /// Consume the remaining fields of this row without decoding them.
    pub fn skip_rest(&mut self) -> Result<()> {
        while !self.done {
            let field = self.rdr.read_byte_field()?;
            self.done = field.is_none() || self.rdr.end_of_row();
        }
        Ok(())
    }

    /// Deserialize the remaining fields of this row into `D`.
    #[cfg(feature = "serde")]
    pub fn deserialize<D: DeserializeOwned>(&mut self) -> Result<D> {
        let fields = self.read_vec()?;
        Ok(deserialize_row(&fields)?)
    }
}

impl<'r, S: Source> Iterator for Row<'r, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        match self.read_field() {
            Ok(field) => field.map(Ok),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use csvline_core::ParseErrorKind;

    use super::{LimitedRow, ReaderBuilder};
    use crate::error::Error;
    use crate::source::{SliceSource, Source};
    use crate::Reader;

    fn s(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn field_by_field() {
        let mut rdr = Reader::from_slice(b"a,b\r\nc\r\n");
        assert_eq!(Some("a".to_string()), rdr.read_field().unwrap());
        assert!(!rdr.end_of_row());
        assert_eq!(Some("b".to_string()), rdr.read_field().unwrap());
        assert!(rdr.end_of_row());
        assert_eq!(Some("c".to_string()), rdr.read_field().unwrap());
        assert!(rdr.end_of_row());
        assert!(!rdr.is_done());
        assert_eq!(None, rdr.read_field().unwrap());
        assert!(rdr.end_of_row());
        assert!(rdr.is_done());
    }

    #[test]
    fn eof_is_idempotent() {
        let mut rdr = Reader::from_slice(b"a");
        assert_eq!(Some(s(&["a"])), rdr.read_row().unwrap());
        for _ in 0..3 {
            assert_eq!(None, rdr.read_field().unwrap());
            assert_eq!(None, rdr.read_row().unwrap());
            assert!(!rdr.has_row().unwrap());
        }
    }

    #[test]
    fn read_all_skips_blank_rows() {
        let mut rdr = Reader::from_slice(b"1,2\r\n\r\n\r\n3,4\r\n");
        assert_eq!(
            vec![s(&["1", "2"]), s(&["3", "4"])],
            rdr.read_all().unwrap()
        );
    }

    #[test]
    fn read_row_continues_mid_row() {
        let mut rdr = Reader::from_slice(b"a,b,c\nd");
        assert_eq!(Some("a".to_string()), rdr.read_field().unwrap());
        assert_eq!(Some(s(&["b", "c"])), rdr.read_row().unwrap());
        assert_eq!(Some(s(&["d"])), rdr.read_row().unwrap());
        assert_eq!(None, rdr.read_row().unwrap());
    }

    #[test]
    fn parse_error_is_sticky() {
        let mut rdr = Reader::from_slice(b"a,b\"c\r\nd,e\r\n");
        assert_eq!(Some("a".to_string()), rdr.read_field().unwrap());
        let err = rdr.read_field().unwrap_err();
        let perr = *err.parse_error().unwrap();
        assert_eq!(ParseErrorKind::QuoteInUnquotedField, perr.kind());
        assert_eq!((1, 4), (perr.line(), perr.col()));
        for _ in 0..3 {
            let again = rdr.read_row().unwrap_err();
            assert_eq!(Some(&perr), again.parse_error());
            assert!(rdr.has_row().is_err());
        }
    }

    #[test]
    fn lenient_change_mid_stream() {
        let mut rdr = Reader::from_slice(b"a\"b\r\nc\"d\r\n");
        rdr.set_lenient(true);
        assert!(rdr.is_lenient());
        assert_eq!(Some(s(&["a\"b"])), rdr.read_row().unwrap());
        rdr.set_lenient(false);
        assert!(rdr.read_row().unwrap_err().is_parse_error());
    }

    #[test]
    fn delimiter_change_mid_stream() {
        let mut rdr = Reader::from_slice(b"a,b\r\nc|d,e\r\n");
        assert_eq!(Some(s(&["a", "b"])), rdr.read_row().unwrap());
        rdr.set_delimiter(b'|');
        assert_eq!(b'|', rdr.delimiter());
        assert_eq!(Some(s(&["c", "d,e"])), rdr.read_row().unwrap());
    }

    struct Broken<'a> {
        inner: SliceSource<'a>,
    }

    impl<'a> Source for Broken<'a> {
        fn next_byte(&mut self) -> io::Result<Option<u8>> {
            match self.inner.next_byte()? {
                None => Err(io::Error::new(io::ErrorKind::Other, "unplugged")),
                some => Ok(some),
            }
        }

        fn unread(&mut self, byte: u8) {
            self.inner.unread(byte)
        }
    }

    #[test]
    fn io_error_is_sticky() {
        let mut rdr = Reader::from_source(Broken {
            inner: SliceSource::new(b"a,b\r\nc"),
        });
        assert_eq!(Some(s(&["a", "b"])), rdr.read_row().unwrap());
        let err = rdr.read_field().unwrap_err();
        assert!(err.is_io_error());
        assert!(!err.is_parse_error());
        assert_eq!("unplugged", err.to_string());
        assert!(rdr.read_field().unwrap_err().is_io_error());
    }

    #[test]
    fn retry_after_type_conversion() {
        let mut rdr = Reader::from_slice(b"12,abc,3.5\r\n");
        assert_eq!(Some(12u32), rdr.read_field_as::<u32>().unwrap());
        match rdr.read_field_as::<u32>() {
            Err(Error::TypeConversion { field, .. }) => assert_eq!("abc", field),
            res => panic!("expected a conversion error, got {:?}", res),
        }
        assert_eq!(Some("abc".to_string()), rdr.read_field().unwrap());
        assert!(!rdr.end_of_row());
        assert!(rdr.read_field_as::<i64>().is_err());
        assert_eq!(Some(3.5f64), rdr.read_field_as::<f64>().unwrap());
        assert!(rdr.end_of_row());
    }

    #[test]
    fn retry_after_invalid_utf8() {
        let mut rdr = Reader::from_slice(b"ok,\xFF\xFE\r\n");
        assert_eq!(Some("ok".to_string()), rdr.read_field().unwrap());
        match rdr.read_field() {
            Err(Error::Utf8 { line, ref field, .. }) => {
                assert_eq!(1, line);
                assert_eq!(&b"\xFF\xFE"[..], &field[..]);
            }
            res => panic!("expected a UTF-8 error, got {:?}", res),
        }
        assert_eq!(
            Some(b"\xFF\xFE".to_vec()),
            rdr.read_byte_field().unwrap()
        );
        assert!(rdr.end_of_row());
        assert_eq!(None, rdr.read_field().unwrap());
    }

    #[test]
    fn utf8_error_line_of_last_field() {
        let mut rdr = Reader::from_slice(b"ok\n\xFF\nb");
        assert_eq!(Some("ok".to_string()), rdr.read_field().unwrap());
        match rdr.read_field() {
            Err(Error::Utf8 { line, .. }) => assert_eq!(2, line),
            res => panic!("expected a UTF-8 error, got {:?}", res),
        }
    }

    #[test]
    fn read_row_skips_invalid_utf8_row() {
        let mut rdr = Reader::from_slice(b"a,\xFF,c\r\nd\r\n");
        match rdr.read_row() {
            Err(Error::Utf8 { line, ref field, .. }) => {
                assert_eq!(1, line);
                assert_eq!(&b"\xFF"[..], &field[..]);
            }
            res => panic!("expected a UTF-8 error, got {:?}", res),
        }
        assert!(!rdr.is_done());
        assert_eq!(Some(s(&["d"])), rdr.read_row().unwrap());
        assert_eq!(None, rdr.read_row().unwrap());
    }

    #[test]
    fn limited_row_invalid_utf8() {
        let mut rdr = Reader::from_slice(b"1,\xFF,3\r\n4,5\r\n");
        match rdr.read_row_limited(2) {
            Err(Error::Utf8 { line, .. }) => assert_eq!(1, line),
            res => panic!("expected a UTF-8 error, got {:?}", res),
        }
        assert_eq!(
            Some(LimitedRow { fields: s(&["4", "5"]), too_many_fields: false }),
            rdr.read_row_limited(2).unwrap()
        );
        assert_eq!(None, rdr.read_row_limited(2).unwrap());
    }

    #[test]
    fn limited_row_overflow() {
        let mut rdr = Reader::from_slice(b"1,2,3,4\r\n5,6\r\n");
        assert_eq!(
            Some(LimitedRow { fields: s(&["1", "2"]), too_many_fields: true }),
            rdr.read_row_limited(2).unwrap()
        );
        assert_eq!(
            Some(LimitedRow { fields: s(&["5", "6"]), too_many_fields: false }),
            rdr.read_row_limited(2).unwrap()
        );
        assert_eq!(None, rdr.read_row_limited(2).unwrap());
    }

    #[test]
    fn limited_row_short() {
        let mut rdr = Reader::from_slice(b"1\r\n\r\n");
        let row = rdr.read_row_limited(3).unwrap().unwrap();
        assert_eq!(s(&["1"]), row.fields);
        assert!(!row.too_many_fields);
        assert_eq!(None, rdr.read_row_limited(3).unwrap());
    }

    #[test]
    fn get_row_cursor() {
        let mut rdr = Reader::from_slice(b"\r\n1,x,3\r\n4,5\r\n6");
        {
            let mut row = rdr.get_row().unwrap().unwrap();
            assert_eq!(Some(1), row.read_field_as::<i32>().unwrap());
            assert!(row.read_field_as::<i32>().is_err());
            assert_eq!(Some("x".to_string()), row.read_field().unwrap());
            assert!(!row.end_of_row());
            assert_eq!(s(&["3"]), row.read_vec().unwrap());
            assert!(row.end_of_row());
            assert_eq!(None, row.read_field().unwrap());
        }
        {
            let mut row = rdr.get_row().unwrap().unwrap();
            assert_eq!(Some("4".to_string()), row.read_field().unwrap());
            row.skip_rest().unwrap();
        }
        {
            let row = rdr.get_row().unwrap().unwrap();
            let fields: Vec<String> =
                row.collect::<Result<_, _>>().unwrap();
            assert_eq!(s(&["6"]), fields);
        }
        assert!(rdr.get_row().unwrap().is_none());
    }

    #[test]
    fn rows_stop_after_error() {
        let mut rdr = Reader::from_slice(b"a\r\n\"b\r\n");
        let rows: Vec<_> = rdr.rows().collect();
        assert_eq!(2, rows.len());
        assert_eq!(&s(&["a"]), rows[0].as_ref().unwrap());
        let err = rows[1].as_ref().unwrap_err();
        assert_eq!(
            ParseErrorKind::UnterminatedQuotedField,
            err.parse_error().unwrap().kind()
        );
    }

    #[test]
    fn builder_and_io_source() {
        let data = "a;'b;c'\n";
        let mut rdr = ReaderBuilder::new()
            .delimiter(b';')
            .quote(b'\'')
            .buffer_capacity(3)
            .from_reader(data.as_bytes());
        assert_eq!(Some(s(&["a", "b;c"])), rdr.read_row().unwrap());
        assert_eq!(b'\'', rdr.quote());
        assert_eq!(None, rdr.read_row().unwrap());
        assert_eq!(2, rdr.position().line());
    }

    #[test]
    fn borrowed_reader() {
        let mut data = &b"x,y"[..];
        {
            let mut rdr = Reader::from_reader(&mut data);
            assert_eq!(Some(s(&["x", "y"])), rdr.read_row().unwrap());
        }
        assert!(data.is_empty());
    }

    #[test]
    fn positions() {
        let mut rdr = Reader::from_slice(b"ab,c\nd");
        assert_eq!(1, rdr.line());
        rdr.read_field().unwrap();
        assert_eq!((1, 3), (rdr.line(), rdr.col()));
        rdr.read_field().unwrap();
        assert_eq!((2, 0), (rdr.line(), rdr.col()));
        assert!(rdr.has_row().unwrap());
        assert_eq!((2, 0), (rdr.line(), rdr.col()));
    }
}
