use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use csvline_core::{self, TERMINATOR};
use log::warn;

use crate::error::Result;

/// Builds a CSV writer with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter and the quote
/// character. Rows are always terminated by `\r\n`.
#[derive(Debug, Default)]
pub struct WriterBuilder {
    builder: csvline_core::WriterBuilder,
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    ///
    /// To convert a builder into a writer, call one of the methods starting
    /// with `from_`.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    ///
    /// Fields are handed to `wtr` as they are written, so callers that write
    /// many small fields may want to wrap it in an `io::BufWriter`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer {
            core: self.builder.build(),
            wtr: Some(wtr),
            buf: vec![],
            start_of_row: true,
        }
    }

    /// Build a CSV writer from this configuration that creates (or
    /// truncates) the file at `path` and writes to it through a buffer.
    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Writer<BufWriter<File>>> {
        Ok(self.from_writer(BufWriter::new(File::create(path)?)))
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.builder.quote(quote);
        self
    }
}

/// A CSV writer.
///
/// Fields that contain the quote character, the delimiter, `\r` or `\n` are
/// quoted, with quotes doubled. All other fields, including empty ones, are
/// written as they are.
///
/// When a `Writer` is dropped in the middle of a row, the row is terminated
/// and the sink flushed. Errors at that point are logged and otherwise
/// ignored; call `into_inner` or `flush` to see them.
///
/// # Example
///
/// ```
/// let mut wtr = csvline::Writer::from_writer(vec![]);
/// wtr.write_row(&["a", "b,c"])?;
/// wtr.write_field("\"quoted\"")?;
/// wtr.write_integer(42)?;
/// let data = wtr.into_inner()?;
/// assert_eq!(&b"a,\"b,c\"\r\n\"\"\"quoted\"\"\",42\r\n"[..], &data[..]);
/// # Ok::<(), csvline::Error>(())
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    core: csvline_core::Writer,
    /// Always `Some` until `into_inner` takes it.
    wtr: Option<W>,
    buf: Vec<u8>,
    start_of_row: bool,
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.wtr.is_none() {
            return;
        }
        if !self.start_of_row {
            if let Err(err) = self.end_row() {
                warn!("could not terminate CSV row on drop: {}", err);
                return;
            }
        }
        if let Err(err) = self.flush() {
            warn!("could not flush CSV writer on drop: {}", err);
        }
    }
}

impl Writer<BufWriter<File>> {
    /// Create a new CSV writer with a default configuration that writes to
    /// the file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<BufWriter<File>>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    /// Create a new CSV writer with a default configuration that writes to
    /// `wtr`.
    ///
    /// To borrow a writer instead of taking ownership of it, pass
    /// `&mut wtr`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single field, preceded by a delimiter unless it is the first
    /// field of its row.
    pub fn write_field<T: AsRef<[u8]>>(&mut self, field: T) -> Result<()> {
        self.buf.clear();
        if !self.start_of_row {
            self.buf.push(self.core.delimiter());
        }
        self.core.field(field.as_ref(), &mut self.buf);
        self.write_buf()?;
        self.start_of_row = false;
        Ok(())
    }

    /// Write an integer as a field.
    pub fn write_integer<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        let mut buffer = itoa::Buffer::new();
        self.write_field(buffer.format(n))
    }

    /// Write a float as a field, using the shortest representation that
    /// reads back to the same value.
    pub fn write_float<F: ryu::Float>(&mut self, n: F) -> Result<()> {
        let mut buffer = ryu::Buffer::new();
        self.write_field(buffer.format(n))
    }

    /// Terminate the current row with `\r\n`.
    pub fn end_row(&mut self) -> Result<()> {
        self.get_mut().write_all(TERMINATOR)?;
        self.start_of_row = true;
        Ok(())
    }

    /// Write every field of `row`, then terminate it.
    ///
    /// If a row was already started with `write_field`, the fields are
    /// appended to it.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for field in row {
            self.write_field(field)?;
        }
        self.end_row()
    }

    /// Returns true if no field has been written since the last row ended.
    pub fn is_start_of_row(&self) -> bool {
        self.start_of_row
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.get_mut().flush()?;
        Ok(())
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.core.delimiter()
    }

    /// Set the field delimiter. Takes effect on the next field written.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.core.set_delimiter(delimiter);
    }

    /// The quote character.
    pub fn quote(&self) -> u8 {
        self.core.quote()
    }

    /// Set the quote character. Takes effect on the next field written.
    pub fn set_quote(&mut self, quote: u8) {
        self.core.set_quote(quote);
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        match self.wtr {
            Some(ref wtr) => wtr,
            None => unreachable!("writer used after into_inner"),
        }
    }

    fn get_mut(&mut self) -> &mut W {
        match self.wtr {
            Some(ref mut wtr) => wtr,
            None => unreachable!("writer used after into_inner"),
        }
    }

    /// Terminate the current row if one was started, flush, and return the
    /// underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        if !self.start_of_row {
            self.end_row()?;
        }
        self.flush()?;
        match self.wtr.take() {
            Some(wtr) => Ok(wtr),
            None => unreachable!("writer used after into_inner"),
        }
    }

    fn write_buf(&mut self) -> io::Result<()> {
        match self.wtr {
            Some(ref mut wtr) => wtr.write_all(&self.buf),
            None => unreachable!("writer used after into_inner"),
        }
    }
}
