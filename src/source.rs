use std::io;

const BUF_SIZE: usize = 8 * (1 << 10);

/// A source of bytes that can push back a single byte.
///
/// A CSV `Reader` pulls its input through this trait. Implementations exist
/// for anything that implements `io::Read` ([`IoSource`]) and for in-memory
/// byte slices ([`SliceSource`]).
pub trait Source {
    /// Returns the next byte, or `None` at the end of input.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;

    /// Push back `byte` so that the next call to `next_byte` returns it.
    ///
    /// Only one byte of push back is required to be supported.
    fn unread(&mut self, byte: u8);
}

impl<'a, S: Source + ?Sized> Source for &'a mut S {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).next_byte()
    }

    fn unread(&mut self, byte: u8) {
        (**self).unread(byte)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).next_byte()
    }

    fn unread(&mut self, byte: u8) {
        (**self).unread(byte)
    }
}

/// A buffered byte source over any `io::Read` implementation.
///
/// Reads are retried when they fail with `io::ErrorKind::Interrupted`. Any
/// other error is returned as is.
#[derive(Debug)]
pub struct IoSource<R> {
    rdr: R,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    pushback: Option<u8>,
}

impl<R: io::Read> IoSource<R> {
    /// Wrap `rdr` with a default sized buffer.
    pub fn new(rdr: R) -> IoSource<R> {
        IoSource::with_capacity(BUF_SIZE, rdr)
    }

    /// Wrap `rdr` with a buffer of `capacity` bytes. A capacity of `0` is
    /// treated as `1`.
    pub fn with_capacity(capacity: usize, rdr: R) -> IoSource<R> {
        IoSource {
            rdr,
            buf: vec![0; capacity.max(1)],
            pos: 0,
            len: 0,
            pushback: None,
        }
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Returns a mutable reference to the underlying reader.
    ///
    /// Reading from it directly skips whatever is buffered here.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rdr
    }

    /// Unwraps this source, dropping any buffered bytes.
    pub fn into_inner(self) -> R {
        self.rdr
    }

    fn fill_buf(&mut self) -> io::Result<()> {
        loop {
            match self.rdr.read(&mut self.buf) {
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                    return Ok(());
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: io::Read> Source for IoSource<R> {
    #[inline]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            return Ok(Some(b));
        }
        if self.pos == self.len {
            self.fill_buf()?;
            if self.len == 0 {
                return Ok(None);
            }
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    fn unread(&mut self, byte: u8) {
        self.pushback = Some(byte);
    }
}

/// A byte source over an in-memory slice. It never fails.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
    pushback: Option<u8>,
}

impl<'a> SliceSource<'a> {
    /// Read from `data`.
    pub fn new(data: &'a [u8]) -> SliceSource<'a> {
        SliceSource { data, pos: 0, pushback: None }
    }

    /// The bytes that have not been read yet, not counting a pushed back
    /// byte.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl<'a> Source for SliceSource<'a> {
    #[inline]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            return Ok(Some(b));
        }
        match self.data.get(self.pos) {
            None => Ok(None),
            Some(&b) => {
                self.pos += 1;
                Ok(Some(b))
            }
        }
    }

    fn unread(&mut self, byte: u8) {
        self.pushback = Some(byte);
    }
}
