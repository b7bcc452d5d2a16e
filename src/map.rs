use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::io;

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::source::Source;
use crate::writer::Writer;

/// Reads rows as maps from header to field.
///
/// The headers either come from the first row of the data, or are given
/// up front. Rows shorter than the headers get a default value (empty
/// unless set with `default_value`) for the missing columns. Rows longer
/// than the headers are an `Error::TooManyFields`; the offending row is
/// consumed and reading can continue with the next one.
///
/// # Example
///
/// ```
/// use csvline::{MapReader, Reader};
///
/// let rdr = Reader::from_slice(b"city,pop\r\nBoston,4628910\r\nKyiv\r\n");
/// let mut maps = MapReader::new(rdr)?.default_value("?");
/// let row = maps.read_map()?.unwrap();
/// assert_eq!("4628910", row["pop"]);
/// let row = maps.read_map()?.unwrap();
/// assert_eq!("?", row["pop"]);
/// assert!(maps.read_map()?.is_none());
/// # Ok::<(), csvline::Error>(())
/// ```
#[derive(Debug)]
pub struct MapReader<S> {
    rdr: Reader<S>,
    headers: Vec<String>,
    default: String,
    done: bool,
}

impl<S: Source> MapReader<S> {
    /// Read the headers from the first row of `rdr`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingHeaders` when `rdr` has no rows, and any error
    /// from reading the first row.
    pub fn new(mut rdr: Reader<S>) -> Result<MapReader<S>> {
        match rdr.read_row()? {
            None => Err(Error::MissingHeaders),
            Some(headers) => Ok(MapReader::with_headers(rdr, headers)),
        }
    }

    /// Use `headers` instead of reading them from the data.
    pub fn with_headers(rdr: Reader<S>, headers: Vec<String>) -> MapReader<S> {
        MapReader { rdr, headers, default: String::new(), done: false }
    }

    /// Set the value used for columns missing from short rows.
    pub fn default_value<T: Into<String>>(mut self, value: T) -> MapReader<S> {
        self.default = value.into();
        self
    }

    /// The headers in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Read the next row as a map.
    ///
    /// Returns `None` once all input has been read.
    pub fn read_map(&mut self) -> Result<Option<BTreeMap<String, String>>> {
        let row = match self.rdr.read_row()? {
            None => return Ok(None),
            Some(row) => row,
        };
        if row.len() > self.headers.len() {
            return Err(Error::TooManyFields {
                headers: self.headers.len(),
                fields: row.len(),
            });
        }
        let mut map = BTreeMap::new();
        let mut fields = row.into_iter();
        for header in &self.headers {
            let field = fields.next().unwrap_or_else(|| self.default.clone());
            map.insert(header.clone(), field);
        }
        Ok(Some(map))
    }

    /// Returns a reference to the underlying reader.
    pub fn reader(&self) -> &Reader<S> {
        &self.rdr
    }

    /// Returns a mutable reference to the underlying reader.
    pub fn reader_mut(&mut self) -> &mut Reader<S> {
        &mut self.rdr
    }

    /// Unwraps the underlying reader.
    pub fn into_reader(self) -> Reader<S> {
        self.rdr
    }
}

/// Iterates over rows as maps. The iteration ends after the end of input
/// or after a parse or I/O error.
impl<S: Source> Iterator for MapReader<S> {
    type Item = Result<BTreeMap<String, String>>;

    fn next(&mut self) -> Option<Result<BTreeMap<String, String>>> {
        if self.done {
            return None;
        }
        match self.read_map() {
            Ok(Some(map)) => Some(Ok(map)),
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

/// Writes maps from header to field as rows.
///
/// The header row is written when the `MapWriter` is created. Each map is
/// then written in header order; headers missing from a map get a default
/// value (empty unless set with `default_value`), and keys that are not
/// headers are ignored.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use csvline::{MapWriter, Writer};
///
/// let headers = vec!["city".to_string(), "pop".to_string()];
/// let mut maps = MapWriter::new(Writer::from_writer(vec![]), headers)?;
/// let mut row = BTreeMap::new();
/// row.insert("city".to_string(), "Kyiv".to_string());
/// maps.write_map(&row)?;
/// let data = maps.into_writer().into_inner()?;
/// assert_eq!(&b"city,pop\r\nKyiv,\r\n"[..], &data[..]);
/// # Ok::<(), csvline::Error>(())
/// ```
#[derive(Debug)]
pub struct MapWriter<W: io::Write> {
    wtr: Writer<W>,
    headers: Vec<String>,
    default: String,
}

impl<W: io::Write> MapWriter<W> {
    /// Write `headers` as the first row of `wtr`.
    pub fn new(mut wtr: Writer<W>, headers: Vec<String>) -> Result<MapWriter<W>> {
        wtr.write_row(&headers)?;
        Ok(MapWriter { wtr, headers, default: String::new() })
    }

    /// Set the value written for headers missing from a map.
    pub fn default_value<T: Into<String>>(mut self, value: T) -> MapWriter<W> {
        self.default = value.into();
        self
    }

    /// The headers in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Write one row, looking up each header with `get`.
    pub fn write_with<F, V>(&mut self, mut get: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<V>,
        V: AsRef<[u8]>,
    {
        for header in &self.headers {
            match get(header.as_str()) {
                Some(value) => self.wtr.write_field(value)?,
                None => self.wtr.write_field(&self.default)?,
            }
        }
        self.wtr.end_row()
    }

    /// Write a `BTreeMap` as one row.
    pub fn write_map<V: AsRef<[u8]>>(
        &mut self,
        map: &BTreeMap<String, V>,
    ) -> Result<()> {
        self.write_with(|header| map.get(header))
    }

    /// Write a `HashMap` as one row.
    pub fn write_hash_map<V, H>(&mut self, map: &HashMap<String, V, H>) -> Result<()>
    where
        V: AsRef<[u8]>,
        H: BuildHasher,
    {
        self.write_with(|header| map.get(header))
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()
    }

    /// Unwraps the underlying writer.
    pub fn into_writer(self) -> Writer<W> {
        self.wtr
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::{MapReader, MapWriter};
    use crate::error::Error;
    use crate::{Reader, Writer};

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn headers_from_first_row() {
        let rdr = Reader::from_slice(b"a,b\r\n1,2\r\n3\r\n");
        let mut maps = MapReader::new(rdr).unwrap();
        assert_eq!(&["a".to_string(), "b".to_string()][..], maps.headers());
        assert_eq!(
            Some(map(&[("a", "1"), ("b", "2")])),
            maps.read_map().unwrap()
        );
        assert_eq!(
            Some(map(&[("a", "3"), ("b", "")])),
            maps.read_map().unwrap()
        );
        assert_eq!(None, maps.read_map().unwrap());
    }

    #[test]
    fn given_headers() {
        let rdr = Reader::from_slice(b"1,2\r\n");
        let headers = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let maps = MapReader::with_headers(rdr, headers).default_value("-");
        let got: Vec<_> = maps.collect::<Result<_, _>>().unwrap();
        assert_eq!(vec![map(&[("x", "1"), ("y", "2"), ("z", "-")])], got);
    }

    #[test]
    fn missing_headers() {
        let rdr = Reader::from_slice(b"\r\n\r\n");
        match MapReader::new(rdr) {
            Err(Error::MissingHeaders) => {}
            res => panic!("expected missing headers, got {:?}", res),
        }
    }

    #[test]
    fn too_many_fields_skips_row() {
        let rdr = Reader::from_slice(b"a\r\n1,2\r\n3\r\n");
        let mut maps = MapReader::new(rdr).unwrap();
        match maps.next() {
            Some(Err(Error::TooManyFields { headers: 1, fields: 2 })) => {}
            res => panic!("expected too many fields, got {:?}", res),
        }
        assert_eq!(Some(map(&[("a", "3")])), maps.next().map(|r| r.unwrap()));
        assert!(maps.next().is_none());
    }

    #[test]
    fn invalid_utf8_skips_row() {
        let rdr = Reader::from_slice(b"h\r\n\xFF\r\n2\r\n");
        let mut maps = MapReader::new(rdr).unwrap();
        match maps.next() {
            Some(Err(Error::Utf8 { line: 2, .. })) => {}
            res => panic!("expected a UTF-8 error, got {:?}", res),
        }
        assert_eq!(Some(map(&[("h", "2")])), maps.next().map(|r| r.unwrap()));
        assert!(maps.next().is_none());
    }

    #[test]
    fn iteration_stops_at_parse_error() {
        let rdr = Reader::from_slice(b"a\r\nx\"y\r\nz\r\n");
        let mut maps = MapReader::new(rdr).unwrap();
        assert!(maps.next().unwrap().unwrap_err().is_parse_error());
        assert!(maps.next().is_none());
    }

    #[test]
    fn writes_in_header_order() {
        let headers = vec!["b".to_string(), "a".to_string()];
        let wtr = Writer::from_writer(vec![]);
        let mut maps = MapWriter::new(wtr, headers).unwrap().default_value("0");
        maps.write_map(&map(&[("a", "1"), ("b", "x,y"), ("c", "ignored")]))
            .unwrap();

        let mut hm = HashMap::new();
        hm.insert("a".to_string(), "2");
        maps.write_hash_map(&hm).unwrap();
        assert_eq!(&["b".to_string(), "a".to_string()][..], maps.headers());

        let data = maps.into_writer().into_inner().unwrap();
        assert_eq!("b,a\r\n\"x,y\",1\r\n0,2\r\n", String::from_utf8(data).unwrap());
    }
}
