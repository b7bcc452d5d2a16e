/*!
The `csvline` crate provides a pull based CSV reader and a CSV writer.

The reader hands out one field at a time, tells the caller where rows end,
and skips blank lines. Its delimiter, quote character and strictness can be
changed between any two reads. The parser itself lives in the
[`csvline-core`](https://docs.rs/csvline-core) crate, which has no I/O and
works without the standard library.

# Reading

```
use csvline::Reader;

let data = "city,country\r\n\r\n\"Boston, MA\",United States\nKyiv,Ukraine";
let mut rdr = Reader::from_slice(data.as_bytes());
let rows = rdr.read_all()?;
assert_eq!(rows[1], vec!["Boston, MA", "United States"]);
assert_eq!(rows.len(), 3);
# Ok::<(), csvline::Error>(())
```

# Strict and lenient parsing

By default, malformed quoting is a parse error that reports where it was
found. Lenient mode keeps the offending characters instead:

```
use csvline::ReaderBuilder;

let data = b"12\"3\r\n";
let mut rdr = ReaderBuilder::new().from_slice(data);
let err = rdr.read_row().unwrap_err();
assert_eq!("CSV parse error: quote found in unquoted field at line: 1, col: 3",
           err.to_string());

let mut rdr = ReaderBuilder::new().lenient(true).from_slice(data);
assert_eq!(Some(vec!["12\"3".to_string()]), rdr.read_row()?);
# Ok::<(), csvline::Error>(())
```

# Writing

```
use csvline::WriterBuilder;

let mut wtr = WriterBuilder::new().delimiter(b'|').from_writer(vec![]);
wtr.write_row(&["a|b", "c"])?;
wtr.write_row(&["say \"hi\"", ""])?;
let data = String::from_utf8(wtr.into_inner()?).unwrap();
assert_eq!(data, "\"a|b\"|c\r\n\"say \"\"hi\"\"\"|\r\n");
# Ok::<(), csvline::Error>(())
```

# Serde

With the `serde` feature (enabled by default), rows can be deserialized by
position into tuples, tuple structs and structs with
[`Reader::deserialize_row`] and [`Reader::deserialize`].
*/

#![deny(missing_docs)]

pub use csvline_core::{ParseError, ParseErrorKind};

#[cfg(feature = "serde")]
pub use crate::de::{deserialize_row, DeserializeError, DeserializeErrorKind};
pub use crate::error::{Error, Result};
pub use crate::map::{MapReader, MapWriter};
#[cfg(feature = "serde")]
pub use crate::reader::DeserializeRows;
pub use crate::reader::{
    LimitedRow, Position, Reader, ReaderBuilder, Row, Rows,
};
pub use crate::source::{IoSource, SliceSource, Source};
pub use crate::writer::{Writer, WriterBuilder};

#[cfg(feature = "serde")]
mod de;
mod error;
mod map;
mod reader;
mod source;
mod writer;
