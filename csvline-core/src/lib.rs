/*!
`csvline-core` provides the field parser state machine and the quoting rules
used by the [`csvline`](https://docs.rs/csvline) crate.

The parser is push based: the caller feeds it one byte at a time (or a slice
of bytes at a time) and it reports when a field, or a field that ends a row,
has been completed. It never performs I/O and it never allocates on its own;
field data is appended to a caller owned `Vec<u8>`.

# Example: counting fields

```
use csvline_core::{ReadFieldResult, Reader};

let data = b"foo,bar\r\n\r\n\"quux, baz\",fizz\r\n";
let mut rdr = Reader::new();
let mut field = Vec::new();
let mut input = &data[..];
let (mut fields, mut rows) = (0, 0);
loop {
    let (res, nin) = rdr.read_field(input, &mut field).unwrap();
    input = &input[nin..];
    match res {
        ReadFieldResult::InputEmpty => {}
        ReadFieldResult::Field { record_end } => {
            fields += 1;
            if record_end {
                rows += 1;
            }
            field.clear();
        }
        ReadFieldResult::End => break,
    }
}
assert_eq!(4, fields);
assert_eq!(2, rows);
```

# Strict and lenient parsing

By default the parser follows RFC 4180 closely and reports a [`ParseError`]
for a stray quote in an unquoted field, for a quote that closes a quoted
field but is followed by something other than a delimiter or line
terminator, and for a quoted field that is still open at the end of input.
In lenient mode each of those is recovered from by keeping the offending
characters literally.
*/

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use crate::reader::{
    ParseError, ParseErrorKind, ReadFieldResult, Reader, ReaderBuilder,
};
pub use crate::writer::{Writer, WriterBuilder, TERMINATOR};

mod reader;
mod writer;
