#![no_main]
use libfuzzer_sys::fuzz_target;

use csvline::{ReaderBuilder, Writer};

fuzz_target!(|data: &[u8]| {
    let fields: Vec<&[u8]> = data.split(|&b| b == 0).collect();
    if fields.len() == 1 && fields[0].is_empty() {
        return;
    }
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_row(&fields).unwrap();
    let written = wtr.into_inner().unwrap();

    let mut rdr = ReaderBuilder::new().from_slice(&written);
    let mut got = vec![];
    while let Some(field) = rdr.read_byte_field().unwrap() {
        got.push(field);
        if rdr.end_of_row() {
            break;
        }
    }
    let fields: Vec<Vec<u8>> = fields.iter().map(|f| f.to_vec()).collect();
    assert_eq!(fields, got);
});
