#![no_main]
use libfuzzer_sys::fuzz_target;

use csvline_core::{ReadFieldResult, ReaderBuilder};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let (config, mut data) = data.split_at(3);
    let mut rdr = ReaderBuilder::new()
        .delimiter(config[0])
        .quote(config[1])
        .lenient(config[2] & 1 == 1)
        .build();
    let mut field = vec![];
    loop {
        let (res, nin) = match rdr.read_field(data, &mut field) {
            Ok(x) => x,
            Err(_) => {
                assert!(!rdr.is_lenient());
                return;
            }
        };
        data = &data[nin..];
        match res {
            ReadFieldResult::InputEmpty => assert!(data.is_empty()),
            ReadFieldResult::Field { .. } => field.clear(),
            ReadFieldResult::End => break,
        }
    }
    assert!(rdr.is_done());
});
