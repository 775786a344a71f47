#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Any TSV input must be read or rejected without panicking
    if let Ok(mapping) = cecog::plate::PlateMapping::from_reader(Cursor::new(data)) {
        for (_, record) in mapping.iter() {
            let _ = record.well_id();
        }
        let mut out = Vec::new();
        let _ = mapping.write_to(&mut out);
    }
});
