#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Arbitrary XML must parse or fail with an error, never panic
    if let Ok(file) = cecog::annotation::MarkerFile::from_reader(Cursor::new(data)) {
        let mapping = cecog::annotation::FrameMapping::default();
        let annotation = cecog::annotation::Annotation::from_markers(&file.markers, mapping);
        let _ = annotation.count_by_class();
    }
});
