#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlx::{Document, EncodingRs};

fuzz_target!(|data: &[u8]| {
    let mut doc = Document::new();
    let _ = doc.load_bytes(data, Some(&EncodingRs));
});
