#![no_main]
use factorysave::{DecodeEvent, SaveExtractor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = SaveExtractor::extract_header(data);
    let mut events: Vec<DecodeEvent> = Vec::new();
    let _ = SaveExtractor::default().decode(data, &mut events);
});
