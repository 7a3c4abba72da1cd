#![no_main]

use libfuzzer_sys::fuzz_target;
use lognorm_log_pipeline::tokenize;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(tokens) = tokenize(text) {
            for (key, _) in tokens.iter() {
                assert!(!key.is_empty(), "empty key in {text:?}");
            }
        }
    }
});
