#![no_main]

use libfuzzer_sys::fuzz_target;
use lognorm_log_pipeline::{TimestampFormat, TimestampNormalizer};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let normalizer = TimestampNormalizer::with_reference_year(2023);
        let _ = normalizer.normalize(text, TimestampFormat::Fuzzy);
        let _ = normalizer.normalize(text, TimestampFormat::ErrorLog);
        let _ = normalizer.normalize(text, TimestampFormat::Strict("%d/%b/%Y:%H:%M:%S %z"));
    }
});
