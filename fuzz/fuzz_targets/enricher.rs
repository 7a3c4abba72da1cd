#![no_main]

use libfuzzer_sys::fuzz_target;

use lognorm_core::pipeline::RecordEnricher;
use lognorm_core::types::StructuredRecord;
use lognorm_log_pipeline::{tokenize, EnricherConfig, KeyValueEnricher};

fuzz_target!(|input: (bool, String)| {
    let (overwrite, message) = input;
    let enricher = KeyValueEnricher::new(EnricherConfig {
        overwrite,
        ..Default::default()
    });

    // a token named like the message field replaces it, so a second pass may find new pairs
    let rewrites_message = tokenize(&message)
        .map(|tokens| tokens.iter().any(|(k, _)| k == "message" || k == "+message"))
        .unwrap_or(false);

    let record: StructuredRecord = [("message", message.as_str())].into_iter().collect();
    let once = enricher.enrich(record);
    let twice = enricher.enrich(once.clone());
    if !rewrites_message {
        assert_eq!(once, twice, "enrichment must be idempotent");
    }
});
