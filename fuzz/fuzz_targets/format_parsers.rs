#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

use lognorm_core::types::{RawLine, SourceType};
use lognorm_log_pipeline::parser::ParserRegistry;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 소스 유형 선택 (SourceType::ALL 인덱스)
    format: u8,
    line: String,
}

fn registry() -> &'static ParserRegistry {
    static REGISTRY: OnceLock<ParserRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| ParserRegistry::new().expect("grammars compile"))
}

fuzz_target!(|input: FuzzInput| {
    let source_type = SourceType::ALL[usize::from(input.format) % SourceType::ALL.len()];
    let raw = RawLine::new(input.line, source_type);
    // 어떤 입력이든 레코드 또는 스킵이어야 하며 패닉하면 안 됨
    let outcome = registry().parse_raw(&raw);
    if let Some(record) = outcome.record() {
        let _ = record.to_json_line();
    }
});
