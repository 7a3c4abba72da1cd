//! 형식 파서 벤치마크
//!
//! 커널, combined, Apache 에러, JSON 파서와 key=value 보강의 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lognorm_core::pipeline::{LogParser, RecordEnricher};
use lognorm_core::types::SourceType;
use lognorm_log_pipeline::parser::ParserRegistry;
use lognorm_log_pipeline::{KeyValueEnricher, TimestampNormalizer, tokenize};

/// 커널 로그
const KERNEL: &str = "Oct  3 08:28:06 ES kernel: [307228.938154] ACPI: EC: EC stopped";

/// combined 접근 로그
const COMBINED: &str = r#"127.0.0.1 - frank [10/Oct/2023:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08 [en] (Win98; I ;Nav)""#;

/// Apache 에러 로그
const APACHE_ERROR: &str = "[Wed Oct 11 14:32:52.123456 2023] [core:error] [pid 35708:tid 4328636416] [client 72.15.99.187] File does not exist: /usr/local/apache2/htdocs/favicon.ico";

/// JSON 짧은 레코드
const JSON_SHORT: &str = r#"{"t":1700000000000,"host":"web-01","message":"request processed"}"#;

/// JSON 긴 레코드 (중첩 객체 + key=value 메시지)
const JSON_LONG: &str = r#"{"t":1700000000000,"host":"fw-edge-01","http":{"method":"POST","path":"/api/v1/users","status":403},"tags":["edge","prod"],"message":"action=drop src=203.0.113.45 dst=10.0.0.8 proto=tcp dport=443 rule=\"block external admin\" user='svc backup'"}"#;

/// 보강 대상 메시지
const KV_MESSAGE: &str = r#"action=drop src=203.0.113.45 dst=10.0.0.8 proto=tcp dport=443 rule="block external admin" user='svc backup' note=a\ b"#;

fn bench_formats(c: &mut Criterion) {
    let registry = ParserRegistry::new().expect("registry");
    let normalizer = TimestampNormalizer::with_reference_year(2023);

    let mut group = c.benchmark_group("format_parsers");
    group.throughput(Throughput::Elements(1));

    for (source_type, line) in [
        (SourceType::Kernel, KERNEL),
        (SourceType::Combined, COMBINED),
        (SourceType::ApacheError, APACHE_ERROR),
        (SourceType::Json, JSON_SHORT),
        (SourceType::Json, JSON_LONG),
    ] {
        let parser = registry.bind(source_type, normalizer).expect("parser");
        group.bench_with_input(
            BenchmarkId::new(source_type.as_str(), line.len()),
            line,
            |b, line| b.iter(|| parser.parse(black_box(line))),
        );
    }

    // 형식이 맞지 않는 라인의 스킵 비용
    let kernel = registry.bind(SourceType::Kernel, normalizer).expect("parser");
    group.bench_function("kernel_skip", |b| {
        b.iter(|| kernel.parse(black_box(COMBINED)))
    });

    group.finish();
}

fn bench_enrichment(c: &mut Criterion) {
    let registry = ParserRegistry::new().expect("registry");
    let enricher = KeyValueEnricher::default();

    let mut group = c.benchmark_group("key_value");

    group.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(KV_MESSAGE))));

    group.bench_function("json_parse_and_enrich", |b| {
        b.iter(|| {
            let record = registry
                .parse(SourceType::Json, black_box(JSON_LONG))
                .into_record()
                .expect("record");
            enricher.enrich(record)
        })
    });

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                if let Some(record) = registry.parse(SourceType::Json, JSON_LONG).into_record() {
                    black_box(enricher.enrich(record));
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_formats, bench_enrichment);
criterion_main!(benches);
