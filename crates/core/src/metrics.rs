//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않은 경우 카운터 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `lognorm_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use lognorm_core::metrics;
//!
//! ::metrics::counter!(metrics::LINES_PROCESSED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파서 형식 레이블 키 (kernel, combined, apache_error, whitespace, json)
pub const LABEL_FORMAT: &str = "format";

/// 스킵 사유 레이블 키 (not_this_format, timestamp_unparseable 등)
pub const LABEL_REASON: &str = "reason";

// ─── 정규화 메트릭 ─────────────────────────────────────────────────

/// 처리된 전체 원시 라인 수 (counter, label: format)
pub const LINES_PROCESSED_TOTAL: &str = "lognorm_lines_processed_total";

/// 출력된 레코드 수 (counter, label: format)
pub const RECORDS_EMITTED_TOTAL: &str = "lognorm_records_emitted_total";

/// 스킵된 라인 수 (counter, labels: format, reason)
pub const LINES_SKIPPED_TOTAL: &str = "lognorm_lines_skipped_total";

/// key=value 보강 실패 수 (counter)
pub const ENRICH_FAILURES_TOTAL: &str = "lognorm_enrich_failures_total";

/// 실행 중인 스트림 워커 수 (gauge)
pub const ACTIVE_STREAMS: &str = "lognorm_active_streams";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        LINES_PROCESSED_TOTAL,
        "Total number of raw lines handed to a format parser"
    );
    describe_counter!(
        RECORDS_EMITTED_TOTAL,
        "Total number of structured records emitted"
    );
    describe_counter!(
        LINES_SKIPPED_TOTAL,
        "Total number of lines skipped, by format and reason"
    );
    describe_counter!(
        ENRICH_FAILURES_TOTAL,
        "Total number of key=value enrichment failures (record kept unchanged)"
    );
    describe_gauge!(ACTIVE_STREAMS, "Number of stream workers currently running");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_use_prefix() {
        for name in [
            LINES_PROCESSED_TOTAL,
            RECORDS_EMITTED_TOTAL,
            LINES_SKIPPED_TOTAL,
            ENRICH_FAILURES_TOTAL,
            ACTIVE_STREAMS,
        ] {
            assert!(name.starts_with("lognorm_"), "{name}");
        }
    }

    #[test]
    fn describe_without_recorder_is_noop() {
        describe_all();
    }
}
