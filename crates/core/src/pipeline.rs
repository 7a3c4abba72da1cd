//! 파이프라인 trait -- 모듈 확장 포인트 정의

use crate::types::{ParseOutcome, StructuredRecord};

/// 로그 파서 trait
///
/// 새로운 로그 형식을 지원하려면 이 trait을 구현합니다.
/// 구현체는 입력 라인 외의 상태를 변경하지 않아야 하며, 여러 스트림 워커가
/// 동시에 호출할 수 있어야 합니다.
pub trait LogParser: Send + Sync {
    /// 지원하는 로그 형식 이름
    fn format_name(&self) -> &str;

    /// 원시 라인 하나를 레코드 또는 스킵으로 변환
    fn parse(&self, line: &str) -> ParseOutcome;
}

/// 레코드 후처리 trait
///
/// 이미 파싱된 레코드에서 추가 구조를 추출합니다.
/// 후처리 실패는 레코드를 버리지 않고 원본을 그대로 반환해야 합니다.
pub trait RecordEnricher: Send + Sync {
    /// 후처리기 이름
    fn name(&self) -> &str;

    /// 레코드를 보강하여 반환
    fn enrich(&self, record: StructuredRecord) -> StructuredRecord;
}
