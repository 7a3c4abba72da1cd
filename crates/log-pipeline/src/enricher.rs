//! key=value 보강 -- 메시지 필드에 담긴 `key=value` 쌍을 최상위 필드로 펼칩니다.
//!
//! 주 메시지 필드(기본 `message`)를 먼저 찾고, 없으면 대체 필드(기본 `+message`)를
//! 찾습니다. 둘 다 없거나 값이 문자열이 아니면 레코드를 그대로 반환합니다.
//!
//! 토큰화에 실패하면 경고 로그를 남기고 실패 카운터를 올린 뒤 원본 레코드를
//! 그대로 반환합니다. 보강은 멱등입니다. 단, 메시지 필드와 같은 이름의 키가
//! 메시지 필드를 덮어쓰고 그 새 값에 다시 `key=value` 쌍이 들어 있으면 두 번째
//! 보강이 그 쌍을 펼칩니다.
//!
//! # 사용 예시
//! ```ignore
//! use lognorm_core::pipeline::RecordEnricher;
//! use lognorm_log_pipeline::enricher::KeyValueEnricher;
//!
//! let enricher = KeyValueEnricher::default();
//! let enriched = enricher.enrich(record);
//! ```

use lognorm_core::error::ParseError;
use lognorm_core::metrics as m;
use lognorm_core::pipeline::RecordEnricher;
use lognorm_core::types::{FieldValue, StructuredRecord};
use tracing::warn;

use crate::tokenizer;

/// 보강 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnricherConfig {
    /// 주 메시지 필드명
    pub message_field: String,
    /// 주 필드가 없을 때 사용할 대체 필드명
    pub alternate_message_field: String,
    /// 기존 필드와 키가 겹치면 덮어쓸지 여부.
    /// `false`이면 `<메시지 필드>.<키>`로 저장합니다.
    pub overwrite: bool,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            message_field: "message".to_owned(),
            alternate_message_field: "+message".to_owned(),
            overwrite: true,
        }
    }
}

/// key=value 보강기
#[derive(Debug, Clone, Default)]
pub struct KeyValueEnricher {
    config: EnricherConfig,
}

impl KeyValueEnricher {
    /// 설정으로 보강기를 생성합니다.
    pub fn new(config: EnricherConfig) -> Self {
        Self { config }
    }

    /// 보강 설정을 반환합니다.
    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    /// 레코드를 제자리에서 보강하고 병합한 쌍의 개수를 반환합니다.
    ///
    /// 토큰화에 실패하면 레코드를 건드리지 않고 에러를 반환합니다.
    pub fn apply(&self, record: &mut StructuredRecord) -> Result<usize, ParseError> {
        let Some((field, text)) = self.message_of(record) else {
            return Ok(0);
        };

        // 같은 키가 여러 번 나오면 마지막 값만 남깁니다
        let tokens: StructuredRecord = tokenizer::tokenize(text)?.into_iter().collect();
        let field = field.to_owned();

        let mut merged = 0;
        for (key, value) in tokens.iter() {
            let existing = record.get(key);
            if existing == Some(value) {
                continue;
            }
            let collides = existing.is_some() && !self.config.overwrite;
            let target = if collides {
                format!("{field}.{key}")
            } else {
                key.to_owned()
            };
            record.insert(target, value.clone());
            merged += 1;
        }
        Ok(merged)
    }

    /// 보강 대상 필드명과 문자열 값을 찾습니다.
    fn message_of<'r>(&self, record: &'r StructuredRecord) -> Option<(&'r str, &'r str)> {
        [&self.config.message_field, &self.config.alternate_message_field]
            .into_iter()
            .find_map(|name| record.iter().find(|(k, _)| *k == name.as_str()))
            .and_then(|(name, value)| match value {
                FieldValue::String(text) => Some((name, text.as_str())),
                _ => None,
            })
    }
}

/// 보강 실패를 경고 로그와 메트릭으로 남깁니다.
pub(crate) fn report_failure(err: &ParseError) {
    warn!(error = %err, "key=value enrichment failed, record kept unchanged");
    metrics::counter!(m::ENRICH_FAILURES_TOTAL).increment(1);
}

impl RecordEnricher for KeyValueEnricher {
    fn name(&self) -> &str {
        "key_value"
    }

    fn enrich(&self, mut record: StructuredRecord) -> StructuredRecord {
        // apply는 토큰화가 끝난 뒤에만 레코드를 수정하므로 실패 시 원본 그대로
        if let Err(e) = self.apply(&mut record) {
            report_failure(&e);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(message: &str) -> StructuredRecord {
        [
            ("t", FieldValue::Integer(1)),
            ("message", FieldValue::from(message)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn merges_pairs_as_strings() {
        let record = KeyValueEnricher::default().enrich(base(r#"src=10.0.0.1 n=3 msg="a b""#));
        assert_eq!(record.get("src"), Some(&FieldValue::from("10.0.0.1")));
        assert_eq!(record.get("n"), Some(&FieldValue::from("3")));
        assert_eq!(record.get("msg"), Some(&FieldValue::from("a b")));
        // 원래 필드는 유지
        assert_eq!(record.timestamp_ms(), Some(1));
        assert!(record.contains("message"));
    }

    #[test]
    fn uses_alternate_field_when_primary_missing() {
        let record: StructuredRecord = [("+message", "fw=blocked")].into_iter().collect();
        let record = KeyValueEnricher::default().enrich(record);
        assert_eq!(record.get("fw"), Some(&FieldValue::from("blocked")));
    }

    #[test]
    fn primary_wins_over_alternate() {
        let record: StructuredRecord = [("+message", "b=2"), ("message", "a=1")]
            .into_iter()
            .collect();
        let record = KeyValueEnricher::default().enrich(record);
        assert!(record.contains("a"));
        assert!(!record.contains("b"));
    }

    #[test]
    fn no_message_field_is_unchanged() {
        let record: StructuredRecord = [("other", "a=1")].into_iter().collect();
        assert_eq!(KeyValueEnricher::default().enrich(record.clone()), record);
    }

    #[test]
    fn non_string_message_is_unchanged() {
        let record: StructuredRecord = [("message", FieldValue::Integer(5))].into_iter().collect();
        assert_eq!(KeyValueEnricher::default().enrich(record.clone()), record);
    }

    #[test]
    fn tokenization_failure_returns_original() {
        let record = base(r#"a="unterminated"#);
        let enricher = KeyValueEnricher::default();
        assert_eq!(enricher.enrich(record.clone()), record);

        let mut copy = record.clone();
        assert!(enricher.apply(&mut copy).is_err());
        assert_eq!(copy, record);
    }

    #[test]
    fn overwrites_colliding_fields_by_default() {
        let mut record = base("t=99");
        record.insert("t", 1_i64);
        let record = KeyValueEnricher::default().enrich(record);
        assert_eq!(record.get("t"), Some(&FieldValue::from("99")));
    }

    #[test]
    fn no_overwrite_prefixes_colliding_keys() {
        let enricher = KeyValueEnricher::new(EnricherConfig {
            overwrite: false,
            ..Default::default()
        });
        let record = enricher.enrich(base("t=99 user=bob"));
        assert_eq!(record.timestamp_ms(), Some(1));
        assert_eq!(record.get("message.t"), Some(&FieldValue::from("99")));
        assert_eq!(record.get("user"), Some(&FieldValue::from("bob")));
    }

    #[test]
    fn message_key_replaces_message_field() {
        let record = KeyValueEnricher::default().enrich(base("message=inner a=1"));
        assert_eq!(record.get("message"), Some(&FieldValue::from("inner")));
        assert_eq!(record.get("a"), Some(&FieldValue::from("1")));
        assert!(!record.contains("message.message"));
    }

    #[test]
    fn message_key_is_prefixed_without_overwrite() {
        let enricher = KeyValueEnricher::new(EnricherConfig {
            overwrite: false,
            ..Default::default()
        });
        let record = enricher.enrich(base("message=inner a=1"));
        assert_eq!(
            record.get("message"),
            Some(&FieldValue::from("message=inner a=1"))
        );
        assert_eq!(record.get("message.message"), Some(&FieldValue::from("inner")));
    }

    #[test]
    fn later_duplicates_win() {
        let record = KeyValueEnricher::default().enrich(base("a=1 a=2"));
        assert_eq!(record.get("a"), Some(&FieldValue::from("2")));
    }

    #[test]
    fn enrichment_is_idempotent() {
        for overwrite in [true, false] {
            let enricher = KeyValueEnricher::new(EnricherConfig {
                overwrite,
                ..Default::default()
            });
            let mut seed = base("t=7 a=1 a=2 message=x");
            seed.insert("a", "5");
            let once = enricher.enrich(seed);
            let twice = enricher.enrich(once.clone());
            assert_eq!(once, twice, "overwrite={overwrite}");
        }
    }

    #[test]
    fn apply_reports_merged_count() {
        let mut record = base("a=1 b=2 plain");
        assert_eq!(KeyValueEnricher::default().apply(&mut record).unwrap(), 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn rewrites_message_field(message: &str) -> bool {
            tokenizer::tokenize(message)
                .map(|tokens| tokens.iter().any(|(k, _)| k == "message" || k == "+message"))
                .unwrap_or(false)
        }

        proptest! {
            #[test]
            fn idempotent_for_arbitrary_messages(message in "\\PC{0,120}") {
                // 메시지 필드를 다시 쓰는 입력은 멱등 대상이 아님
                prop_assume!(!rewrites_message_field(&message));
                let enricher = KeyValueEnricher::default();
                let once = enricher.enrich(base(&message));
                let twice = enricher.enrich(once.clone());
                prop_assert_eq!(once, twice);
            }
        }
    }
}
