//! JSON 레코드 파서
//!
//! 상류에서 JSON 객체로 인코딩한 라인을 [`StructuredRecord`]로 변환합니다.
//! key=value 보강의 입력 경로로 사용됩니다.
//!
//! # 값 변환
//! - 정수 → `Integer`, 그 외 숫자 → `Float`, 문자열 → `String`
//! - 불리언 → `"true"` / `"false"` 문자열
//! - 중첩 객체 → dot notation으로 평탄화 (`{"a":{"b":1}}` → `a.b`)
//! - 배열 → JSON 문자열, null → 생략
//!
//! # 사용 예시
//! ```ignore
//! use lognorm_log_pipeline::parser::JsonRecordParser;
//! use lognorm_core::pipeline::LogParser;
//!
//! let outcome = JsonRecordParser.parse(r#"{"message":"src=10.0.0.1 dst=10.0.0.2"}"#);
//! assert!(outcome.is_record());
//! ```

use lognorm_core::error::ParseError;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{FieldValue, ParseOutcome, StructuredRecord};
use serde_json::{Map, Value};

const FORMAT: &str = "json";

/// JSON 레코드 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordParser;

impl JsonRecordParser {
    fn parse_line(line: &str) -> Result<StructuredRecord, ParseError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| ParseError::not_this_format(FORMAT, e.to_string()))?;

        let Value::Object(object) = value else {
            return Err(ParseError::not_this_format(
                FORMAT,
                "expected JSON object at top level",
            ));
        };

        let mut record = StructuredRecord::new();
        flatten_into(&mut record, &object, "");
        Ok(record)
    }
}

/// JSON 객체를 평탄화하여 레코드에 삽입합니다.
fn flatten_into(record: &mut StructuredRecord, object: &Map<String, Value>, prefix: &str) {
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Object(nested) => flatten_into(record, nested, &name),
            Value::Array(_) => {
                record.insert(name, value.to_string());
            }
            Value::Null => {}
            Value::String(s) => {
                record.insert(name, s.as_str());
            }
            Value::Bool(b) => {
                record.insert(name, b.to_string());
            }
            Value::Number(n) => {
                let field = match n.as_i64() {
                    Some(i) => FieldValue::Integer(i),
                    None => match n.as_f64() {
                        Some(f) => FieldValue::Float(f),
                        None => FieldValue::String(n.to_string()),
                    },
                };
                record.insert(name, field);
            }
        }
    }
}

impl LogParser for JsonRecordParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        Self::parse_line(line).into()
    }
}
