//! 공백 구분 테스트 형식 파서
//!
//! 공백 하나로 구분된 정확히 세 필드 `method path status`를 받아들입니다.
//! 모든 값은 문자열이며 타임스탬프는 없습니다.

use lognorm_core::error::ParseError;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{ParseOutcome, StructuredRecord};

const FORMAT: &str = "whitespace";

/// 공백 구분 테스트 형식 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceParser;

impl WhitespaceParser {
    fn parse_line(line: &str) -> Result<StructuredRecord, ParseError> {
        let fields: Vec<&str> = line.split(' ').collect();
        let [method, path, status] = fields.as_slice() else {
            return Err(ParseError::not_this_format(
                FORMAT,
                format!("expected 3 space-separated fields, found {}", fields.len()),
            ));
        };

        Ok([("method", *method), ("path", *path), ("status", *status)]
            .into_iter()
            .collect())
    }
}

impl LogParser for WhitespaceParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        Self::parse_line(line).into()
    }
}
