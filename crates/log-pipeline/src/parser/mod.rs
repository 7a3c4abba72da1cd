//! 로그 파싱 모듈 -- 소스 유형별 형식 파서와 레지스트리
//!
//! [`ParserRegistry`]는 모든 문법을 시작 시 한 번 컴파일하고, [`SourceType`]마다
//! 하나의 [`FormatParser`]를 보관합니다. 각 파서는 core의
//! [`LogParser`](lognorm_core::pipeline::LogParser) trait을 구현합니다.
//!
//! # 지원 형식
//! - 커널 로그 ([`KernelParser`])
//! - combined 접근 로그 ([`CombinedParser`])
//! - Apache 에러 로그 ([`ApacheErrorParser`])
//! - 공백 구분 테스트 형식 ([`WhitespaceParser`])
//! - JSON 레코드 ([`JsonRecordParser`])
//!
//! # 사용 예시
//! ```ignore
//! use lognorm_core::types::SourceType;
//! use lognorm_log_pipeline::parser::ParserRegistry;
//!
//! let registry = ParserRegistry::new()?;
//! let outcome = registry.parse(SourceType::Whitespace, "GET /index.html 200");
//! assert!(outcome.is_record());
//! ```

pub mod apache_error;
pub mod combined;
pub mod json;
pub mod kernel;
pub mod whitespace;

pub use apache_error::ApacheErrorParser;
pub use combined::CombinedParser;
pub use json::JsonRecordParser;
pub use kernel::KernelParser;
pub use whitespace::WhitespaceParser;

use std::collections::HashMap;

use lognorm_core::error::ParseError;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{ParseOutcome, RawLine, SourceType};

use crate::error::LogPipelineError;
use crate::timestamp::TimestampNormalizer;

/// 형식 파서 -- 소스 유형마다 하나의 variant를 가지는 닫힌 집합
#[derive(Debug, Clone)]
pub enum FormatParser {
    /// 커널 로그
    Kernel(KernelParser),
    /// combined 접근 로그
    Combined(CombinedParser),
    /// Apache 에러 로그
    ApacheError(ApacheErrorParser),
    /// 공백 구분 테스트 형식
    Whitespace(WhitespaceParser),
    /// JSON 레코드
    Json(JsonRecordParser),
}

impl FormatParser {
    /// 소스 유형에 맞는 파서를 생성합니다.
    pub fn for_source(source_type: SourceType) -> Result<Self, LogPipelineError> {
        Ok(match source_type {
            SourceType::Kernel => Self::Kernel(KernelParser::new()?),
            SourceType::Combined => Self::Combined(CombinedParser::new()?),
            SourceType::ApacheError => Self::ApacheError(ApacheErrorParser::new()),
            SourceType::Whitespace => Self::Whitespace(WhitespaceParser),
            SourceType::Json => Self::Json(JsonRecordParser),
        })
    }

    /// 이 파서가 처리하는 소스 유형을 반환합니다.
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Kernel(_) => SourceType::Kernel,
            Self::Combined(_) => SourceType::Combined,
            Self::ApacheError(_) => SourceType::ApacheError,
            Self::Whitespace(_) => SourceType::Whitespace,
            Self::Json(_) => SourceType::Json,
        }
    }

    /// 타임스탬프 정규화기를 바꾼 파서를 반환합니다.
    ///
    /// 타임스탬프가 없는 형식은 그대로 반환합니다.
    pub fn with_normalizer(self, timestamps: TimestampNormalizer) -> Self {
        match self {
            Self::Kernel(p) => Self::Kernel(p.with_normalizer(timestamps)),
            Self::Combined(p) => Self::Combined(p.with_normalizer(timestamps)),
            Self::ApacheError(p) => Self::ApacheError(p.with_normalizer(timestamps)),
            other @ (Self::Whitespace(_) | Self::Json(_)) => other,
        }
    }

    fn inner(&self) -> &dyn LogParser {
        match self {
            Self::Kernel(p) => p,
            Self::Combined(p) => p,
            Self::ApacheError(p) => p,
            Self::Whitespace(p) => p,
            Self::Json(p) => p,
        }
    }
}

impl LogParser for FormatParser {
    fn format_name(&self) -> &str {
        self.inner().format_name()
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        self.inner().parse(line)
    }
}

/// 파서 레지스트리 -- 소스 유형별 파서를 보관합니다.
///
/// 불변이므로 `Arc`로 감싸 여러 스트림 태스크에서 공유합니다.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: HashMap<SourceType, FormatParser>,
}

impl ParserRegistry {
    /// 모든 형식의 문법을 컴파일하여 레지스트리를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        let parsers = SourceType::ALL
            .into_iter()
            .map(|ty| FormatParser::for_source(ty).map(|p| (ty, p)))
            .collect::<Result<_, _>>()?;
        Ok(Self { parsers })
    }

    /// 소스 유형의 파서를 반환합니다.
    pub fn get(&self, source_type: SourceType) -> Option<&FormatParser> {
        self.parsers.get(&source_type)
    }

    /// 주어진 타임스탬프 정규화기에 바인딩된 소스 전용 파서를 만듭니다.
    pub fn bind(
        &self,
        source_type: SourceType,
        timestamps: TimestampNormalizer,
    ) -> Result<FormatParser, LogPipelineError> {
        self.get(source_type)
            .cloned()
            .map(|p| p.with_normalizer(timestamps))
            .ok_or_else(|| LogPipelineError::UnsupportedFormat(source_type.to_string()))
    }

    /// 소스 유형의 파서로 라인을 파싱합니다.
    pub fn parse(&self, source_type: SourceType, line: &str) -> ParseOutcome {
        match self.get(source_type) {
            Some(parser) => parser.parse(line),
            None => ParseOutcome::Skip(ParseError::UnsupportedFormat(source_type.to_string())),
        }
    }

    /// 원시 라인의 소스 유형 태그로 파서를 골라 파싱합니다.
    pub fn parse_raw(&self, raw: &RawLine) -> ParseOutcome {
        self.parse(raw.source_type, raw.as_str())
    }

    /// 형식 식별자 문자열로 파서를 골라 라인을 파싱합니다.
    ///
    /// 알 수 없는 식별자는 `UnsupportedFormat` 스킵이 됩니다.
    pub fn parse_with(&self, format_name: &str, line: &str) -> ParseOutcome {
        match format_name.parse::<SourceType>() {
            Ok(source_type) => self.parse(source_type, line),
            Err(e) => ParseOutcome::Skip(e),
        }
    }

    /// 등록된 형식 식별자 목록을 반환합니다.
    pub fn registered_formats(&self) -> Vec<&'static str> {
        SourceType::ALL
            .into_iter()
            .filter(|ty| self.parsers.contains_key(ty))
            .map(|ty| ty.as_str())
            .collect()
    }
}
