//! 에러 타입 -- 도메인별 에러 정의
//!
//! [`ParseError`]는 라인 단위 파싱 실패 분류 체계입니다. 파서 단계의 모든 실패는
//! 해당 라인의 스킵으로 격하되며, 프로세스를 중단시키지 않습니다.

/// lognorm 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LognormError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 스트림 워커 실패 (라인 공급원 자체의 구조적 실패)
    #[error("stream '{stream}' failed: {reason}")]
    StreamFailed { stream: String, reason: String },
}

/// 라인 단위 파싱 에러
///
/// [`ParseOutcome::Skip`](crate::types::ParseOutcome::Skip)에 담겨 전달되며,
/// 호출자에게 예외로 노출되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// 라인이 선택된 파서의 문법에 맞지 않음 (에러가 아닌 스킵)
    #[error("not a {format} line: {reason}")]
    NotThisFormat { format: String, reason: String },

    /// 타임스탬프 해석 실패
    #[error("unparseable timestamp '{input}': {reason}")]
    TimestampUnparseable { input: String, reason: String },

    /// 셸 스타일 토큰화 실패 (닫히지 않은 따옴표 등)
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// 정수여야 하는 필드에 숫자가 아닌 값이 들어 있음
    #[error("field '{field}' is not a valid integer: '{value}'")]
    NumericFieldInvalid { field: String, value: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ParseError {
    /// 메트릭 레이블로 사용할 에러 분류명을 반환합니다.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotThisFormat { .. } => "not_this_format",
            Self::TimestampUnparseable { .. } => "timestamp_unparseable",
            Self::Tokenization(_) => "tokenization",
            Self::NumericFieldInvalid { .. } => "numeric_field_invalid",
            Self::TooLarge { .. } => "too_large",
            Self::UnsupportedFormat(_) => "unsupported_format",
        }
    }

    /// `NotThisFormat` 에러를 간편하게 생성합니다.
    pub fn not_this_format(format: &str, reason: impl Into<String>) -> Self {
        Self::NotThisFormat {
            format: format.to_owned(),
            reason: reason.into(),
        }
    }

    /// `NumericFieldInvalid` 에러를 간편하게 생성합니다.
    pub fn numeric(field: &str, value: &str) -> Self {
        Self::NumericFieldInvalid {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_kinds_are_distinct() {
        let errors = [
            ParseError::not_this_format("kernel", "missing marker"),
            ParseError::TimestampUnparseable {
                input: "x".to_owned(),
                reason: "no date".to_owned(),
            },
            ParseError::Tokenization("unterminated quote".to_owned()),
            ParseError::numeric("status", "abc"),
            ParseError::TooLarge { size: 10, max: 5 },
            ParseError::UnsupportedFormat("xml".to_owned()),
        ];
        let mut kinds: Vec<_> = errors.iter().map(ParseError::kind).collect();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn numeric_error_display() {
        let err = ParseError::numeric("pid", "12a");
        let msg = err.to_string();
        assert!(msg.contains("pid"));
        assert!(msg.contains("12a"));
    }

    #[test]
    fn parse_error_converts_to_top_level() {
        let err: LognormError = ParseError::UnsupportedFormat("xml".to_owned()).into();
        assert!(matches!(err, LognormError::Parse(_)));
        assert!(err.to_string().contains("xml"));
    }
}
