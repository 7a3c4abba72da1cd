//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 정규화 엔진 내부에서 발생하는 구조적 에러를 표현합니다.
//! 라인 단위 파싱 실패는 여기에 속하지 않고 [`ParseOutcome::Skip`]으로 전달됩니다.
//! `From<LogPipelineError> for LognormError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! [`ParseOutcome::Skip`]: lognorm_core::types::ParseOutcome::Skip

use lognorm_core::error::{ConfigError, LognormError, ParseError, PipelineError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 라인 파싱 실패 (스킵으로 격하되지 않고 직접 호출자에게 전달된 경우)
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 지원하지 않는 소스 유형
    #[error("unsupported source type: {0}")]
    UnsupportedFormat(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 스트림 입력 에러
    #[error("stream '{stream}' error: {reason}")]
    Stream {
        /// 스트림 이름
        stream: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 문법 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogPipelineError> for LognormError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Parse(e) => LognormError::Parse(e),
            LogPipelineError::Config { field, reason } => {
                LognormError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Channel(reason) => {
                LognormError::Pipeline(PipelineError::ChannelSend(reason))
            }
            LogPipelineError::Stream { stream, reason } => {
                LognormError::Pipeline(PipelineError::StreamFailed { stream, reason })
            }
            LogPipelineError::Io(e) => LognormError::Io(e),
            other => LognormError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
