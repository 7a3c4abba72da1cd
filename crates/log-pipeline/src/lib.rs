#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`timestamp`]: 형식이 제각각인 타임스탬프를 epoch 밀리초로 정규화
//! - [`tokenizer`]: 셸 규칙 따옴표를 지원하는 `key=value` 토크나이저
//! - [`parser`]: 소스 유형별 형식 파서와 레지스트리
//! - [`enricher`]: 메시지 필드의 `key=value` 쌍을 최상위 필드로 병합
//! - [`driver`]: 라인 스트림 하나를 파싱, 보강, 출력하는 드라이버
//! - [`pipeline`]: 여러 스트림을 동시에 실행하는 오케스트레이션
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! reader -> StreamDriver -> FormatParser -> KeyValueEnricher -> mpsc -> downstream
//!               |                |
//!        line length cap   TimestampNormalizer
//! ```

pub mod config;
pub mod driver;
pub mod enricher;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod timestamp;
pub mod tokenizer;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder, PipelineReport, StreamReport};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder, StreamSpec};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{
    ApacheErrorParser, CombinedParser, FormatParser, JsonRecordParser, KernelParser,
    ParserRegistry, WhitespaceParser,
};

// 드라이버
pub use driver::{StreamDriver, StreamStats};

// 보강
pub use enricher::{EnricherConfig, KeyValueEnricher};

// 타임스탬프, 토크나이저
pub use timestamp::{TimestampFormat, TimestampNormalizer};
pub use tokenizer::{TokenSet, tokenize};
