//! 정규화 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`LogPipelineConfig`](lognorm_core::config::LogPipelineConfig)를
//! 기반으로, 문자열 식별자를 타입이 있는 값([`SourceType`], [`EnricherConfig`])으로
//! 해석한 런타임 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use lognorm_core::config::LognormConfig;
//! use lognorm_log_pipeline::config::PipelineConfig;
//!
//! let core_config = LognormConfig::default();
//! let config = PipelineConfig::from_core(&core_config.pipeline)?;
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use lognorm_core::config::{LogPipelineConfig, SourceConfig};
use lognorm_core::types::SourceType;

use crate::enricher::EnricherConfig;
use crate::error::LogPipelineError;
use crate::timestamp::TimestampNormalizer;

/// 스트림 하나의 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    /// 스트림 이름 (로그/통계 식별용)
    pub name: String,
    /// 입력 파일 경로 (없으면 표준 입력)
    pub path: Option<PathBuf>,
    /// 적용할 형식 파서
    pub source_type: SourceType,
    /// 연도 없는 타임스탬프의 기준 연도
    pub reference_year: Option<i32>,
    /// key=value 보강 설정 (없으면 보강하지 않음)
    pub enrich: Option<EnricherConfig>,
}

impl StreamSpec {
    /// 기본값으로 스트림 설정을 생성합니다 (보강 없음, 기준 연도 없음).
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            path: None,
            source_type,
            reference_year: None,
            enrich: None,
        }
    }

    /// 입력 파일 경로를 설정합니다.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 기준 연도를 설정합니다.
    pub fn with_reference_year(mut self, year: Option<i32>) -> Self {
        self.reference_year = year;
        self
    }

    /// key=value 보강을 활성화합니다.
    pub fn with_enrichment(mut self, config: EnricherConfig) -> Self {
        self.enrich = Some(config);
        self
    }

    /// 이 스트림의 타임스탬프 정규화기를 만듭니다.
    pub fn normalizer(&self) -> TimestampNormalizer {
        match self.reference_year {
            Some(year) => TimestampNormalizer::with_reference_year(year),
            None => TimestampNormalizer::new(),
        }
    }

    /// core의 소스 설정에서 스트림 설정을 생성합니다.
    pub fn from_source(source: &SourceConfig) -> Result<Self, LogPipelineError> {
        let source_type = source
            .source_type()
            .map_err(|e| LogPipelineError::Config {
                field: format!("sources[{}].source_type", source.name),
                reason: e.to_string(),
            })?;

        let enrich = source.enrich.then(|| EnricherConfig {
            message_field: source.message_field.clone(),
            alternate_message_field: source.alternate_message_field.clone(),
            overwrite: source.overwrite,
        });

        Ok(Self {
            name: source.name.clone(),
            path: source.path.as_ref().map(PathBuf::from),
            source_type,
            reference_year: source.reference_year,
            enrich,
        })
    }
}

/// 정규화 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 레코드 출력 채널 용량
    pub channel_capacity: usize,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 스트림 목록
    pub streams: Vec<StreamSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            max_line_length: 64 * 1024,
            streams: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// core의 `LogPipelineConfig`에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &LogPipelineConfig) -> Result<Self, LogPipelineError> {
        let streams = core
            .sources
            .iter()
            .map(StreamSpec::from_source)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            channel_capacity: core.channel_capacity,
            max_line_length: core.max_line_length,
            streams,
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.channel_capacity == 0 {
            return Err(LogPipelineError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_line_length == 0 {
            return Err(LogPipelineError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let stdin_streams = self.streams.iter().filter(|s| s.path.is_none()).count();
        if stdin_streams > 1 {
            return Err(LogPipelineError::Config {
                field: "streams".to_owned(),
                reason: format!("{stdin_streams} streams read standard input, at most one may"),
            });
        }

        let mut names = HashSet::new();
        for stream in &self.streams {
            if !names.insert(stream.name.as_str()) {
                return Err(LogPipelineError::Config {
                    field: "streams".to_owned(),
                    reason: format!("duplicate stream name '{}'", stream.name),
                });
            }
            if let Some(enrich) = &stream.enrich
                && enrich.message_field.is_empty()
            {
                return Err(LogPipelineError::Config {
                    field: format!("streams[{}].message_field", stream.name),
                    reason: "must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 출력 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.config.max_line_length = length;
        self
    }

    /// 스트림을 추가합니다.
    pub fn stream(mut self, stream: StreamSpec) -> Self {
        self.config.streams.push(stream);
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_resolves_sources() {
        let core = LogPipelineConfig {
            channel_capacity: 16,
            max_line_length: 512,
            sources: vec![
                SourceConfig {
                    name: "kern".to_owned(),
                    path: Some("/var/log/kern.log".to_owned()),
                    reference_year: Some(2023),
                    ..Default::default()
                },
                SourceConfig {
                    name: "fw".to_owned(),
                    source_type: "json".to_owned(),
                    enrich: true,
                    overwrite: false,
                    ..Default::default()
                },
            ],
        };

        let config = PipelineConfig::from_core(&core).unwrap();
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.max_line_length, 512);

        let kern = &config.streams[0];
        assert_eq!(kern.source_type, SourceType::Kernel);
        assert_eq!(kern.path.as_deref(), Some(std::path::Path::new("/var/log/kern.log")));
        assert!(kern.enrich.is_none());
        assert_eq!(kern.normalizer().reference_year(), Some(2023));

        let fw = &config.streams[1];
        assert_eq!(fw.source_type, SourceType::Json);
        let enrich = fw.enrich.as_ref().unwrap();
        assert!(!enrich.overwrite);
        assert_eq!(enrich.message_field, "message");
    }

    #[test]
    fn from_core_rejects_unknown_source_type() {
        let core = LogPipelineConfig {
            sources: vec![SourceConfig {
                name: "x".to_owned(),
                source_type: "syslog".to_owned(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = PipelineConfig::from_core(&core).unwrap_err();
        assert!(matches!(err, LogPipelineError::Config { .. }));
    }

    #[test]
    fn validate_rejects_zero_line_length() {
        let config = PipelineConfig {
            max_line_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = PipelineConfigBuilder::new()
            .channel_capacity(8)
            .stream(StreamSpec::new("web", SourceType::Combined))
            .build()
            .unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.streams.len(), 1);
    }

    #[test]
    fn builder_rejects_duplicate_streams() {
        let result = PipelineConfigBuilder::new()
            .stream(StreamSpec::new("a", SourceType::Kernel).with_path("/tmp/a"))
            .stream(StreamSpec::new("a", SourceType::Json).with_path("/tmp/b"))
            .build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_two_stdin_streams() {
        let result = PipelineConfigBuilder::new()
            .stream(StreamSpec::new("a", SourceType::Kernel))
            .stream(StreamSpec::new("b", SourceType::Json))
            .build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("standard input"));
    }

    #[test]
    fn builder_rejects_empty_message_field() {
        let result = PipelineConfigBuilder::new()
            .stream(StreamSpec::new("a", SourceType::Json).with_enrichment(EnricherConfig {
                message_field: String::new(),
                ..Default::default()
            }))
            .build();
        assert!(result.is_err());
    }
}
