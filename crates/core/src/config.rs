//! 설정 관리 -- lognorm.toml 파싱 및 런타임 설정
//!
//! [`LognormConfig`]는 로깅 설정과 소스별 파서 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGNORM_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`lognorm.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), lognorm_core::error::LognormError> {
//! use lognorm_core::config::LognormConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LognormConfig::load("lognorm.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LognormConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LognormError};
use crate::types::SourceType;

/// 연도 없는 타임스탬프에 허용되는 기준 연도 범위
const REFERENCE_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1970..=9999;

/// lognorm 통합 설정
///
/// `lognorm.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LognormConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 정규화 파이프라인 설정
    #[serde(default)]
    pub pipeline: LogPipelineConfig,
}

impl LognormConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LognormError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LognormError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LognormError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LognormError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LognormError> {
        toml::from_str(toml_str).map_err(|e| {
            LognormError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGNORM_{SECTION}_{FIELD}`
    /// 소스 목록은 파일에서만 설정할 수 있습니다.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "LOGNORM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGNORM_GENERAL_LOG_FORMAT");

        override_usize(
            &mut self.pipeline.channel_capacity,
            "LOGNORM_PIPELINE_CHANNEL_CAPACITY",
        );
        override_usize(
            &mut self.pipeline.max_line_length,
            "LOGNORM_PIPELINE_MAX_LINE_LENGTH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LognormError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.pipeline.validate()?;
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 정규화 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPipelineConfig {
    /// 레코드 출력 채널 용량
    pub channel_capacity: usize,
    /// 최대 라인 길이 (바이트). 초과 라인은 스킵됩니다.
    pub max_line_length: usize,
    /// 소스별 파서 설정
    pub sources: Vec<SourceConfig>,
}

impl Default for LogPipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            max_line_length: 64 * 1024, // 64KB
            sources: Vec::new(),
        }
    }
}

impl LogPipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const MAX_CHANNEL_CAPACITY: usize = 1_000_000;
        const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            });
        }

        if self.max_line_length == 0 || self.max_line_length > MAX_LINE_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.max_line_length".to_owned(),
                reason: format!("must be 1-{MAX_LINE_LENGTH}"),
            });
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "pipeline.sources.name".to_owned(),
                    reason: format!("duplicate source name '{}'", source.name),
                });
            }
        }

        Ok(())
    }
}

/// 소스별 파서 설정
///
/// 어떤 형식 파서를 적용할지, key=value 보강을 수행할지,
/// 연도 없는 타임스탬프의 기준 연도를 무엇으로 할지 결정합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 소스 이름 (로그/메트릭 식별용, 고유해야 함)
    pub name: String,
    /// 입력 파일 경로 (없으면 표준 입력)
    pub path: Option<String>,
    /// 형식 파서 식별자 (kernel, combined, apache_error, whitespace, json)
    pub source_type: String,
    /// key=value 보강 활성화 여부
    pub enrich: bool,
    /// 연도 없는 타임스탬프의 기준 연도 (없으면 현재 연도에서 추론)
    pub reference_year: Option<i32>,
    /// 보강 대상 메시지 필드명
    pub message_field: String,
    /// 메시지 필드가 없을 때 시도할 대체 필드명
    pub alternate_message_field: String,
    /// 기존 필드와 키가 겹칠 때 덮어쓸지 여부
    pub overwrite: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: None,
            source_type: SourceType::Kernel.as_str().to_owned(),
            enrich: false,
            reference_year: None,
            message_field: "message".to_owned(),
            alternate_message_field: "+message".to_owned(),
            overwrite: true,
        }
    }
}

impl SourceConfig {
    /// 형식 식별자를 [`SourceType`]으로 해석합니다.
    pub fn source_type(&self) -> Result<SourceType, ConfigError> {
        self.source_type
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: format!("pipeline.sources[{}].source_type", self.name),
                reason: format!(
                    "unknown source type '{}', expected one of: {}",
                    self.source_type,
                    SourceType::ALL
                        .iter()
                        .map(SourceType::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.sources.name".to_owned(),
                reason: "source name must not be empty".to_owned(),
            });
        }

        self.source_type()?;

        if let Some(year) = self.reference_year
            && !REFERENCE_YEAR_RANGE.contains(&year)
        {
            return Err(ConfigError::InvalidValue {
                field: format!("pipeline.sources[{}].reference_year", self.name),
                reason: format!(
                    "must be {}-{}",
                    REFERENCE_YEAR_RANGE.start(),
                    REFERENCE_YEAR_RANGE.end()
                ),
            });
        }

        if self.enrich && self.message_field.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("pipeline.sources[{}].message_field", self.name),
                reason: "must not be empty when enrich is enabled".to_owned(),
            });
        }

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn kernel_source(name: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_has_sane_values() {
        let config = LognormConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.pipeline.channel_capacity, 1024);
        assert!(config.pipeline.sources.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        LognormConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = LognormConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.pipeline.max_line_length, 64 * 1024);
    }

    #[test]
    fn from_str_sources() {
        let toml = r#"
[general]
log_level = "debug"

[[pipeline.sources]]
name = "kern"
path = "/var/log/kern.log"
source_type = "kernel"
reference_year = 2023

[[pipeline.sources]]
name = "appliance"
source_type = "json"
enrich = true
overwrite = false
"#;
        let config = LognormConfig::parse(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");

        let sources = &config.pipeline.sources;
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_type().unwrap(), SourceType::Kernel);
        assert_eq!(sources[0].reference_year, Some(2023));
        assert!(!sources[0].enrich);
        assert_eq!(sources[1].source_type().unwrap(), SourceType::Json);
        assert!(sources[1].enrich);
        assert!(!sources[1].overwrite);
        assert_eq!(sources[1].message_field, "message");
        assert_eq!(sources[1].alternate_message_field, "+message");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = LognormConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            LognormError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LognormConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = LognormConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_channel_capacity() {
        let mut config = LognormConfig::default();
        config.pipeline.channel_capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn validate_rejects_unknown_source_type() {
        let mut config = LognormConfig::default();
        config.pipeline.sources.push(SourceConfig {
            source_type: "syslog".to_owned(),
            ..kernel_source("a")
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown source type 'syslog'"));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut config = LognormConfig::default();
        config.pipeline.sources.push(kernel_source("kern"));
        config.pipeline.sources.push(kernel_source("kern"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut config = LognormConfig::default();
        config.pipeline.sources.push(kernel_source("  "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_reference_year() {
        let mut config = LognormConfig::default();
        config.pipeline.sources.push(SourceConfig {
            reference_year: Some(12),
            ..kernel_source("kern")
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reference_year"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_LOGNORM_STR", "overridden") };
        override_string(&mut val, "TEST_LOGNORM_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_LOGNORM_STR") };
    }

    #[test]
    #[serial]
    fn env_override_usize_invalid_keeps_original() {
        let mut val = 10_usize;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_LOGNORM_USIZE_BAD", "ten") };
        override_usize(&mut val, "TEST_LOGNORM_USIZE_BAD");
        assert_eq!(val, 10);
        unsafe { std::env::remove_var("TEST_LOGNORM_USIZE_BAD") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_updates_general_section() {
        let mut config = LognormConfig::default();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("LOGNORM_GENERAL_LOG_FORMAT", "pretty") };
        unsafe { std::env::set_var("LOGNORM_PIPELINE_CHANNEL_CAPACITY", "64") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("LOGNORM_GENERAL_LOG_FORMAT") };
        unsafe { std::env::remove_var("LOGNORM_PIPELINE_CHANNEL_CAPACITY") };

        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.pipeline.channel_capacity, 64);
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_LOGNORM_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = LognormConfig::default();
        config.pipeline.sources.push(SourceConfig {
            reference_year: Some(2024),
            ..kernel_source("kern")
        });
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LognormConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.general.log_level, config.general.log_level);
        assert_eq!(parsed.pipeline.sources.len(), 1);
        assert_eq!(parsed.pipeline.sources[0].reference_year, Some(2024));
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = LognormConfig::from_file("/nonexistent/path/lognorm.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LognormError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
