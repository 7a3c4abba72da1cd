//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 원시 라인([`RawLine`]), 정규화된 레코드([`StructuredRecord`]), 파싱 결과
//! ([`ParseOutcome`]) 등 모든 모듈이 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ParseError;

/// 정규화된 타임스탬프 필드명 (epoch 밀리초)
pub const TIMESTAMP_FIELD: &str = "t";

/// 소스 유형 -- 어떤 형식 파서를 적용할지 선택하는 닫힌 집합
///
/// 새 형식을 추가하려면 variant를 추가하고 레지스트리에 파서를 등록합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// 커널 링 버퍼 로그 (`/var/log/kern.log`)
    Kernel,
    /// Apache/Nginx "combined" 접근 로그
    Combined,
    /// Apache httpd 2.x 에러 로그
    ApacheError,
    /// 공백 구분 테스트 형식 (`method path status`)
    Whitespace,
    /// 상류에서 JSON으로 인코딩된 평탄 레코드
    Json,
}

impl SourceType {
    /// 지원하는 모든 소스 유형
    pub const ALL: [SourceType; 5] = [
        SourceType::Kernel,
        SourceType::Combined,
        SourceType::ApacheError,
        SourceType::Whitespace,
        SourceType::Json,
    ];

    /// 설정/CLI에서 사용하는 식별자를 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kernel => "kernel",
            Self::Combined => "combined",
            Self::ApacheError => "apache_error",
            Self::Whitespace => "whitespace",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnsupportedFormat(s.to_owned()))
    }
}

/// 원시 로그 라인
///
/// 수집 측이 생성하여 즉시 소비하는 불변 데이터입니다.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// 원시 라인 텍스트 (줄바꿈 제외)
    pub line: Arc<str>,
    /// 적용할 형식 파서
    pub source_type: SourceType,
    /// 수집 소스 식별자 (예: "file:/var/log/kern.log", "stdin")
    pub source: String,
}

impl RawLine {
    /// 새 RawLine을 생성합니다.
    pub fn new(line: impl Into<Arc<str>>, source_type: SourceType) -> Self {
        Self {
            line: line.into(),
            source_type,
            source: String::new(),
        }
    }

    /// 수집 소스 식별자를 설정합니다.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// 라인 텍스트를 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.line
    }
}

/// 레코드 필드 값 -- 정수, 실수, 문자열 스칼라
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 정수
    Integer(i64),
    /// 부동소수점
    Float(f64),
    /// 문자열
    String(String),
}

impl FieldValue {
    /// 정수 값이면 반환합니다.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// 실수로 표현 가능한 값이면 반환합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::String(_) => None,
        }
    }

    /// 문자열 값이면 반환합니다.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// 정규화된 구조화 레코드
///
/// 필드명 → 스칼라 값의 순서 있는 매핑입니다. 같은 이름으로 다시 삽입하면
/// 기존 위치의 값을 덮어씁니다. 필드 수가 적으므로 선형 탐색을 사용합니다.
///
/// JSON으로 직렬화하면 평탄한 객체가 됩니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredRecord {
    fields: Vec<(String, FieldValue)>,
}

impl StructuredRecord {
    /// 빈 레코드를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드를 삽입합니다. 같은 이름의 필드가 있으면 덮어쓰고 이전 값을 반환합니다.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// 필드 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// 필드 존재 여부를 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 정규화된 타임스탬프(`t`, epoch 밀리초)를 반환합니다.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.get(TIMESTAMP_FIELD).and_then(FieldValue::as_int)
    }

    /// 필드 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 필드가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 삽입 순서대로 필드를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 평탄한 JSON 객체 한 줄로 인코딩합니다.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for StructuredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for StructuredRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// 라인 하나의 파싱 결과
///
/// 레코드 또는 분류된 스킵 사유 중 하나입니다. 잘못된 입력은 일상적인 상황이므로
/// 패닉이나 에러 전파 대신 명시적인 값으로 표현합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// 파싱 성공
    Record(StructuredRecord),
    /// 이 라인은 출력을 만들지 않음
    Skip(ParseError),
}

impl ParseOutcome {
    /// 레코드인지 확인합니다.
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// 스킵인지 확인합니다.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }

    /// 레코드에 대한 참조를 반환합니다.
    pub fn record(&self) -> Option<&StructuredRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Skip(_) => None,
        }
    }

    /// 레코드를 꺼냅니다.
    pub fn into_record(self) -> Option<StructuredRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Skip(_) => None,
        }
    }

    /// 스킵 사유를 반환합니다.
    pub fn skip_reason(&self) -> Option<&ParseError> {
        match self {
            Self::Record(_) => None,
            Self::Skip(reason) => Some(reason),
        }
    }
}

impl From<Result<StructuredRecord, ParseError>> for ParseOutcome {
    fn from(result: Result<StructuredRecord, ParseError>) -> Self {
        match result {
            Ok(record) => Self::Record(record),
            Err(reason) => Self::Skip(reason),
        }
    }
}
