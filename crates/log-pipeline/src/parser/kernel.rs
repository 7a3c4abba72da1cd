//! 커널 링 버퍼 로그 파서
//!
//! # 형식
//! ```text
//! <자유 형식 날짜> <호스트> kernel: [<초>.<나노초>] <메시지>
//! Oct  3 08:28:06 ES kernel: [307228.938154] ACPI: EC: EC stopped
//! ```
//!
//! 출력 필드: `t`, `host`, `since_start_sec`, `since_start_ns`, `message`

use lognorm_core::error::ParseError;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{ParseOutcome, StructuredRecord, TIMESTAMP_FIELD};
use regex::Regex;

use crate::error::LogPipelineError;
use crate::timestamp::{TimestampFormat, TimestampNormalizer};

const FORMAT: &str = "kernel";
const MARKER: &str = "kernel: ";

/// 커널 로그 파서
#[derive(Debug, Clone)]
pub struct KernelParser {
    /// 부팅 후 경과 시간 `[sec.ns]`
    uptime: Regex,
    timestamps: TimestampNormalizer,
}

impl KernelParser {
    /// 문법을 컴파일하여 새 파서를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        Ok(Self {
            uptime: Regex::new(r"^\[(\d+)\.(\d+)\]")?,
            timestamps: TimestampNormalizer::default(),
        })
    }

    /// 타임스탬프 정규화기를 바꿉니다.
    pub fn with_normalizer(mut self, timestamps: TimestampNormalizer) -> Self {
        self.timestamps = timestamps;
        self
    }

    fn parse_line(&self, line: &str) -> Result<StructuredRecord, ParseError> {
        let (prefix, rest) = line
            .split_once(MARKER)
            .ok_or_else(|| ParseError::not_this_format(FORMAT, "missing 'kernel: ' marker"))?;

        // 마지막 토큰은 호스트명, 그 앞은 날짜
        let prefix = prefix.trim();
        let (date, host) = match prefix.rsplit_once(char::is_whitespace) {
            Some((date, host)) => (date, Some(host)),
            None => ("", None),
        };

        let caps = self
            .uptime
            .captures(rest)
            .ok_or_else(|| ParseError::not_this_format(FORMAT, "missing [sec.ns] uptime"))?;
        let sec = integer("since_start_sec", &caps[1])?;
        let ns = integer("since_start_ns", &caps[2])?;
        let message = rest[caps[0].len()..].trim();

        let t = self.timestamps.normalize(date, TimestampFormat::Fuzzy)?;

        let mut record = StructuredRecord::new();
        record.insert(TIMESTAMP_FIELD, t);
        if let Some(host) = host {
            record.insert("host", host);
        }
        record.insert("since_start_sec", sec);
        record.insert("since_start_ns", ns);
        record.insert("message", message);
        Ok(record)
    }
}

fn integer(field: &str, digits: &str) -> Result<i64, ParseError> {
    digits
        .parse()
        .map_err(|_| ParseError::numeric(field, digits))
}

impl LogParser for KernelParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        self.parse_line(line).into()
    }
}
