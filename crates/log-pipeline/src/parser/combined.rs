//! Apache/Nginx "combined" 접근 로그 파서
//!
//! # 형식
//! ```text
//! host ident user [timestamp] "METHOD path PROTO" status size "referer" "user-agent"
//! 127.0.0.1 - frank [10/Oct/2023:13:55:36 -0700] "GET /a.gif HTTP/1.0" 200 2326 "http://x/" "Mozilla/4.08"
//! ```
//!
//! 출력 필드: `host`, `user`(`-`가 아닐 때), `t`, `method`, `path`, `proto`,
//! `status`, `size`, `ref`(`-`가 아닐 때), `user_agent`

use lognorm_core::error::ParseError;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{ParseOutcome, StructuredRecord, TIMESTAMP_FIELD};
use regex::Regex;

use crate::error::LogPipelineError;
use crate::timestamp::{ACCESS_LOG_PATTERN, TimestampFormat, TimestampNormalizer};

const FORMAT: &str = "combined";

/// combined 접근 로그 파서
#[derive(Debug, Clone)]
pub struct CombinedParser {
    /// `[timestamp] "request" status size "referer" "user-agent"` 부분
    request: Regex,
    timestamps: TimestampNormalizer,
}

impl CombinedParser {
    /// 문법을 컴파일하여 새 파서를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        Ok(Self {
            request: Regex::new(
                r#"^\[(.+)\] "([A-Z]+) (.+) (.+)" (\d+) (\d+) "(.+)" "(.+)""#,
            )?,
            timestamps: TimestampNormalizer::default(),
        })
    }

    /// 타임스탬프 정규화기를 바꿉니다.
    pub fn with_normalizer(mut self, timestamps: TimestampNormalizer) -> Self {
        self.timestamps = timestamps;
        self
    }

    fn parse_line(&self, line: &str) -> Result<StructuredRecord, ParseError> {
        let mut parts = line.splitn(4, ' ');
        let (Some(host), Some(_ident), Some(user), Some(rest)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::not_this_format(
                FORMAT,
                "fewer than four space-separated parts",
            ));
        };

        let caps = self
            .request
            .captures(rest)
            .ok_or_else(|| ParseError::not_this_format(FORMAT, "request section does not match"))?;

        let t = self
            .timestamps
            .normalize(&caps[1], TimestampFormat::Strict(ACCESS_LOG_PATTERN))?;
        let status: i64 = caps[5]
            .parse()
            .map_err(|_| ParseError::numeric("status", &caps[5]))?;
        let size: i64 = caps[6]
            .parse()
            .map_err(|_| ParseError::numeric("size", &caps[6]))?;

        let mut record = StructuredRecord::new();
        record.insert("host", host);
        if user != "-" {
            record.insert("user", user);
        }
        record.insert(TIMESTAMP_FIELD, t);
        record.insert("method", &caps[2]);
        record.insert("path", &caps[3]);
        record.insert("proto", caps[4].replace("HTTP/", ""));
        record.insert("status", status);
        record.insert("size", size);
        if &caps[7] != "-" {
            record.insert("ref", &caps[7]);
        }
        record.insert("user_agent", &caps[8]);
        Ok(record)
    }
}

impl LogParser for CombinedParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        self.parse_line(line).into()
    }
}
