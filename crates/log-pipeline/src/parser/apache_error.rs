//! Apache httpd 2.x 에러 로그 파서
//!
//! # 형식
//! ```text
//! [date] [level] [pid N[:tid M]] [client addr] message
//! [Wed Oct 11 14:32:52.123456 2023] [core:error] [pid 35708:tid 4328636416] [client 72.15.99.187] File does not exist: /usr/local/apache2/htdocs/favicon.ico
//! ```
//!
//! 출력 필드: `t`, `level`, `pid`, `tid`(있을 때), `client`(있을 때), `message`

use lognorm_core::error::ParseError;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{ParseOutcome, StructuredRecord, TIMESTAMP_FIELD};

use crate::timestamp::{TimestampFormat, TimestampNormalizer};

const FORMAT: &str = "apache_error";

/// Apache 에러 로그 파서
#[derive(Debug, Clone, Default)]
pub struct ApacheErrorParser {
    timestamps: TimestampNormalizer,
}

impl ApacheErrorParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 타임스탬프 정규화기를 바꿉니다.
    pub fn with_normalizer(mut self, timestamps: TimestampNormalizer) -> Self {
        self.timestamps = timestamps;
        self
    }

    fn parse_line(&self, line: &str) -> Result<StructuredRecord, ParseError> {
        let mut parts = line.splitn(4, "] ");
        let (Some(date), Some(level), Some(pid), Some(rest)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::not_this_format(
                FORMAT,
                "fewer than four '] '-separated parts",
            ));
        };

        let t = self
            .timestamps
            .normalize(&date.replace('[', ""), TimestampFormat::ErrorLog)?;

        let mut record = StructuredRecord::new();
        record.insert(TIMESTAMP_FIELD, t);
        record.insert("level", level.replace('[', ""));

        match pid.split_once(':') {
            Some((pid, tid)) => {
                record.insert("pid", numeric("pid", pid.replace("[pid ", ""))?);
                record.insert("tid", numeric("tid", tid.replace("tid ", ""))?);
            }
            None => {
                record.insert("pid", numeric("pid", pid.replace("[pid ", ""))?);
            }
        }

        match rest
            .starts_with("[client")
            .then(|| rest.split_once("] "))
            .flatten()
        {
            Some((client, message)) => {
                record.insert("client", client.replace("[client ", ""));
                record.insert("message", message);
            }
            None => {
                record.insert("message", rest);
            }
        }

        Ok(record)
    }
}

fn numeric(field: &str, text: String) -> Result<i64, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::numeric(field, trimmed));
    }
    trimmed
        .parse()
        .map_err(|_| ParseError::numeric(field, trimmed))
}

impl LogParser for ApacheErrorParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&self, line: &str) -> ParseOutcome {
        self.parse_line(line).into()
    }
}
