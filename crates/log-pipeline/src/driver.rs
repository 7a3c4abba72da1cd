//! 스트림 드라이버 -- 한 소스 스트림의 라인을 순서대로 레코드로 변환합니다.
//!
//! [`StreamDriver`]는 스트림 하나의 파서, 선택적 보강기, 통계를 소유합니다.
//! 라인 사이에 상태를 공유하지 않으며, 스킵은 카운트와 로그로만 남기고
//! 호출자에게 에러로 올리지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! let mut driver = StreamDriver::new("kern", parser);
//! if let Some(record) = driver.process_line(line) {
//!     println!("{}", record.to_json_line()?);
//! }
//! ```

use std::sync::Arc;

use lognorm_core::error::ParseError;
use lognorm_core::metrics as m;
use lognorm_core::pipeline::LogParser;
use lognorm_core::types::{ParseOutcome, SourceType, StructuredRecord};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::StreamSpec;
use crate::enricher::{self, KeyValueEnricher};
use crate::error::LogPipelineError;
use crate::parser::{FormatParser, ParserRegistry};

/// 기본 최대 라인 길이 (바이트)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// 스트림 처리 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// 읽은 라인 수
    pub processed: u64,
    /// 출력한 레코드 수
    pub emitted: u64,
    /// 스킵한 라인 수
    pub skipped: u64,
    /// 보강 실패 수 (레코드는 보강 없이 출력됨)
    pub enrich_failures: u64,
}

impl StreamStats {
    /// 다른 통계를 더합니다.
    pub fn merge(&mut self, other: &StreamStats) {
        self.processed += other.processed;
        self.emitted += other.emitted;
        self.skipped += other.skipped;
        self.enrich_failures += other.enrich_failures;
    }
}

/// 스트림 드라이버
#[derive(Debug)]
pub struct StreamDriver {
    name: String,
    parser: Arc<FormatParser>,
    enricher: Option<KeyValueEnricher>,
    max_line_length: usize,
    stats: StreamStats,
}

impl StreamDriver {
    /// 파서로 드라이버를 생성합니다 (보강 없음).
    pub fn new(name: impl Into<String>, parser: Arc<FormatParser>) -> Self {
        Self {
            name: name.into(),
            parser,
            enricher: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            stats: StreamStats::default(),
        }
    }

    /// 스트림 설정과 레지스트리로 드라이버를 생성합니다.
    pub fn from_spec(
        spec: &StreamSpec,
        registry: &ParserRegistry,
        max_line_length: usize,
    ) -> Result<Self, LogPipelineError> {
        let parser = registry.bind(spec.source_type, spec.normalizer())?;
        let mut driver = Self::new(spec.name.clone(), Arc::new(parser))
            .with_max_line_length(max_line_length);
        if let Some(config) = &spec.enrich {
            driver = driver.with_enricher(KeyValueEnricher::new(config.clone()));
        }
        Ok(driver)
    }

    /// key=value 보강기를 설정합니다.
    pub fn with_enricher(mut self, enricher: KeyValueEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// 스트림 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 이 스트림의 소스 유형을 반환합니다.
    pub fn source_type(&self) -> SourceType {
        self.parser.source_type()
    }

    /// 현재까지의 통계를 반환합니다.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// 라인 하나를 처리합니다. 스킵이면 `None`을 반환합니다.
    pub fn process_line(&mut self, line: &str) -> Option<StructuredRecord> {
        if line.len() > self.max_line_length {
            self.skip(ParseError::TooLarge {
                size: line.len(),
                max: self.max_line_length,
            });
            return None;
        }

        let format = self.source_type().as_str();
        self.stats.processed += 1;
        metrics::counter!(m::LINES_PROCESSED_TOTAL, m::LABEL_FORMAT => format).increment(1);

        let mut record = match self.parser.parse(line) {
            ParseOutcome::Record(record) => record,
            ParseOutcome::Skip(reason) => {
                self.count_skip(&reason);
                return None;
            }
        };

        if let Some(enricher) = &self.enricher {
            // 실패하면 apply가 레코드를 건드리지 않음
            if let Err(e) = enricher.apply(&mut record) {
                self.stats.enrich_failures += 1;
                enricher::report_failure(&e);
            }
        }

        self.stats.emitted += 1;
        metrics::counter!(m::RECORDS_EMITTED_TOTAL, m::LABEL_FORMAT => format).increment(1);
        Some(record)
    }

    /// 파싱 전에 거른 라인을 처리 수와 스킵 수에 함께 반영합니다.
    fn skip(&mut self, reason: ParseError) {
        self.stats.processed += 1;
        metrics::counter!(m::LINES_PROCESSED_TOTAL, m::LABEL_FORMAT => self.source_type().as_str())
            .increment(1);
        self.count_skip(&reason);
    }

    fn count_skip(&mut self, reason: &ParseError) {
        let format = self.source_type().as_str();
        self.stats.skipped += 1;
        debug!(
            stream = %self.name,
            format,
            reason = reason.kind(),
            error = %reason,
            "line skipped"
        );
        metrics::counter!(
            m::LINES_SKIPPED_TOTAL,
            m::LABEL_FORMAT => format,
            m::LABEL_REASON => reason.kind()
        )
        .increment(1);
    }

    /// 입력에서 라인을 순서대로 읽어 레코드를 `sink`로 보냅니다.
    ///
    /// EOF 또는 취소 시 라인 사이에서 멈추고 최종 통계를 반환합니다.
    /// 잘못된 UTF-8은 대체 문자로 바꿔 처리합니다. 한 라인은 최대 길이까지만
    /// 버퍼에 담고, 넘치는 나머지는 버린 뒤 [`ParseError::TooLarge`]로 스킵합니다.
    pub async fn run<R>(
        mut self,
        mut reader: R,
        sink: mpsc::Sender<StructuredRecord>,
        cancel: CancellationToken,
    ) -> Result<StreamStats, LogPipelineError>
    where
        R: AsyncBufRead + Unpin,
    {
        info!(stream = %self.name, format = self.source_type().as_str(), "stream started");
        let mut buf = Vec::new();
        let max = self.max_line_length;

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(stream = %self.name, "stream cancelled");
                    break;
                }
                result = read_bounded_line(&mut reader, &mut buf, max) => {
                    result.map_err(|e| LogPipelineError::Stream {
                        stream: self.name.clone(),
                        reason: e.to_string(),
                    })?
                }
            };

            match read {
                LineRead::Eof => break,
                LineRead::TooLarge(size) => {
                    self.skip(ParseError::TooLarge { size, max });
                    continue;
                }
                LineRead::Line => {}
            }

            let text = String::from_utf8_lossy(&buf);
            let Some(record) = self.process_line(text.trim()) else {
                continue;
            };

            if sink.send(record).await.is_err() {
                return Err(LogPipelineError::Channel(format!(
                    "record receiver for stream '{}' closed",
                    self.name
                )));
            }
        }

        info!(
            stream = %self.name,
            processed = self.stats.processed,
            emitted = self.stats.emitted,
            skipped = self.stats.skipped,
            enrich_failures = self.stats.enrich_failures,
            "stream finished"
        );
        Ok(self.stats)
    }
}

/// 길이 제한을 둔 라인 읽기 결과
enum LineRead {
    Eof,
    Line,
    /// 제한을 넘은 라인 (버린 바이트 포함 전체 크기)
    TooLarge(usize),
}

/// `max` 바이트(+ 줄바꿈 `\r\n`)까지만 `buf`에 읽습니다.
///
/// 제한을 넘으면 다음 줄바꿈까지 나머지를 버퍼링 없이 건너뜁니다.
async fn read_bounded_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let limit = max.saturating_add(2) as u64;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.last() == Some(&b'\n') || (read as u64) < limit {
        return Ok(LineRead::Line);
    }

    let mut size = read;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                size += pos + 1;
                break;
            }
            None => {
                let len = available.len();
                reader.consume(len);
                size += len;
            }
        }
    }
    Ok(LineRead::TooLarge(size))
}
