//! 파이프라인 오케스트레이션 -- 여러 소스 스트림을 동시에 정규화합니다.
//!
//! 스트림마다 하나의 tokio 태스크가 [`StreamDriver`]를 실행합니다. 한 스트림 안에서는
//! 라인 순서가 보존되고, 스트림 사이의 순서는 보장하지 않습니다. 모든 태스크는
//! 불변 [`ParserRegistry`]를 `Arc`로 공유하며, 공유 [`CancellationToken`]으로
//! 라인 사이에서 멈춥니다.
//!
//! # 내부 아키텍처
//! ```text
//! reader(stream 1) -> StreamDriver -> \
//! reader(stream 2) -> StreamDriver ->  mpsc -> downstream
//! reader(stream N) -> StreamDriver -> /
//! ```

use std::sync::Arc;

use lognorm_core::metrics as m;
use lognorm_core::types::StructuredRecord;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{PipelineConfig, StreamSpec};
use crate::driver::{StreamDriver, StreamStats};
use crate::error::LogPipelineError;
use crate::parser::ParserRegistry;

/// 스트림 태스크의 실행 결과
#[derive(Debug)]
pub struct StreamReport {
    /// 스트림 이름
    pub name: String,
    /// 최종 통계 또는 스트림 실패 사유
    pub outcome: Result<StreamStats, LogPipelineError>,
}

/// 모든 스트림의 실행 결과
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// 스트림별 결과 (생성 순서)
    pub streams: Vec<StreamReport>,
}

impl PipelineReport {
    /// 성공한 스트림들의 통계 합계를 반환합니다.
    pub fn total(&self) -> StreamStats {
        let mut total = StreamStats::default();
        for stats in self.streams.iter().filter_map(|s| s.outcome.as_ref().ok()) {
            total.merge(stats);
        }
        total
    }

    /// 실패한 스트림 수를 반환합니다.
    pub fn failed(&self) -> usize {
        self.streams.iter().filter(|s| s.outcome.is_err()).count()
    }
}

/// 정규화 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use lognorm_log_pipeline::{LogPipelineBuilder, StreamSpec};
/// use lognorm_core::types::SourceType;
///
/// let (mut pipeline, mut records) = LogPipelineBuilder::new().build()?;
/// pipeline.spawn_stream(&StreamSpec::new("web", SourceType::Combined), reader)?;
///
/// let report = tokio::spawn(pipeline.wait());
/// while let Some(record) = records.recv().await {
///     println!("{}", record.to_json_line()?);
/// }
/// ```
pub struct LogPipeline {
    config: PipelineConfig,
    registry: Arc<ParserRegistry>,
    record_tx: mpsc::Sender<StructuredRecord>,
    cancel: CancellationToken,
    tasks: Vec<(String, JoinHandle<Result<StreamStats, LogPipelineError>>)>,
}

impl LogPipeline {
    /// 실행 중이거나 종료된 스트림 수를 반환합니다.
    pub fn stream_count(&self) -> usize {
        self.tasks.len()
    }

    /// 공유 파서 레지스트리를 반환합니다.
    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    /// 파이프라인 설정을 반환합니다.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 취소 토큰의 복제본을 반환합니다. 외부 시그널 처리에 사용합니다.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 모든 스트림에 정지를 요청합니다. 각 스트림은 현재 라인을 마친 뒤 멈춥니다.
    pub fn shutdown(&self) {
        info!(streams = self.tasks.len(), "shutting down normalization pipeline");
        self.cancel.cancel();
    }

    /// 스트림 하나를 새 태스크로 시작합니다.
    pub fn spawn_stream<R>(&mut self, spec: &StreamSpec, reader: R) -> Result<(), LogPipelineError>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let driver = StreamDriver::from_spec(spec, &self.registry, self.config.max_line_length)?;
        let sink = self.record_tx.clone();
        let cancel = self.cancel.child_token();

        let handle = tokio::spawn(async move {
            metrics::gauge!(m::ACTIVE_STREAMS).increment(1.0);
            let result = driver.run(reader, sink, cancel).await;
            metrics::gauge!(m::ACTIVE_STREAMS).decrement(1.0);
            result
        });

        self.tasks.push((spec.name.clone(), handle));
        Ok(())
    }

    /// 설정된 모든 스트림을 엽니다.
    ///
    /// 경로가 있는 스트림은 파일을, 경로가 없는 스트림은 표준 입력을 읽습니다.
    pub async fn spawn_configured(&mut self) -> Result<usize, LogPipelineError> {
        let streams = self.config.streams.clone();
        for spec in &streams {
            match &spec.path {
                Some(path) => {
                    let file = tokio::fs::File::open(path).await.map_err(|e| {
                        LogPipelineError::Stream {
                            stream: spec.name.clone(),
                            reason: format!("failed to open {}: {e}", path.display()),
                        }
                    })?;
                    self.spawn_stream(spec, BufReader::new(file))?;
                }
                None => self.spawn_stream(spec, BufReader::new(tokio::io::stdin()))?,
            }
        }
        Ok(streams.len())
    }

    /// 모든 스트림이 끝날 때까지 기다립니다.
    ///
    /// 파이프라인이 가진 송신측을 먼저 닫으므로, 모든 스트림이 끝나면
    /// 레코드 수신 채널도 닫힙니다.
    ///
    /// 스트림은 채널이 가득 차면 수신측이 비울 때까지 멈춥니다. 출력 레코드가
    /// `channel_capacity`보다 많을 수 있다면 이 future를 `tokio::spawn`으로 돌리면서
    /// 수신 채널을 동시에 비워야 합니다. 그렇지 않으면 반환되지 않습니다.
    pub async fn wait(self) -> PipelineReport {
        let Self {
            record_tx, tasks, ..
        } = self;
        drop(record_tx);

        let mut report = PipelineReport::default();
        for (name, handle) in tasks {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(LogPipelineError::Stream {
                    stream: name.clone(),
                    reason: format!("task failed: {e}"),
                }),
            };
            if let Err(e) = &outcome {
                warn!(stream = %name, error = %e, "stream ended with error");
            }
            report.streams.push(StreamReport { name, outcome });
        }
        report
    }
}

/// 정규화 파이프라인 빌더
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    registry: Option<Arc<ParserRegistry>>,
    record_tx: Option<mpsc::Sender<StructuredRecord>>,
    cancel: Option<CancellationToken>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            registry: None,
            record_tx: None,
            cancel: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 이미 컴파일된 파서 레지스트리를 공유합니다.
    pub fn registry(mut self, registry: Arc<ParserRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 외부 레코드 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn record_sender(mut self, tx: mpsc::Sender<StructuredRecord>) -> Self {
        self.record_tx = Some(tx);
        self
    }

    /// 외부 취소 토큰을 설정합니다.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `LogPipeline`: 파이프라인 인스턴스
    /// - `Option<mpsc::Receiver<StructuredRecord>>`: 레코드 수신 채널
    ///   (외부 record_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(LogPipeline, Option<mpsc::Receiver<StructuredRecord>>), LogPipelineError> {
        self.config.validate()?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(ParserRegistry::new()?),
        };

        let (record_tx, record_rx) = match self.record_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.config.channel_capacity);
                (tx, Some(rx))
            }
        };

        let pipeline = LogPipeline {
            config: self.config,
            registry,
            record_tx,
            cancel: self.cancel.unwrap_or_default(),
            tasks: Vec::new(),
        };

        Ok((pipeline, record_rx))
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lognorm_core::types::{FieldValue, SourceType};

    #[test]
    fn builder_creates_pipeline() {
        let (pipeline, rx) = LogPipelineBuilder::new().build().unwrap();
        assert_eq!(pipeline.stream_count(), 0);
        assert!(rx.is_some());
    }

    #[test]
    fn builder_with_external_sender() {
        let (tx, _rx) = mpsc::channel(10);
        let (_pipeline, rx) = LogPipelineBuilder::new().record_sender(tx).build().unwrap();
        assert!(rx.is_none());
    }

    #[test]
    fn builder_with_invalid_config_fails() {
        let config = PipelineConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(LogPipelineBuilder::new().config(config).build().is_err());
    }

    #[tokio::test]
    async fn single_stream_round_trip() {
        let (mut pipeline, rx) = LogPipelineBuilder::new().build().unwrap();
        let mut rx = rx.unwrap();
        let spec = StreamSpec::new("ws", SourceType::Whitespace);
        pipeline
            .spawn_stream(&spec, &b"GET /a 200\nnope\nGET /b 200\n"[..])
            .unwrap();

        let waiter = tokio::spawn(pipeline.wait());
        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        let report = waiter.await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(report.total().skipped, 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.streams[0].name, "ws");
    }

    #[tokio::test]
    async fn wait_completes_when_output_exceeds_channel_capacity() {
        let config = PipelineConfig {
            channel_capacity: 2,
            ..Default::default()
        };
        let (mut pipeline, rx) = LogPipelineBuilder::new().config(config).build().unwrap();
        let mut rx = rx.unwrap();
        let input: String = (0..10).map(|i| format!("GET /{i} 200\n")).collect();
        pipeline
            .spawn_stream(
                &StreamSpec::new("ws", SourceType::Whitespace),
                std::io::Cursor::new(input.into_bytes()),
            )
            .unwrap();

        let waiter = tokio::spawn(pipeline.wait());
        let mut paths = Vec::new();
        while let Some(record) = rx.recv().await {
            paths.push(record.get("path").and_then(FieldValue::as_str).map(str::to_owned));
        }
        let report = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .expect("wait should finish once the channel is drained")
            .unwrap();

        assert_eq!(paths.len(), 10);
        assert_eq!(paths[9].as_deref(), Some("/9"));
        assert_eq!(report.total().emitted, 10);
    }

    #[tokio::test]
    async fn shutdown_before_reading_stops_streams() {
        let (mut pipeline, _rx) = LogPipelineBuilder::new().build().unwrap();
        pipeline.shutdown();
        pipeline
            .spawn_stream(
                &StreamSpec::new("ws", SourceType::Whitespace),
                &b"GET / 200\n"[..],
            )
            .unwrap();
        let report = pipeline.wait().await;
        assert_eq!(report.total().processed, 0);
    }

    #[tokio::test]
    async fn missing_file_is_stream_error() {
        let config = PipelineConfig {
            streams: vec![
                StreamSpec::new("kern", SourceType::Kernel)
                    .with_path("/nonexistent/lognorm/kern.log"),
            ],
            ..Default::default()
        };
        let (mut pipeline, _rx) = LogPipelineBuilder::new().config(config).build().unwrap();
        let err = pipeline.spawn_configured().await.unwrap_err();
        assert!(matches!(err, LogPipelineError::Stream { .. }));
    }
}
