//! 事件来源与监听注册

pub mod registry;

use crate::{
    error::{LedgerError, Result},
    events::LedgerEvent,
};
use async_trait::async_trait;
use std::{collections::VecDeque, path::Path};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::info;

pub use registry::{ListenerRegistry, TierSubscription, TIER_EVENTS};

/// 按链上顺序逐个产出事件
#[async_trait]
pub trait EventSource: Send {
    /// 下一个事件，事件流结束时返回 None
    async fn next_event(&mut self) -> Result<Option<LedgerEvent>>;
}

/// 从 JSON 行读取事件（每行一个事件，空行和 `#` 开头的行被忽略）
pub struct JsonLinesEventSource<R> {
    lines: LinesStream<R>,
    line_no: usize,
}

impl JsonLinesEventSource<BufReader<tokio::fs::File>> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| LedgerError::EventSource(format!("无法打开事件文件 {}: {}", path.display(), e)))?;
        info!("📂 从 {} 读取事件", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LinesStream::new(reader.lines()),
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for JsonLinesEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<LedgerEvent>> {
        while let Some(line) = self.lines.next().await {
            self.line_no += 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let event = serde_json::from_str(trimmed)
                .map_err(|e| LedgerError::EventSource(format!("第 {} 行解析失败: {}", self.line_no, e)))?;
            return Ok(Some(event));
        }
        Ok(None)
    }
}

/// 内存中的事件序列
#[derive(Debug, Default)]
pub struct VecEventSource {
    events: VecDeque<LedgerEvent>,
}

impl VecEventSource {
    pub fn new(events: impl IntoIterator<Item = LedgerEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

#[async_trait]
impl EventSource for VecEventSource {
    async fn next_event(&mut self) -> Result<Option<LedgerEvent>> {
        Ok(self.events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_lines_skip_blank_and_comment_lines() {
        let input = br#"# backfill
{"event":"referrer_updated","subject_account":"domob","new_referrer":"referrer","timestamp":10}

{"event":"sale_paused","tier_address":"0xabc"}
"#;
        let mut source = JsonLinesEventSource::new(&input[..]);

        let first = source.next_event().await.unwrap().unwrap();
        assert_eq!(first.event_type(), "referrer_updated");
        let second = source.next_event().await.unwrap().unwrap();
        assert_eq!(second.event_type(), "sale_paused");
        assert!(source.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_reports_line_number() {
        let input = b"{\"event\":\"sale_paused\",\"tier_address\":\"0xabc\"}\n{not json}\n";
        let mut source = JsonLinesEventSource::new(&input[..]);

        assert!(source.next_event().await.unwrap().is_some());
        let err = source.next_event().await.unwrap_err();
        assert!(err.to_string().contains("第 2 行"));
    }
}
