//! Result feed consumers.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::error::SinkError;
use super::types::QualificationRecord;

#[async_trait]
/// Receives finalized records in finalization order.
pub trait ResultSink: Send + Sync {
    async fn accept(&self, record: QualificationRecord) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Default)]
/// Collects records in memory.
pub struct MemorySink {
    records: Arc<Mutex<Vec<QualificationRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<QualificationRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn accept(&self, record: QualificationRecord) -> Result<(), SinkError> {
        self.records.lock().push(record);
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Forwards records over a bounded channel. Applies backpressure when full.
pub struct ChannelSink {
    tx: mpsc::Sender<QualificationRecord>,
}

impl ChannelSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<QualificationRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn accept(&self, record: QualificationRecord) -> Result<(), SinkError> {
        self.tx.send(record).await.map_err(|_| SinkError::Closed)
    }
}
