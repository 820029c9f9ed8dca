use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use super::traits::TransitionNotifier;
use super::types::TransitionRecord;

/// Writes each committed transition as a structured log event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl TransitionNotifier for TracingNotifier {
    async fn notify(&self, record: &TransitionRecord) -> Result<()> {
        info!(
            record_id = %record.id,
            asset_id = %record.asset_id,
            from = %record.from_state,
            to = %record.to_state,
            performed_by = %record.performed_by,
            reason = ?record.reason,
            "Asset transition committed"
        );
        Ok(())
    }
}

/// Forwards committed transitions to an in-process consumer
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<TransitionRecord>,
}

impl ChannelNotifier {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<TransitionRecord>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl TransitionNotifier for ChannelNotifier {
    async fn notify(&self, record: &TransitionRecord) -> Result<()> {
        self.sender
            .send(record.clone())
            .await
            .map_err(|_| anyhow::anyhow!("Transition event receiver dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::AssetState;
    use chrono::Utc;
    use uuid::Uuid;

    fn record() -> TransitionRecord {
        TransitionRecord {
            id: Uuid::new_v4(),
            asset_id: "MON-77".to_string(),
            from_state: AssetState::Received,
            to_state: AssetState::InStaging,
            timestamp: Utc::now(),
            performed_by: "alice".to_string(),
            reason: None,
            wipe_certificate_id: None,
        }
    }

    #[tokio::test]
    async fn test_channel_notifier_forwards_records() {
        let (notifier, mut receiver) = ChannelNotifier::new(4);
        let record = record();
        notifier.notify(&record).await.unwrap();
        assert_eq!(receiver.recv().await, Some(record));
    }

    #[tokio::test]
    async fn test_channel_notifier_errors_when_receiver_dropped() {
        let (notifier, receiver) = ChannelNotifier::new(1);
        drop(receiver);
        assert!(notifier.notify(&record()).await.is_err());
    }
}
