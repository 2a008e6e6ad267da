//! Operator overrides for in-flight judgments.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorAction {
    /// Re-issue the same judgment call (scores are not recomputed).
    Retry,
    /// Give up on the item; it is rejected as skipped.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCommand {
    /// Target document, or `None` for whatever is being judged.
    pub doc_id: Option<String>,
    pub action: OperatorAction,
}

/// Creates a connected control handle and inbox.
pub fn operator_channel() -> (OperatorControl, OverrideInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        OperatorControl { tx },
        OverrideInbox {
            rx,
            parked: Vec::new(),
        },
    )
}

#[derive(Debug, Clone)]
/// Cloneable handle an operator-facing surface uses to send overrides.
pub struct OperatorControl {
    tx: mpsc::UnboundedSender<OperatorCommand>,
}

impl OperatorControl {
    /// Sends `action` for the current judgment. Returns `false` if the pipeline is gone.
    pub fn send(&self, action: OperatorAction) -> bool {
        self.tx
            .send(OperatorCommand {
                doc_id: None,
                action,
            })
            .is_ok()
    }

    /// Sends `action` for a specific document only.
    pub fn send_for(&self, doc_id: impl Into<String>, action: OperatorAction) -> bool {
        self.tx
            .send(OperatorCommand {
                doc_id: Some(doc_id.into()),
                action,
            })
            .is_ok()
    }

    pub fn retry(&self) -> bool {
        self.send(OperatorAction::Retry)
    }

    pub fn skip(&self) -> bool {
        self.send(OperatorAction::Skip)
    }
}

#[derive(Debug)]
/// Receiving side, owned by the orchestrator.
///
/// Commands aimed at a document other than the one being judged are parked
/// until that document comes up.
pub struct OverrideInbox {
    rx: mpsc::UnboundedReceiver<OperatorCommand>,
    parked: Vec<OperatorCommand>,
}

impl OverrideInbox {
    /// Drops untargeted commands that arrived while nothing was being judged.
    ///
    /// Targeted commands are parked instead. Returns the number dropped.
    pub fn drain_stale(&mut self) -> usize {
        let mut dropped = 0;
        while let Ok(command) = self.rx.try_recv() {
            if command.doc_id.is_some() {
                self.park(command);
            } else {
                dropped += 1;
            }
        }
        dropped
    }

    /// Number of targeted commands waiting for their document.
    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    /// Waits for the next command that applies to `doc_id`.
    ///
    /// Parked commands for `doc_id` are returned first, oldest first. Never
    /// resolves once every [`OperatorControl`] has been dropped.
    pub async fn next_for(&mut self, doc_id: &str) -> OperatorAction {
        if let Some(position) = self
            .parked
            .iter()
            .position(|command| command.doc_id.as_deref() == Some(doc_id))
        {
            return self.parked.remove(position).action;
        }

        loop {
            match self.rx.recv().await {
                Some(command) => {
                    if command
                        .doc_id
                        .as_deref()
                        .is_some_and(|target| target != doc_id)
                    {
                        self.park(command);
                    } else {
                        return command.action;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn park(&mut self, command: OperatorCommand) {
        debug!(
            doc_id = command.doc_id.as_deref().unwrap_or_default(),
            action = ?command.action,
            "Parking operator command for a later document"
        );
        self.parked.push(command);
    }
}
