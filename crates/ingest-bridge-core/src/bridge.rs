// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Orchestrator bridge
//
// Owns the orchestrator on a single task. Frontends send messages in and
// receive a snapshot after every message is applied. Service calls run as
// separate tasks and report back through an internal channel.

use crate::orchestrator::{Message, Orchestrator, Snapshot};
use crate::service::TransferService;
use crate::types::AppError;
use async_channel::{Receiver, Sender};
use std::sync::Arc;

/// Bridge between a frontend and the orchestrator loop
pub struct OrchestratorBridge {
    message_tx: Sender<Message>,
    snapshot_rx: Receiver<Snapshot>,
}

impl OrchestratorBridge {
    /// Start the loop on the current tokio runtime
    pub fn spawn(service: Arc<dyn TransferService>) -> Self {
        let (message_tx, message_rx) = async_channel::bounded::<Message>(32);
        let (snapshot_tx, snapshot_rx) = async_channel::unbounded::<Snapshot>();

        tokio::spawn(async move {
            Self::run(service, message_rx, snapshot_tx).await;
        });

        Self {
            message_tx,
            snapshot_rx,
        }
    }

    async fn run(
        service: Arc<dyn TransferService>,
        message_rx: Receiver<Message>,
        snapshot_tx: Sender<Snapshot>,
    ) {
        let (result_tx, result_rx) = async_channel::unbounded::<Message>();
        let mut orchestrator = Orchestrator::new();

        tracing::info!("Orchestrator bridge started with {} service", service.name());
        if snapshot_tx.send(orchestrator.snapshot()).await.is_err() {
            return;
        }

        loop {
            let message = tokio::select! {
                message = message_rx.recv() => match message {
                    Ok(message) => message,
                    // Frontend went away
                    Err(_) => break,
                },
                result = result_rx.recv() => match result {
                    Ok(result) => result,
                    Err(_) => break,
                },
            };

            for effect in orchestrator.update(message) {
                let service = service.clone();
                let result_tx = result_tx.clone();
                tokio::spawn(async move {
                    let message = effect.execute(service.as_ref()).await;
                    // The loop may have stopped meanwhile
                    let _ = result_tx.send(message).await;
                });
            }

            if snapshot_tx.send(orchestrator.snapshot()).await.is_err() {
                break;
            }
        }

        tracing::info!("Orchestrator bridge stopped");
    }

    pub fn message_sender(&self) -> Sender<Message> {
        self.message_tx.clone()
    }

    pub fn snapshot_receiver(&self) -> Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    pub async fn send(&self, message: Message) -> Result<(), AppError> {
        self.message_tx
            .send(message)
            .await
            .map_err(|e| AppError::Precondition(format!("Orchestrator is not running: {}", e)))
    }
}
