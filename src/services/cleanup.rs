use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{clock::Clock, services::recommendations::RecommendationService};

/// Stops the sweeper task
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Recommendation sweeper panicked");
        }
        tracing::info!("Recommendation sweeper stopped");
    }
}

/// Periodically deletes read recommendations older than `retention`
pub struct RecommendationSweeper {
    mailbox: RecommendationService,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
}

impl RecommendationSweeper {
    pub fn new(
        mailbox: RecommendationService,
        clock: Arc<dyn Clock>,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            mailbox,
            clock,
            retention,
        }
    }

    /// Runs one sweep, returning how many records were removed
    pub async fn run_once(&self) -> u64 {
        let cutoff = self.clock.now() - self.retention;
        match self.mailbox.sweep(cutoff).await {
            Ok(deleted) => {
                if deleted > 0 {
                    tracing::info!(deleted, %cutoff, "Swept read recommendations");
                }
                deleted
            }
            Err(e) => {
                tracing::error!(error = %e, "Recommendation sweep failed");
                0
            }
        }
    }

    /// Spawns the sweeper on a fixed interval; the first sweep runs immediately
    pub fn spawn(self, every: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval_secs = every.as_secs(), "Recommendation sweeper started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.run_once().await;
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        SweeperHandle { shutdown_tx, task }
    }
}
