use std::sync::Arc;

use olg_core::{Economy, EconomyConfig, EquilibriumJob, EquilibriumTrigger, Notification};
use tokio::sync::{Mutex, broadcast, mpsc};

const NOTIFICATION_CAPACITY: usize = 1024;

/// Shared handle given to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) economy: Arc<Mutex<Economy>>,
    notify_tx: broadcast::Sender<Notification>,
    jobs_tx: mpsc::UnboundedSender<EquilibriumJob>,
}

impl AppState {
    /// Build the state and start its equilibrium worker. Must be called
    /// inside a tokio runtime.
    pub fn new(config: EconomyConfig) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let economy = Arc::new(Mutex::new(Economy::new(config)));

        tokio::spawn(run_equilibrium_worker(
            Arc::clone(&economy),
            notify_tx.clone(),
            jobs_rx,
        ));

        Self {
            economy,
            notify_tx,
            jobs_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        publish(&self.notify_tx, notification);
    }

    /// Queue a background solve. Jobs are solved in the order submitted.
    pub fn submit(&self, job: Option<EquilibriumJob>) {
        if let Some(job) = job {
            tracing::debug!(
                round = job.round,
                generation = job.generation,
                "queueing equilibrium"
            );
            if self.jobs_tx.send(job).is_err() {
                tracing::error!("equilibrium worker has stopped; job dropped");
            }
        }
    }
}

fn publish(tx: &broadcast::Sender<Notification>, notification: Notification) {
    let name = notification.name();
    // No subscribers is fine: nobody is watching yet.
    if tx.send(notification).is_err() {
        tracing::trace!(event = name, "no listeners for notification");
    }
}

/// Drop policy solves that a later job in the same batch has overtaken.
/// Every round solve is kept: each one fills in its own history record.
fn coalesce(batch: Vec<EquilibriumJob>) -> Vec<EquilibriumJob> {
    let last = batch.len().saturating_sub(1);
    batch
        .into_iter()
        .enumerate()
        .filter(|(i, job)| *i == last || job.trigger == EquilibriumTrigger::RoundAdvance)
        .map(|(_, job)| job)
        .collect()
}

/// Solve queued jobs one at a time, in order, off the async threads.
async fn run_equilibrium_worker(
    economy: Arc<Mutex<Economy>>,
    notify_tx: broadcast::Sender<Notification>,
    mut jobs: mpsc::UnboundedReceiver<EquilibriumJob>,
) {
    while let Some(first) = jobs.recv().await {
        let mut batch = vec![first];
        while let Ok(job) = jobs.try_recv() {
            batch.push(job);
        }

        for job in coalesce(batch) {
            let round = job.round;
            let solution = match tokio::task::spawn_blocking(move || job.solve()).await {
                Ok(solution) => solution,
                Err(err) => {
                    tracing::error!(
                        round,
                        error = %err,
                        "equilibrium solve failed; keeping last rate"
                    );
                    continue;
                }
            };

            let notification = economy.lock().await.apply_equilibrium(solution);
            if let Some(notification) = notification {
                publish(&notify_tx, notification);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use olg_core::LoanMarket;

    use super::*;

    fn job(generation: u64, trigger: EquilibriumTrigger) -> EquilibriumJob {
        EquilibriumJob {
            epoch: 0,
            generation,
            round: generation,
            trigger,
            market: LoanMarket::default(),
            prior_rate: 0.03,
        }
    }

    #[test]
    fn coalesce_keeps_every_round_solve() {
        use EquilibriumTrigger::{PolicyUpdate, RoundAdvance};

        let batch = vec![
            job(1, RoundAdvance),
            job(2, PolicyUpdate),
            job(3, PolicyUpdate),
            job(4, RoundAdvance),
            job(5, PolicyUpdate),
        ];
        let kept: Vec<u64> = coalesce(batch).iter().map(|j| j.generation).collect();
        assert_eq!(kept, vec![1, 4, 5]);

        let kept: Vec<u64> = coalesce(vec![job(1, RoundAdvance), job(2, RoundAdvance)])
            .iter()
            .map(|j| j.generation)
            .collect();
        assert_eq!(kept, vec![1, 2]);
        assert!(coalesce(Vec::new()).is_empty());
    }
}
