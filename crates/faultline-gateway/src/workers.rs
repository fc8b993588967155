// faultline-gateway/src/workers.rs
// ============================================================================
// Module: Gateway Workers
// Description: Supervised background loops and the enrichment trigger.
// Purpose: Run the alert evaluator on a tick with explicit shutdown, and
//          spawn detached enrichment tasks.
// Dependencies: faultline-core, tokio, tracing
// ============================================================================

//! ## Overview
//! The alert evaluator runs as a supervised loop: every tick executes inside
//! its own task so a panicking evaluation is caught, logged, and the loop
//! continues; that is the whole restart policy. Shutdown is explicit through a
//! watch channel; dropping the handle stops the loop at the next tick
//! boundary. The enrichment spawner implements the orchestrator's
//! fire-and-forget seam by detaching a generation task per incident; a
//! spawn or generation failure never reaches the creating request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use faultline_core::AlertEvaluator;
use faultline_core::HypothesisEngine;
use faultline_core::Incident;
use faultline_core::Timestamp;
use faultline_core::interfaces::EnrichmentTrigger;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Evaluator Worker
// ============================================================================

/// Handle controlling the evaluator loop.
pub struct EvaluatorWorker {
    /// Shutdown signal sender; closing it stops the loop.
    shutdown: watch::Sender<bool>,
    /// Join handle for the loop task.
    handle: JoinHandle<()>,
}

impl EvaluatorWorker {
    /// Starts the supervised evaluator loop.
    #[must_use]
    pub fn start(evaluator: Arc<AlertEvaluator>, tick_interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_supervised_tick(&evaluator).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("alert evaluator stopping");
                            break;
                        }
                    }
                }
            }
        });
        Self { shutdown, handle }
    }

    /// Requests shutdown and waits for the loop to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

/// Runs one tick inside its own task, surviving panics.
async fn run_supervised_tick(evaluator: &Arc<AlertEvaluator>) {
    let evaluator = Arc::clone(evaluator);
    let tick = tokio::spawn(async move { evaluator.run_tick(Timestamp::now()).await });
    match tick.await {
        Ok(Ok(summary)) => {
            if summary.fired > 0 || summary.resolved > 0 || summary.failed > 0 {
                info!(
                    evaluated = summary.evaluated,
                    fired = summary.fired,
                    resolved = summary.resolved,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "alert tick"
                );
            }
        }
        Ok(Err(err)) => warn!(error = %err, "alert tick failed"),
        // A panicking tick is logged and the loop restarts on schedule.
        Err(err) => warn!(error = %err, "alert tick panicked; restarting on next interval"),
    }
}

// ============================================================================
// SECTION: Enrichment Trigger
// ============================================================================

/// Fire-and-forget enrichment trigger backed by detached tasks.
pub struct EnrichmentSpawner {
    /// Shared hypothesis engine.
    engine: Arc<HypothesisEngine>,
}

impl EnrichmentSpawner {
    /// Builds a spawner over the engine.
    #[must_use]
    pub const fn new(engine: Arc<HypothesisEngine>) -> Self {
        Self { engine }
    }
}

impl EnrichmentTrigger for EnrichmentSpawner {
    fn trigger(&self, incident: &Incident) {
        let engine = Arc::clone(&self.engine);
        let project_id = incident.project_id.clone();
        let incident_id = incident.id.clone();
        // Detached: generation failure must never fail incident creation.
        drop(tokio::spawn(async move {
            if let Err(err) = engine.generate(&project_id, &incident_id).await {
                warn!(incident = %incident_id, error = %err, "background enrichment failed");
            }
        }));
    }
}
