use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use eduplan_billing::{EntryAction, PLAN_AGGREGATE_TYPE, PlanEvent};
use eduplan_events::{EventBus, EventEnvelope, Subscription};

use crate::config::BillingConfig;
use crate::notifier::UserNotifier;

#[derive(Debug, Error)]
pub enum NoticeError {
    #[error("undecodable plan event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("notice delivery failed: {0}")]
    Delivery(#[source] anyhow::Error),
}

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Sends the blocked notice once a `blocked` transition has been committed.
///
/// Runs off the request path: the plan is already blocked when the event
/// arrives, and a delivery failure is logged without touching plan state.
/// Delivery is at-least-once; the notifier may see duplicates.
#[derive(Debug)]
pub struct BlockedNoticeWorker;

impl BlockedNoticeWorker {
    /// The worker stops on `shutdown` or once the bus is dropped.
    pub fn spawn<B, N>(config: &BillingConfig, bus: &B, notifier: N) -> std::io::Result<WorkerHandle>
    where
        B: EventBus<EventEnvelope<JsonValue>> + ?Sized,
        N: UserNotifier + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();
        let name = config.notice_worker_name.clone();
        let tick = config.notice_worker_tick;

        let join = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(&name, tick, sub, shutdown_rx, &notifier))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<N: UserNotifier>(
    name: &str,
    tick: Duration,
    sub: Subscription<EventEnvelope<JsonValue>>,
    shutdown_rx: mpsc::Receiver<()>,
    notifier: &N,
) {
    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => {
                if let Err(err) = handle_envelope(notifier, &envelope) {
                    warn!(
                        worker = name,
                        event_id = %envelope.event_id(),
                        error = %err,
                        "blocked notice failed"
                    );
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Process one envelope. Returns whether a notice was sent.
///
/// Envelopes of other aggregates and plan events without an entry action are
/// skipped. A blocked plan without an owner has nobody to notify.
pub fn handle_envelope<N>(notifier: &N, envelope: &EventEnvelope<JsonValue>) -> Result<bool, NoticeError>
where
    N: UserNotifier + ?Sized,
{
    if envelope.aggregate_type() != PLAN_AGGREGATE_TYPE {
        return Ok(false);
    }

    let event: PlanEvent = envelope.decode()?;
    let Some(EntryAction::SendBlockedNotice) = event.entry_action() else {
        return Ok(false);
    };
    let PlanEvent::Blocked(changed) = event else {
        return Ok(false);
    };

    let Some(user_id) = changed.user_id else {
        warn!(plan_id = %changed.plan_id, "blocked plan has no owner; notice skipped");
        return Ok(false);
    };

    notifier
        .send_blocked_notice(user_id, changed.plan_id)
        .map_err(NoticeError::Delivery)?;
    debug!(plan_id = %changed.plan_id, %user_id, "blocked notice delivered");
    Ok(true)
}
