//! Background workers for checks that run when a value is dropped.
//!
//! Jobs are handed to an idle worker over a rendezvous channel. When no
//! worker is waiting a new one is spawned; workers exit after
//! [`IDLE_TIMEOUT`] without work.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

/// How long an idle worker waits for a job before exiting.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

const WORKER_NAME: &str = "immcheck-reclaim";

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

struct Reclaimer {
    sender: SyncSender<Job>,
    receiver: Arc<Mutex<Receiver<Job>>>,
}

fn reclaimer() -> &'static Reclaimer {
    static RECLAIMER: OnceLock<Reclaimer> = OnceLock::new();
    RECLAIMER.get_or_init(|| {
        let (sender, receiver) = sync_channel(0);
        Reclaimer {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    })
}

/// Run `job` on a reclamation worker.
pub(crate) fn submit(job: Job) {
    let reclaimer = reclaimer();
    match reclaimer.sender.try_send(job) {
        Ok(()) => {}
        Err(TrySendError::Full(job)) => spawn_worker(job, Arc::clone(&reclaimer.receiver)),
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!("reclamation channel closed, dropping check");
        }
    }
}

fn spawn_worker(first: Job, receiver: Arc<Mutex<Receiver<Job>>>) {
    let spawned = thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(move || {
            tracing::debug!("reclamation worker started");
            first();
            loop {
                let next = match receiver.try_lock_for(IDLE_TIMEOUT) {
                    Some(receiver) => receiver.recv_timeout(IDLE_TIMEOUT).ok(),
                    None => None,
                };
                match next {
                    Some(job) => job(),
                    None => break,
                }
            }
            tracing::debug!("reclamation worker idle, exiting");
        });

    if let Err(e) = spawned {
        tracing::warn!("failed to spawn reclamation worker, dropping check: {}", e);
    }
}
