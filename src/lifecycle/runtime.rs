//! Single-threaded event loop around a [`LifecycleController`].

use super::controller::{LifecycleController, LifecyclePhase};
use super::session::HighPowerSession;
use crate::error::{Error, Result};
use crate::types::{PresenceState, SessionState};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info};

/// Events delivered to the lifecycle thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceEvent {
    Connect,
    Disconnect,
    Shutdown,
}

/// Snapshot of the controller, published after every processed event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifecycleStatus {
    pub phase: LifecyclePhase,
    pub presence: PresenceState,
    pub session: SessionState,

    /// Most recent transition failure, if any.
    pub last_error: Option<String>,

    /// Presence events and timer expirations handled so far.
    pub events_processed: u64,
}

/// Spawns the lifecycle thread.
pub struct LifecycleRuntime;

impl LifecycleRuntime {
    /// Move `controller` onto a dedicated thread and return a handle to it.
    ///
    /// Presence events and grace expirations are handled strictly in order on
    /// that thread; a slow `start`/`stop` delays the events queued behind it.
    pub fn spawn<S>(controller: LifecycleController<S>) -> Result<LifecycleHandle>
    where
        S: HighPowerSession + 'static,
    {
        let (sender, receiver) = unbounded();
        let status = Arc::new(RwLock::new(LifecycleStatus {
            phase: controller.phase(),
            presence: controller.presence(),
            session: controller.session_state(),
            ..Default::default()
        }));

        let thread_status = Arc::clone(&status);
        let thread = thread::Builder::new()
            .name("lifecycle".to_string())
            .spawn(move || run(controller, receiver, thread_status))?;

        Ok(LifecycleHandle {
            sender,
            status,
            thread: Some(thread),
        })
    }
}

/// Handle for feeding presence events to the lifecycle thread.
///
/// Dropping the handle shuts the thread down, stopping an active session.
pub struct LifecycleHandle {
    sender: Sender<PresenceEvent>,
    status: Arc<RwLock<LifecycleStatus>>,
    thread: Option<JoinHandle<()>>,
}

impl LifecycleHandle {
    pub fn on_connect(&self) -> Result<()> {
        self.send(PresenceEvent::Connect)
    }

    pub fn on_disconnect(&self) -> Result<()> {
        self.send(PresenceEvent::Disconnect)
    }

    /// A sender for platform adapters that deliver events from their own threads.
    pub fn sender(&self) -> Sender<PresenceEvent> {
        self.sender.clone()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status.read().clone()
    }

    /// Stop the lifecycle thread, tearing down an active session.
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.sender.send(PresenceEvent::Shutdown);
        thread
            .join()
            .map_err(|_| Error::Fatal("lifecycle thread panicked".into()))
    }

    fn send(&self, event: PresenceEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| Error::RuntimeStopped)
    }
}

impl Drop for LifecycleHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run<S: HighPowerSession>(
    mut controller: LifecycleController<S>,
    events: Receiver<PresenceEvent>,
    status: Arc<RwLock<LifecycleStatus>>,
) {
    info!("Lifecycle loop running");

    loop {
        // `None` means the grace deadline passed with no event in between.
        let next = match controller.deadline() {
            Some(deadline) => match events.recv_deadline(deadline) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(PresenceEvent::Shutdown),
            },
            None => Some(events.recv().unwrap_or(PresenceEvent::Shutdown)),
        };

        let now = Instant::now();
        let result = match next {
            Some(PresenceEvent::Connect) => controller.on_connect(now),
            Some(PresenceEvent::Disconnect) => controller.on_disconnect(now),
            None => controller.on_timer(now),
            Some(PresenceEvent::Shutdown) => {
                let result = controller.shutdown();
                if let Err(e) = &result {
                    error!(error = %e, "Session teardown on shutdown failed");
                }
                publish(&controller, &status, result.err());
                break;
            }
        };

        match result {
            Ok(phase) => {
                debug!(?phase, "Lifecycle event handled");
                publish(&controller, &status, None);
            }
            Err(e) => publish(&controller, &status, Some(e)),
        }
    }

    info!("Lifecycle loop stopped");
}

fn publish<S: HighPowerSession>(
    controller: &LifecycleController<S>,
    status: &RwLock<LifecycleStatus>,
    error: Option<Error>,
) {
    let mut status = status.write();
    status.phase = controller.phase();
    status.presence = controller.presence();
    status.session = controller.session_state();
    if let Some(e) = error {
        status.last_error = Some(e.to_string());
    }
    status.events_processed += 1;
}
