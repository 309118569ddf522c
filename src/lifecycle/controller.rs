//! Presence-driven state machine.

use super::session::HighPowerSession;
use super::timer::GraceTimer;
use crate::config::LifecycleConfig;
use crate::error::{Error, Result};
use crate::types::{PresenceState, SessionState};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Externally visible phase of the lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecyclePhase {
    /// Session down, timer disarmed.
    #[default]
    Idle,
    /// Session up, operator present.
    Engaged,
    /// Session up, operator gone, grace timer running.
    Lingering,
}

/// Decides when the high-power session runs.
///
/// The controller is the only writer of the session state and calls
/// `start`/`stop` one at a time from whichever thread drives it. Every
/// method takes the current monotonic instant so behavior is a pure function
/// of the event sequence.
pub struct LifecycleController<S> {
    session: S,
    grace_period: Duration,
    presence: PresenceState,
    session_state: SessionState,
    timer: GraceTimer,
}

impl<S: HighPowerSession> LifecycleController<S> {
    pub fn new(session: S, config: LifecycleConfig) -> Self {
        Self {
            session,
            grace_period: config.grace_period(),
            presence: PresenceState::Absent,
            session_state: SessionState::Inactive,
            timer: GraceTimer::new(),
        }
    }

    /// The operator came into range.
    ///
    /// Cancels a pending grace timer first, then brings the session up if it
    /// is down. A failed bring-up leaves the controller `Idle`; the next
    /// connect is the only retry.
    pub fn on_connect(&mut self, _now: Instant) -> Result<LifecyclePhase> {
        if self.presence == PresenceState::Present {
            debug!("Duplicate connect signal");
        }
        self.presence = PresenceState::Present;

        if self.timer.disarm() {
            info!("Grace period cancelled, operator reconnected");
        }

        if self.session_state == SessionState::Inactive {
            info!("Operator connected, starting high-power session");
            if let Err(e) = self.session.start() {
                error!(error = %e, "High-power session bring-up failed");
                return Err(bringup_error(e));
            }
            self.session_state = SessionState::Active;
        }

        Ok(self.phase())
    }

    /// The operator left range.
    ///
    /// Arms (or re-arms) the grace timer while the session is up. Never
    /// starts or stops the session itself.
    pub fn on_disconnect(&mut self, now: Instant) -> Result<LifecyclePhase> {
        if self.presence == PresenceState::Absent {
            debug!("Duplicate disconnect signal");
        }
        self.presence = PresenceState::Absent;

        if self.session_state == SessionState::Active {
            self.timer.arm(now, self.grace_period);
            info!(
                grace_ms = self.grace_period.as_millis() as u64,
                "Operator disconnected, grace period started"
            );
        }

        Ok(self.phase())
    }

    /// Check the grace timer and stop the session if it has run out.
    ///
    /// Calling this before the deadline, or with no timer armed, does nothing.
    pub fn on_timer(&mut self, now: Instant) -> Result<LifecyclePhase> {
        if !self.timer.is_expired(now) {
            return Ok(self.phase());
        }
        self.timer.disarm();

        if self.presence == PresenceState::Present || self.session_state == SessionState::Inactive
        {
            debug!("Grace timer fired with nothing to do");
            return Ok(self.phase());
        }

        info!("Grace period expired, stopping high-power session");
        self.session_state = SessionState::Inactive;
        if let Err(e) = self.session.stop() {
            warn!(error = %e, "High-power session did not stop cleanly");
            return Err(teardown_error(e));
        }

        Ok(self.phase())
    }

    /// Stop the session (if up) and disarm the timer.
    pub fn shutdown(&mut self) -> Result<()> {
        self.timer.disarm();
        if self.session_state == SessionState::Active {
            self.session_state = SessionState::Inactive;
            self.session.stop().map_err(teardown_error)?;
        }
        Ok(())
    }

    pub fn phase(&self) -> LifecyclePhase {
        match (self.session_state, self.timer.is_armed()) {
            (SessionState::Inactive, _) => LifecyclePhase::Idle,
            (SessionState::Active, false) => LifecyclePhase::Engaged,
            (SessionState::Active, true) => LifecyclePhase::Lingering,
        }
    }

    pub fn presence(&self) -> PresenceState {
        self.presence
    }

    pub fn session_state(&self) -> SessionState {
        self.session_state
    }

    /// When the grace timer will fire, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

fn bringup_error(e: Error) -> Error {
    match e {
        Error::SessionBringup(_) => e,
        other => Error::SessionBringup(other.to_string()),
    }
}

fn teardown_error(e: Error) -> Error {
    match e {
        Error::SessionTeardown(_) => e,
        other => Error::SessionTeardown(other.to_string()),
    }
}
