//! Boundary to the high-power session.

use crate::error::{Error, Result};
use tracing::{info, warn};

/// The resource gated by presence.
///
/// Both calls block until the platform has finished, and both must be no-ops
/// when the session is already in the requested state.
pub trait HighPowerSession: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

impl<S: HighPowerSession + ?Sized> HighPowerSession for Box<S> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}

/// A transport and the server that runs on it, brought up as one session.
///
/// The transport comes up first and goes down last. If the server fails to
/// start, the transport is stopped again so nothing is left half up.
pub struct CompositeSession<T, S> {
    transport: T,
    server: S,
    active: bool,
}

impl<T: HighPowerSession, S: HighPowerSession> CompositeSession<T, S> {
    pub fn new(transport: T, server: S) -> Self {
        Self {
            transport,
            server,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl<T: HighPowerSession, S: HighPowerSession> HighPowerSession for CompositeSession<T, S> {
    fn start(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }

        self.transport
            .start()
            .map_err(|e| Error::SessionBringup(format!("transport: {}", e)))?;

        if let Err(e) = self.server.start() {
            if let Err(stop_err) = self.transport.stop() {
                warn!(error = %stop_err, "Transport did not stop after server bring-up failure");
            }
            return Err(Error::SessionBringup(format!("server: {}", e)));
        }

        self.active = true;
        info!("High-power session up");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let server = self.server.stop();
        let transport = self.transport.stop();
        info!("High-power session down");

        server
            .map_err(|e| Error::SessionTeardown(format!("server: {}", e)))
            .and(transport.map_err(|e| Error::SessionTeardown(format!("transport: {}", e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Component {
        name: &'static str,
        journal: Journal,
        fail_start: bool,
    }

    impl HighPowerSession for Component {
        fn start(&mut self) -> Result<()> {
            self.journal.lock().push(format!("{}.start", self.name));
            if self.fail_start {
                return Err(Error::Io(std::io::Error::other("radio busy")));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.journal.lock().push(format!("{}.stop", self.name));
            Ok(())
        }
    }

    fn session(journal: &Journal, fail_server: bool) -> CompositeSession<Component, Component> {
        CompositeSession::new(
            Component {
                name: "transport",
                journal: journal.clone(),
                fail_start: false,
            },
            Component {
                name: "server",
                journal: journal.clone(),
                fail_start: fail_server,
            },
        )
    }

    #[test]
    fn test_ordering() {
        let journal = Journal::default();
        let mut session = session(&journal, false);

        session.start().unwrap();
        session.stop().unwrap();

        assert_eq!(
            *journal.lock(),
            vec!["transport.start", "server.start", "server.stop", "transport.stop"]
        );
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let journal = Journal::default();
        let mut session = session(&journal, false);

        session.start().unwrap();
        session.start().unwrap();
        assert!(session.is_active());
        session.stop().unwrap();
        session.stop().unwrap();
        assert!(!session.is_active());

        assert_eq!(journal.lock().len(), 4);
    }

    #[test]
    fn test_server_failure_rolls_back_transport() {
        let journal = Journal::default();
        let mut session = session(&journal, true);

        let err = session.start().unwrap_err();
        assert!(matches!(err, Error::SessionBringup(_)));
        assert!(!session.is_active());
        assert_eq!(
            *journal.lock(),
            vec!["transport.start", "server.start", "transport.stop"]
        );
    }
}
