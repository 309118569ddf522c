//! Device boot sequence.
//!
//! Storage comes up first. Without durable storage there is no safe way to
//! run, so a storage failure raises the fault indicator and the device halts
//! instead of continuing in a degraded mode. The lifecycle thread starts
//! afterwards in the low-power `Idle` phase.

use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::lifecycle::{HighPowerSession, LifecycleController, LifecycleHandle, LifecycleRuntime};
use crate::notes::NoteStore;
use std::sync::Arc;
use tracing::{error, info};

/// Something the operator can see when the device has given up.
pub trait FaultIndicator: Send {
    fn signal_fatal(&mut self, message: &str);
}

/// Indicator that only writes to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogIndicator;

impl FaultIndicator for LogIndicator {
    fn signal_fatal(&mut self, message: &str) {
        error!(message, "FATAL: device halted, reset required");
    }
}

/// A booted device: the note store and the presence lifecycle.
pub struct Device {
    notes: Arc<NoteStore>,
    presence: LifecycleHandle,
}

impl Device {
    /// Bring up storage, then the lifecycle thread.
    ///
    /// On failure the indicator has already been signalled and the returned
    /// error is `Fatal`.
    pub fn boot<S, I>(config: DeviceConfig, session: S, indicator: &mut I) -> Result<Self>
    where
        S: HighPowerSession + 'static,
        I: FaultIndicator + ?Sized,
    {
        Self::try_boot(config, session).map_err(|message| {
            indicator.signal_fatal(&message);
            Error::Fatal(message)
        })
    }

    /// Like [`Device::boot`], but halts the calling thread on failure.
    ///
    /// The indicator is signalled once, by [`halt`].
    pub fn boot_or_halt<S, I>(config: DeviceConfig, session: S, mut indicator: I) -> Self
    where
        S: HighPowerSession + 'static,
        I: FaultIndicator,
    {
        match Self::try_boot(config, session) {
            Ok(device) => device,
            Err(message) => halt(&mut indicator, &message),
        }
    }

    /// Boot without touching an indicator; failures come back as the fatal message.
    fn try_boot<S>(config: DeviceConfig, session: S) -> std::result::Result<Self, String>
    where
        S: HighPowerSession + 'static,
    {
        info!("Device starting");

        let result = config
            .validate()
            .and_then(|()| NoteStore::open_or_create(config.storage.clone()))
            .and_then(|store| {
                let controller = LifecycleController::new(session, config.lifecycle.clone());
                let presence = LifecycleRuntime::spawn(controller)?;
                Ok(Device {
                    notes: Arc::new(store),
                    presence,
                })
            });

        match result {
            Ok(device) => {
                info!("Device ready in low-power mode");
                Ok(device)
            }
            Err(e) => Err(format!("device boot failed: {}", e)),
        }
    }

    /// The note store, for the record API.
    pub fn notes(&self) -> Arc<NoteStore> {
        Arc::clone(&self.notes)
    }

    /// The lifecycle handle, for the presence signal source.
    pub fn presence(&self) -> &LifecycleHandle {
        &self.presence
    }

    /// Stop the lifecycle thread, bringing the session down if it is up.
    pub fn shutdown(mut self) -> Result<()> {
        self.presence.shutdown()
    }
}

/// Signal the indicator and park forever.
pub fn halt<I: FaultIndicator + ?Sized>(indicator: &mut I, message: &str) -> ! {
    indicator.signal_fatal(message);
    loop {
        std::thread::park();
    }
}
