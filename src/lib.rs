//! # Dead Drop
//!
//! Core of a battery-powered drop device: a low-power presence beacon stays
//! on all the time, and a high-power session (wireless transport + server) is
//! brought up only while a trusted operator is nearby. The device also keeps
//! short notes durably across restarts.
//!
//! ## Core Concepts
//!
//! - **Lifecycle**: Presence events drive a state machine that starts the
//!   session on connect and stops it after a grace period of absence
//! - **Notes**: Title + opaque body, persisted as a metadata record and a
//!   content record per note
//! - **Durable Counter**: Note ids come from a persisted counter and are
//!   never reused
//!
//! ## Example
//!
//! ```ignore
//! use deaddrop::{Device, DeviceConfig, LogIndicator};
//!
//! let device = Device::boot_or_halt(DeviceConfig::default(), session, LogIndicator);
//!
//! // Beacon stack callbacks
//! device.presence().on_connect()?;
//!
//! // Record API
//! let notes = device.notes();
//! let id = notes.create_note("Test", b"hello", false)?;
//! let note = notes.read_note(id)?;
//! notes.delete_note(id)?;
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod kv;
pub mod lifecycle;
pub mod notes;
pub mod types;

// Re-exports
pub use config::{DeviceConfig, LifecycleConfig, NoteStoreConfig};
pub use device::{halt, Device, FaultIndicator, LogIndicator};
pub use error::{Error, Result};
pub use kv::{DurableCounter, Namespace};
pub use lifecycle::{
    CompositeSession, GraceTimer, HighPowerSession, LifecycleController, LifecycleHandle,
    LifecyclePhase, LifecycleRuntime, LifecycleStatus, PresenceEvent,
};
pub use notes::{NoteStore, DEFAULT_LIST_LIMIT};
pub use types::*;
