//! Presence-gated lifecycle of the high-power session.
//!
//! The controller keeps the high-power session (wireless transport plus
//! server) up while a trusted operator is connected over the low-power
//! beacon, and for a grace period after they leave:
//!
//! ```text
//!            connect (start ok)              disconnect
//!   Idle ─────────────────────────▶ Engaged ────────────▶ Lingering
//!    ▲                                 ▲                     │  │
//!    │                                 └──── connect ────────┘  │
//!    └──────────────── grace timer fires (stop) ────────────────┘
//! ```
//!
//! [`LifecycleController`] is the pure state machine, driven with explicit
//! instants. [`LifecycleRuntime`] runs one on its own thread and feeds it a
//! single ordered stream of presence events and timer expirations.
//!
//! # Example
//!
//! ```ignore
//! let controller = LifecycleController::new(session, LifecycleConfig::default());
//! let handle = LifecycleRuntime::spawn(controller)?;
//!
//! // From the beacon stack's callbacks:
//! handle.on_connect();
//! handle.on_disconnect();
//! ```

mod controller;
mod runtime;
mod session;
mod timer;

pub use controller::{LifecycleController, LifecyclePhase};
pub use runtime::{LifecycleHandle, LifecycleRuntime, LifecycleStatus, PresenceEvent};
pub use session::{CompositeSession, HighPowerSession};
pub use timer::GraceTimer;
