//! Persistent key-value namespaces.
//!
//! A namespace is one small file holding named integers. The note store
//! keeps its id counter here, separate from the note records themselves,
//! so the counter survives notes being deleted or the note directory being
//! wiped.

mod counter;
mod namespace;

pub use counter::DurableCounter;
pub use namespace::Namespace;
