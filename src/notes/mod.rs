//! Durable note storage.
//!
//! Each note is two files named from its id: a JSON metadata record and a
//! raw content record. There is no separate index; listings are built by
//! scanning the note directory, and a note missing either half is treated
//! as absent.

mod record;
mod store;

pub use store::{NoteStore, DEFAULT_LIST_LIMIT};
