//! Wire protocol and mailbox layout for the DevTools bridge.
//!
//! - **protocol**: record types written to and read from the mailbox files
//! - **mailbox**: locating the shared directory both sides agree on

pub mod mailbox;
pub mod protocol;
