//! gdremote: drive a running Godot instance through its DevTools mailbox.
//!
//! The controller and the game's DevTools autoload share three files in the
//! project's `user://` directory: a single command slot, a single result
//! slot, and an append-only log stream. This crate is the controller side.
//! It publishes one command at a time, polls for the matching result,
//! consumes it, and reads the log stream independently. Payloads stay
//! opaque JSON - the bridge ships action names and argument objects without
//! understanding what a scene or a node is.
//!
//! # Architecture
//!
//! - **bridge**: wire records and mailbox location
//! - **channel**: publish/poll/consume cycle with timeout
//! - **client**: one method per action, plus the asynchronous input
//!   sequence initiator
//! - **logs**: reader for the responder's log stream

pub mod bridge;
pub mod channel;
pub mod client;
pub mod error;
pub mod logs;

pub use bridge::mailbox::Mailbox;
pub use bridge::protocol::{LogEntry, LogLine, Request, Response, SequenceAck};
pub use channel::{Channel, POLL_INTERVAL};
pub use client::{Client, coerce_value};
pub use error::{Error, Result};
pub use logs::{LogFilter, read_log};
