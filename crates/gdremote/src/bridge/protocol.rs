//! Record types exchanged through the mailbox files.
//!
//! The controller writes [`Request`] to the command slot and reads
//! [`Response`] from the result slot. Both payloads are opaque
//! `serde_json::Value`s: semantics belong to the responder.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single command published to the command slot.
///
/// There is exactly one slot per mailbox; publishing overwrites any prior
/// unconsumed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub action: String,
    pub args: Value,
}

impl Request {
    pub fn new(action: impl Into<String>, args: Value) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }
}

/// The responder's answer, consumed and deleted by the controller.
///
/// `success = false` is an application-level verdict, not a protocol
/// fault; the channel returns it to the caller unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// One line of the append-only log stream, epoch seconds as written by the
/// responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: f64,
    pub category: String,
    pub message: String,
}

/// A log line as returned by the reader.
///
/// Lines that fail to parse are passed through raw in their original
/// position. The reader loses structure, never data.
#[derive(Debug, Clone)]
pub enum LogLine {
    Entry(LogEntry),
    Raw(String),
}

/// Acceptance acknowledgement for an input sequence.
///
/// A successful sequence call means the responder *accepted* the steps for
/// execution, not that they finished. Completion is only observable in the
/// log stream.
#[derive(Debug, Clone)]
pub struct SequenceAck {
    pub sequence_id: Option<String>,
}
