//! Correlation channel: atomic command publish + result consume.
//!
//! The protocol is a single-slot rendezvous: one command file, one result
//! file. Correlation is purely positional. Deleting any stale result
//! before publishing is the only guard the protocol has, so a result
//! observed after publish belongs to the command just written. There are
//! no request ids; two controllers sharing a mailbox are not safe.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::bridge::mailbox::Mailbox;
use crate::bridge::protocol::{Request, Response};
use crate::error::{Error, Result};

/// Fixed delay between result-file checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One command/response cycle at a time over a shared mailbox.
///
/// `send` takes `&mut self`: the single command and result slots make
/// concurrent calls on one mailbox meaningless, so the type forbids them.
#[derive(Debug)]
pub struct Channel {
    mailbox: Mailbox,
}

impl Channel {
    pub fn new(mailbox: Mailbox) -> Self {
        Self { mailbox }
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Publish one command and wait for its result.
    ///
    /// Clears any stale result, overwrites the command slot, then polls
    /// every [`POLL_INTERVAL`] until a parseable result appears or
    /// `timeout` of wall-clock time elapses. The result file is deleted
    /// once consumed. A `success = false` response is returned like any
    /// other; interpreting it is the caller's job.
    pub async fn send(
        &mut self,
        action: &str,
        args: serde_json::Value,
        timeout: Duration,
    ) -> Result<Response> {
        fs::create_dir_all(self.mailbox.dir())?;

        let commands_path = self.mailbox.commands_path();
        let results_path = self.mailbox.results_path();

        // A result left behind by an abandoned call must never be taken
        // for this call's answer.
        remove_if_exists(&results_path)?;

        let request = Request::new(action, args);
        let payload = serde_json::to_vec(&request)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        // Write-then-rename so the responder never observes a half-written
        // command. Rename within one directory replaces the slot in a
        // single step.
        let staging_path = commands_path.with_extension("json.tmp");
        fs::write(&staging_path, payload)?;
        fs::rename(&staging_path, &commands_path)?;
        tracing::debug!(action, path = %commands_path.display(), "command published");

        let started = Instant::now();
        loop {
            if let Some(response) = try_consume(&results_path)? {
                tracing::debug!(action, success = response.success, "result consumed");
                return Ok(response);
            }
            if started.elapsed() >= timeout {
                tracing::debug!(action, timeout_secs = timeout.as_secs_f64(), "no result before deadline");
                return Err(Error::NoResponse {
                    action: action.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// Read and delete the result file.
///
/// `None` when the file is absent or not yet parseable: a partial write
/// looks identical to an unwritten file and is retried on the next tick.
fn try_consume(path: &Path) -> Result<Option<Response>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice::<Response>(&contents) {
        Ok(response) => {
            fs::remove_file(path)?;
            Ok(Some(response))
        }
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "result not parseable yet");
            Ok(None)
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
