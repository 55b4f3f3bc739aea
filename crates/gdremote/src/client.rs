//! Command façade over the correlation channel.
//!
//! One method per action the DevTools autoload understands. Every call is
//! fully synchronous from the caller's point of view except
//! [`Client::input_sequence`], which returns as soon as the responder
//! *accepts* the sequence - the steps keep executing after the call and
//! completion only shows up in the log stream.

use std::path::Path;
use std::time::Duration;

use serde_json::{Value, json};

use crate::bridge::mailbox::Mailbox;
use crate::bridge::protocol::{Response, SequenceAck};
use crate::channel::Channel;
use crate::error::{Error, Result};

/// Wait applied to most commands.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Ping and quit round-trips are either fast or not coming.
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(5);
/// A full-project validation sweep touches every scene file.
pub const VALIDATE_ALL_TIMEOUT: Duration = Duration::from_secs(60);
/// Whole-sequence budget when the caller does not pass one.
pub const SEQUENCE_TIMEOUT: Duration = Duration::from_secs(60);
/// Extra wait on top of the sequence budget for the acceptance round-trip.
pub const SEQUENCE_ACCEPT_GRACE: Duration = Duration::from_secs(10);

/// Controller handle for one Godot project's mailbox.
pub struct Client {
    channel: Channel,
}

impl Client {
    /// Locate the project's mailbox and open a client over it.
    pub fn open(project_root: &Path) -> Result<Self> {
        Ok(Self::new(Mailbox::locate(project_root)?))
    }

    pub fn new(mailbox: Mailbox) -> Self {
        Self {
            channel: Channel::new(mailbox),
        }
    }

    pub fn mailbox(&self) -> &Mailbox {
        self.channel.mailbox()
    }

    /// Send one action and surface the responder's verdict.
    ///
    /// Success yields the opaque `data` payload. Failure carries the
    /// responder's message; `data` is never inspected on that path.
    async fn call(&mut self, action: &str, args: Value, timeout: Duration) -> Result<Value> {
        let response = self.channel.send(action, args, timeout).await?;
        into_data(action, response)
    }

    pub async fn ping(&mut self) -> Result<Value> {
        self.call("ping", json!({}), SHORT_TIMEOUT).await
    }

    pub async fn screenshot(&mut self, filename: Option<&str>) -> Result<Value> {
        let args = match filename {
            Some(filename) => json!({ "filename": filename }),
            None => json!({}),
        };
        self.call("screenshot", args, DEFAULT_TIMEOUT).await
    }

    /// Validate a single scene. The verdict is returned whole: issue lists
    /// ride in `data` even when validation fails.
    pub async fn validate_scene(&mut self, path: &str) -> Result<Response> {
        self.channel
            .send("validate_scene", json!({ "path": path }), DEFAULT_TIMEOUT)
            .await
    }

    /// Validate every scene in the project. Slow on purpose; see
    /// [`VALIDATE_ALL_TIMEOUT`].
    pub async fn validate_all_scenes(&mut self) -> Result<Response> {
        self.channel
            .send("validate_all_scenes", json!({}), VALIDATE_ALL_TIMEOUT)
            .await
    }

    pub async fn scene_tree(&mut self, depth: u32) -> Result<Value> {
        self.call("scene_tree", json!({ "depth": depth }), DEFAULT_TIMEOUT)
            .await
    }

    pub async fn performance(&mut self) -> Result<Value> {
        self.call("performance", json!({}), DEFAULT_TIMEOUT).await
    }

    pub async fn get_state(&mut self, node_path: Option<&str>) -> Result<Value> {
        let args = match node_path {
            Some(node_path) => json!({ "node_path": node_path }),
            None => json!({}),
        };
        self.call("get_state", args, DEFAULT_TIMEOUT).await
    }

    /// Set one property on a node. Callers coerce user input with
    /// [`coerce_value`] before getting here.
    pub async fn set_state(&mut self, node_path: &str, property: &str, value: Value) -> Result<Value> {
        self.call(
            "set_state",
            json!({
                "node_path": node_path,
                "property": property,
                "value": value,
            }),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    pub async fn run_method(&mut self, node_path: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        self.call(
            "run_method",
            json!({
                "node_path": node_path,
                "method": method,
                "args": args,
            }),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    /// Ask the game to exit. Returns whether the responder acknowledged:
    /// the game often dies before replying, which is not a fault.
    pub async fn quit(&mut self, exit_code: i32) -> Result<bool> {
        let sent = self
            .channel
            .send("quit", json!({ "exit_code": exit_code }), SHORT_TIMEOUT)
            .await;
        match sent {
            Ok(_) => Ok(true),
            Err(Error::NoResponse { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn input_press(&mut self, action: &str, strength: Option<f64>) -> Result<Value> {
        let mut args = json!({ "action": action });
        if let Some(strength) = strength {
            args["strength"] = json!(strength);
        }
        self.call("input_press", args, DEFAULT_TIMEOUT).await
    }

    pub async fn input_release(&mut self, action: &str) -> Result<Value> {
        self.call("input_release", json!({ "action": action }), DEFAULT_TIMEOUT)
            .await
    }

    pub async fn input_tap(
        &mut self,
        action: &str,
        hold_seconds: Option<f64>,
        strength: Option<f64>,
    ) -> Result<Value> {
        let mut args = json!({ "action": action });
        if let Some(hold_seconds) = hold_seconds {
            args["hold_seconds"] = json!(hold_seconds);
        }
        if let Some(strength) = strength {
            args["strength"] = json!(strength);
        }
        self.call("input_tap", args, DEFAULT_TIMEOUT).await
    }

    pub async fn input_clear(&mut self) -> Result<Value> {
        self.call("input_clear", json!({}), DEFAULT_TIMEOUT).await
    }

    pub async fn input_actions(&mut self, include_builtin: bool) -> Result<Value> {
        self.call(
            "input_actions",
            json!({ "include_builtin": include_builtin }),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    /// Submit an input sequence for asynchronous execution.
    ///
    /// The wait covers the acceptance round-trip only: the sequence budget
    /// plus [`SEQUENCE_ACCEPT_GRACE`], never the execution itself. A
    /// successful return means the responder accepted the steps and handed
    /// back an identifier; watch the log stream for completion or per-step
    /// errors.
    pub async fn input_sequence(
        &mut self,
        steps: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<SequenceAck> {
        let budget = timeout.unwrap_or(SEQUENCE_TIMEOUT);
        let mut args = json!({ "steps": steps });
        if timeout.is_some() {
            args["timeout"] = json!(budget.as_secs_f64());
        }

        let data = self
            .call("input_sequence", args, budget + SEQUENCE_ACCEPT_GRACE)
            .await?;
        let sequence_id = data
            .get("sequence_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(SequenceAck { sequence_id })
    }
}

fn into_data(action: &str, response: Response) -> Result<Value> {
    if response.success {
        Ok(response.data)
    } else {
        Err(Error::Remote {
            action: action.to_string(),
            message: response.message,
        })
    }
}

/// Interpret a user-supplied property value.
///
/// JSON parse first, then integer, then float, otherwise the raw string.
/// The order keeps quoted numerics as strings while bare ones become
/// numbers, and malformed tokens degrade to strings instead of failing the
/// call.
pub fn coerce_value(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Value::from(float);
    }
    Value::from(raw)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn coerce_bare_integer() {
        assert_eq!(coerce_value("42"), json!(42));
    }

    #[test]
    fn coerce_bare_float() {
        assert_eq!(coerce_value("3.14"), json!(3.14));
    }

    #[test]
    fn coerce_quoted_number_stays_a_string() {
        assert_eq!(coerce_value("\"42\""), json!("42"));
    }

    #[test]
    fn coerce_json_literals() {
        assert_eq!(coerce_value("true"), json!(true));
        assert_eq!(coerce_value("[1, 2]"), json!([1, 2]));
        assert_eq!(coerce_value("{\"hp\": 10}"), json!({"hp": 10}));
    }

    #[test]
    fn coerce_malformed_token_degrades_to_string() {
        assert_eq!(coerce_value("hello"), json!("hello"));
        assert_eq!(coerce_value("1.2.3"), json!("1.2.3"));
    }

    /// Responder double that accepts whatever arrives with a fixed reply.
    fn spawn_responder(dir: &Path, response: Response) -> thread::JoinHandle<()> {
        let mailbox = Mailbox::at(dir);
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                if mailbox.commands_path().exists() {
                    fs::remove_file(mailbox.commands_path()).unwrap();
                    fs::write(
                        mailbox.results_path(),
                        serde_json::to_vec(&response).unwrap(),
                    )
                    .unwrap();
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
        })
    }

    #[tokio::test]
    async fn failure_verdict_surfaces_message_only() {
        let dir = tempfile::tempdir().unwrap();
        let responder = spawn_responder(
            dir.path(),
            Response {
                success: false,
                message: "no such node".to_string(),
                data: json!({"ignored": true}),
            },
        );

        let mut client = Client::new(Mailbox::at(dir.path()));
        let err = client.get_state(Some("/root/Missing")).await.unwrap_err();
        responder.join().unwrap();

        match err {
            Error::Remote { action, message } => {
                assert_eq!(action, "get_state");
                assert_eq!(message, "no such node");
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sequence_returns_on_acceptance_not_completion() {
        let dir = tempfile::tempdir().unwrap();
        // Accepts immediately; the sequence itself would keep running long
        // after this reply.
        let responder = spawn_responder(
            dir.path(),
            Response {
                success: true,
                message: "sequence accepted".to_string(),
                data: json!({"sequence_id": "seq_7"}),
            },
        );

        let mut client = Client::new(Mailbox::at(dir.path()));
        let started = Instant::now();
        let ack = client
            .input_sequence(vec![json!({"type": "tap", "action": "jump"})], None)
            .await
            .unwrap();
        responder.join().unwrap();

        assert_eq!(ack.sequence_id.as_deref(), Some("seq_7"));
        // Acceptance round-trip only - nowhere near the sequence budget.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn quit_is_acknowledged_when_the_responder_replies() {
        let dir = tempfile::tempdir().unwrap();
        let responder = spawn_responder(
            dir.path(),
            Response {
                success: true,
                message: "bye".to_string(),
                data: json!({}),
            },
        );

        let mut client = Client::new(Mailbox::at(dir.path()));
        let acknowledged = client.quit(0).await.unwrap();
        responder.join().unwrap();
        assert!(acknowledged);
    }
}
