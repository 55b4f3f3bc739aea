//! Subcommand dispatch and per-command output formatting.

use std::fs;
use std::process;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::TimeZone;
use gdremote::{Client, Error, LogFilter, LogLine, Response, coerce_value, read_log};
use serde_json::Value;

use crate::{Cli, Command, InputCommand};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut client = Client::open(&cli.project)?;

    match cli.command {
        Command::Ping => ping(&mut client).await,
        Command::Screenshot { filename } => screenshot(&mut client, filename.as_deref()).await,
        Command::Validate { scene } => {
            let response = client.validate_scene(&scene).await?;
            print_validation(&response);
            Ok(())
        }
        Command::ValidateAll => {
            let response = client.validate_all_scenes().await?;
            print_validation(&response);
            Ok(())
        }
        Command::SceneTree { depth } => {
            let data = client.scene_tree(depth).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Command::Performance => {
            let data = client.performance().await?;
            print_performance(&data);
            Ok(())
        }
        Command::GetState { node } => {
            let data = client.get_state(node.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Command::SetState {
            node,
            property,
            value,
        } => {
            client
                .set_state(&node, &property, coerce_value(&value))
                .await?;
            println!("State updated");
            Ok(())
        }
        Command::RunMethod { node, method, args } => run_method(&mut client, &node, &method, args.as_deref()).await,
        Command::Logs { tail, category } => logs(&client, category, tail),
        Command::Quit { exit_code } => {
            if client.quit(exit_code.unwrap_or(0)).await? {
                println!("Quit command sent");
            } else {
                println!("Quit command sent (no response expected)");
            }
            Ok(())
        }
        Command::Input(input) => run_input(&mut client, input).await,
    }
}

async fn ping(client: &mut Client) -> anyhow::Result<()> {
    match client.ping().await {
        Ok(data) => {
            let timestamp = data
                .get("timestamp")
                .and_then(Value::as_f64)
                .unwrap_or_default();
            println!("DevTools is running (timestamp: {timestamp:.0})");
            Ok(())
        }
        Err(Error::NoResponse { .. }) => {
            println!("No response - is the game running with the DevTools autoload?");
            process::exit(1);
        }
        Err(Error::Remote { .. }) => {
            println!("DevTools responded but with error");
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn screenshot(client: &mut Client, filename: Option<&str>) -> anyhow::Result<()> {
    let data = client.screenshot(filename).await?;
    println!(
        "Screenshot saved: {}",
        data.get("path").and_then(Value::as_str).unwrap_or("?")
    );
    if let Some(size) = data.get("size") {
        println!(
            "Size: {}x{}",
            size.get("width").and_then(Value::as_i64).unwrap_or(0),
            size.get("height").and_then(Value::as_i64).unwrap_or(0),
        );
    }
    Ok(())
}

async fn run_method(
    client: &mut Client,
    node: &str,
    method: &str,
    args: Option<&str>,
) -> anyhow::Result<()> {
    let method_args = match args {
        Some(raw) => {
            let parsed: Value =
                serde_json::from_str(raw).context("invalid JSON in --args")?;
            match parsed {
                Value::Array(items) => items,
                _ => bail!("--args must be a JSON array, e.g. '[25, \"name\"]'"),
            }
        }
        None => Vec::new(),
    };

    let data = client.run_method(node, method, method_args).await?;
    println!("Result: {}", data.get("result").unwrap_or(&Value::Null));
    Ok(())
}

async fn run_input(client: &mut Client, input: InputCommand) -> anyhow::Result<()> {
    match input {
        InputCommand::Press { action, strength } => {
            let data = client.input_press(&action, strength).await?;
            println!("Pressed: {action}");
            print_active_inputs(&data);
        }
        InputCommand::Release { action } => {
            let data = client.input_release(&action).await?;
            println!("Released: {action}");
            print_active_inputs(&data);
        }
        InputCommand::Tap {
            action,
            hold,
            strength,
        } => {
            client.input_tap(&action, hold, strength).await?;
            match hold {
                Some(hold) => println!("Tapped: {action} (hold: {hold}s)"),
                None => println!("Tapped: {action}"),
            }
        }
        InputCommand::Clear => {
            let data = client.input_clear().await?;
            let cleared = data
                .get("cleared_actions")
                .and_then(Value::as_array)
                .map(|actions| {
                    actions
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            if cleared.is_empty() {
                println!("No active inputs to clear");
            } else {
                println!("Cleared {} inputs: {}", cleared.len(), cleared.join(", "));
            }
        }
        InputCommand::List { all } => {
            let data = client.input_actions(all).await?;
            print_actions(&data);
        }
        InputCommand::Sequence { file, timeout } => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("sequence file not found: {}", file.display()))?;
            let sequence: Value =
                serde_json::from_str(&contents).context("invalid JSON in sequence file")?;

            let steps = sequence
                .get("steps")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if steps.is_empty() {
                bail!("sequence has no steps");
            }
            if timeout.is_some_and(|t| !t.is_finite() || t <= 0.0) {
                bail!("--timeout must be a positive number of seconds");
            }

            if let Some(description) = sequence.get("description").and_then(Value::as_str)
                && !description.is_empty()
            {
                println!("Running sequence: {description}");
            }
            println!("Executing {} steps...", steps.len());

            let ack = client
                .input_sequence(steps, timeout.map(Duration::from_secs_f64))
                .await?;
            println!(
                "Sequence started: {}",
                ack.sequence_id.as_deref().unwrap_or("unknown")
            );
            println!("Note: Sequence runs asynchronously. Check logs for completion.");
        }
    }
    Ok(())
}

fn logs(client: &Client, category: Option<String>, tail: Option<usize>) -> anyhow::Result<()> {
    let filter = LogFilter { category, tail };
    let lines = read_log(client.mailbox(), &filter)?;
    if lines.is_empty() {
        println!("No logs found");
        return Ok(());
    }

    for line in lines {
        match line {
            LogLine::Entry(entry) => {
                println!(
                    "[{}] [{}] {}",
                    format_timestamp(entry.timestamp),
                    entry.category,
                    entry.message
                );
            }
            LogLine::Raw(raw) => println!("{raw}"),
        }
    }
    Ok(())
}

fn format_timestamp(epoch_seconds: f64) -> String {
    chrono::Local
        .timestamp_opt(epoch_seconds as i64, 0)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{epoch_seconds:.0}"))
}

fn print_active_inputs(data: &Value) {
    let active = data
        .get("active_inputs")
        .and_then(Value::as_array)
        .map(|actions| {
            actions
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if !active.is_empty() {
        println!("Active inputs: {}", active.join(", "));
    }
}

fn print_actions(data: &Value) {
    let actions = data
        .get("actions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if actions.is_empty() {
        println!("No actions found");
        return;
    }

    println!("Available actions ({}):", actions.len());
    for action in &actions {
        let name = action.get("name").and_then(Value::as_str).unwrap_or("?");
        let pressed = if action
            .get("is_pressed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            " [PRESSED]"
        } else {
            ""
        };
        let events = action
            .get("events")
            .and_then(Value::as_array)
            .map(|events| {
                events
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        let events = if events.is_empty() {
            "(no keys)".to_string()
        } else {
            events
        };
        println!("  {name}{pressed}: {events}");
    }
}

fn print_performance(data: &Value) {
    let metric = |key: &str| data.get(key).and_then(Value::as_f64).unwrap_or_default();

    println!("FPS:              {:.1}", metric("fps"));
    println!("Frame time:       {:.2} ms", metric("frame_time_ms"));
    println!("Physics FPS:      {}", metric("physics_fps") as i64);
    println!("Draw calls:       {}", metric("draw_calls") as i64);
    println!("Objects:          {}", metric("objects") as i64);
    println!("Static memory:    {:.1} MB", metric("static_memory_mb"));
    println!("Video memory:     {:.1} MB", metric("video_memory_mb"));
    println!("Total nodes:      {}", metric("nodes") as i64);
    println!("Orphan nodes:     {}", metric("orphan_nodes") as i64);
    println!("Physics 2D objs:  {}", metric("physics_2d_active_objects") as i64);
    println!("Physics 3D objs:  {}", metric("physics_3d_active_objects") as i64);
}

/// Print a validation verdict with its issue list. Unlike every other
/// command, issue details ride in `data` even when validation fails, so
/// the whole response is rendered before the exit status is decided.
fn print_validation(response: &Response) {
    if response.success {
        println!("[OK] {}", response.message);
    } else {
        println!("[FAIL] {}", response.message);
    }

    let issues = response.data.get("issues");
    match issues {
        // Whole-project sweep: scene path -> issue list.
        Some(Value::Object(scenes)) => {
            for (scene, scene_issues) in scenes {
                println!();
                println!("{scene}:");
                if let Some(scene_issues) = scene_issues.as_array() {
                    for issue in scene_issues {
                        print_issue(issue);
                    }
                }
            }
        }
        // Single scene: flat issue list.
        Some(Value::Array(scene_issues)) => {
            for issue in scene_issues {
                print_issue(issue);
            }
        }
        _ => {}
    }

    if !response.success {
        process::exit(1);
    }
}

fn print_issue(issue: &Value) {
    let severity = match issue.get("severity").and_then(Value::as_str) {
        Some("error") => "ERROR",
        Some("warning") => "WARN",
        Some("info") => "INFO",
        _ => "???",
    };
    println!(
        "  [{severity}] {}: {}",
        issue.get("code").and_then(Value::as_str).unwrap_or("?"),
        issue.get("message").and_then(Value::as_str).unwrap_or(""),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formats_as_local_clock_time() {
        let formatted = format_timestamp(0.0);
        assert_eq!(formatted.len(), 8);
        assert_eq!(formatted.matches(':').count(), 2);
    }

    #[test]
    fn negative_nonsense_timestamp_falls_back_to_raw() {
        let formatted = format_timestamp(f64::MAX);
        assert!(!formatted.contains(':'));
    }
}
