//! Mailbox location and layout.
//!
//! Both sides derive the same directory from the project descriptor and
//! the engine's user-data convention, so they agree on the files without
//! any further coordination.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const COMMANDS_FILE: &str = "devtools_commands.json";
pub const RESULTS_FILE: &str = "devtools_results.json";
pub const LOG_FILE: &str = "devtools_log.jsonl";

/// The shared directory holding the command, result and log files.
#[derive(Debug, Clone)]
pub struct Mailbox {
    dir: PathBuf,
}

impl Mailbox {
    /// Use an explicit directory. For tests and nonstandard setups.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Derive the mailbox for a Godot project from its `project.godot`.
    ///
    /// The project name comes from the descriptor's `config/name=` line,
    /// quotes stripped, falling back to the project directory's own name.
    /// Pure function of the project root and platform identity; nothing is
    /// created on disk here.
    pub fn locate(project_root: &Path) -> Result<Self> {
        let descriptor = project_root.join("project.godot");
        if !descriptor.exists() {
            return Err(Error::ProjectNotFound(project_root.to_path_buf()));
        }

        let contents = fs::read_to_string(&descriptor)?;
        let name = project_name(&contents)
            .or_else(|| {
                project_root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "unnamed".to_string());

        Ok(Self {
            dir: user_data_dir(&name),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn commands_path(&self) -> PathBuf {
        self.dir.join(COMMANDS_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }
}

fn project_name(descriptor: &str) -> Option<String> {
    descriptor
        .lines()
        .find_map(|line| line.strip_prefix("config/name="))
        .map(|value| value.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// `user://` base for a project: `<data dir>/Godot/app_userdata/<name>`,
/// with the lowercase `godot` spelling the engine uses on Linux and the
/// BSDs.
fn user_data_dir(project_name: &str) -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let engine_dir = if cfg!(any(target_os = "windows", target_os = "macos")) {
        "Godot"
    } else {
        "godot"
    };
    base.join(engine_dir)
        .join("app_userdata")
        .join(project_name)
}
