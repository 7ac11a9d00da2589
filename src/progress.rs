//! Refresh progress: shared state for the API and reporters for the CLI.
//!
//! [`RefreshProgress`] is the snapshot exposed by `GET /api/data`.
//! [`RefreshProgressReporter`] implementations print the same events on
//! **stderr** so stdout remains parseable for scripts.

use serde::Serialize;
use std::io::Write;

/// Phase of a refresh cycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    #[default]
    Idle,
    /// Candidates are being discovered. Total unknown.
    Searching,
    /// Candidates are fetched and enriched one by one. Counts known.
    Analyzing,
    Complete,
    Error,
}

/// Progress counters of the current or most recent refresh.
///
/// `current` counts entities already processed; `current_repo` is the
/// last of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RefreshProgress {
    pub current: u64,
    pub total: u64,
    pub current_repo: String,
    pub phase: RefreshPhase,
}

/// A single progress event for a refresh.
#[derive(Clone, Debug)]
pub enum RefreshProgressEvent {
    Searching { source: String },
    /// Sent after the `n`th entity has been fetched and enriched (or failed).
    Analyzing { entity: String, n: u64, total: u64 },
    Complete { analyzed: u64, failed: u64 },
    Failed { message: String },
}

impl RefreshProgressEvent {
    /// Applies this event to the shared progress counters.
    pub fn apply(&self, progress: &mut RefreshProgress) {
        match self {
            RefreshProgressEvent::Searching { .. } => {
                *progress = RefreshProgress {
                    phase: RefreshPhase::Searching,
                    ..Default::default()
                };
            }
            RefreshProgressEvent::Analyzing { entity, n, total } => {
                progress.phase = RefreshPhase::Analyzing;
                progress.current = *n;
                progress.total = *total;
                progress.current_repo = entity.clone();
            }
            RefreshProgressEvent::Complete { .. } => {
                progress.phase = RefreshPhase::Complete;
                progress.current = progress.total;
                progress.current_repo.clear();
            }
            RefreshProgressEvent::Failed { .. } => {
                progress.phase = RefreshPhase::Error;
            }
        }
    }
}

/// Reports refresh progress.
pub trait RefreshProgressReporter: Send + Sync {
    fn report(&self, event: RefreshProgressEvent);
}

/// Human-friendly progress on stderr: "refresh  analyzing  12 / 1,500  acme/widget".
pub struct StderrProgress;

impl RefreshProgressReporter for StderrProgress {
    fn report(&self, event: RefreshProgressEvent) {
        let line = match &event {
            RefreshProgressEvent::Searching { source } => {
                format!("refresh {}  searching...\n", source)
            }
            RefreshProgressEvent::Analyzing { entity, n, total } => format!(
                "refresh  analyzing  {} / {}  {}\n",
                format_number(*n),
                format_number(*total),
                entity
            ),
            RefreshProgressEvent::Complete { analyzed, failed } => format!(
                "refresh  complete  {} analyzed, {} failed\n",
                format_number(*analyzed),
                format_number(*failed)
            ),
            RefreshProgressEvent::Failed { message } => {
                format!("refresh  error  {}\n", message)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl RefreshProgressReporter for JsonProgress {
    fn report(&self, event: RefreshProgressEvent) {
        let obj = match &event {
            RefreshProgressEvent::Searching { source } => serde_json::json!({
                "event": "progress",
                "phase": "searching",
                "source": source
            }),
            RefreshProgressEvent::Analyzing { entity, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "analyzing",
                "entity": entity,
                "n": n,
                "total": total
            }),
            RefreshProgressEvent::Complete { analyzed, failed } => serde_json::json!({
                "event": "progress",
                "phase": "complete",
                "analyzed": analyzed,
                "failed": failed
            }),
            RefreshProgressEvent::Failed { message } => serde_json::json!({
                "event": "progress",
                "phase": "error",
                "message": message
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl RefreshProgressReporter for NoProgress {
    fn report(&self, _event: RefreshProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn RefreshProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn events_drive_phase_transitions() {
        let mut progress = RefreshProgress::default();
        assert_eq!(progress.phase, RefreshPhase::Idle);

        RefreshProgressEvent::Searching { source: "file".into() }.apply(&mut progress);
        assert_eq!(progress.phase, RefreshPhase::Searching);

        RefreshProgressEvent::Analyzing {
            entity: "acme/widget".into(),
            n: 2,
            total: 5,
        }
        .apply(&mut progress);
        assert_eq!(progress.current, 2);
        assert_eq!(progress.current_repo, "acme/widget");

        RefreshProgressEvent::Complete { analyzed: 5, failed: 0 }.apply(&mut progress);
        assert_eq!(progress.phase, RefreshPhase::Complete);
        assert_eq!(progress.current, 5);
        assert!(progress.current_repo.is_empty());
    }

    #[test]
    fn phase_serializes_lowercase() {
        let json = serde_json::to_value(RefreshProgress::default()).unwrap();
        assert_eq!(json["phase"], "idle");
    }
}
