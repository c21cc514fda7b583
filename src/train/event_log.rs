//! Training-curve event logs: one JSON object per line.
//!
//! Layout mirrors the usual `train/` + `validation/` split of a log
//! directory so each curve can be plotted on its own.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{IoContext, Result};
use crate::train::epoch_stats::EpochStats;

pub const EVENTS_FILE: &str = "events.jsonl";

/// One scalar point of a training curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub epoch: usize,
    pub loss: f32,
    pub categorical_accuracy: f32,
    pub elapsed_ms: u64,
}

pub struct EventLog {
    train: PathBuf,
    validation: PathBuf,
}

impl EventLog {
    /// Creates `<dir>/train` and `<dir>/validation`, truncating previous runs.
    pub fn create(dir: impl AsRef<Path>) -> Result<EventLog> {
        let dir = dir.as_ref();
        let log = EventLog {
            train: dir.join("train").join(EVENTS_FILE),
            validation: dir.join("validation").join(EVENTS_FILE),
        };
        for path in [&log.train, &log.validation] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).at_path(parent)?;
            }
            if path.exists() {
                std::fs::remove_file(path).at_path(path)?;
            }
        }
        Ok(log)
    }

    fn append(path: &Path, event: &Event) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path).at_path(path)?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{}", line).at_path(path)
    }

    pub fn record(&self, stats: &EpochStats) -> Result<()> {
        Self::append(&self.train, &Event {
            epoch: stats.epoch,
            loss: stats.loss,
            categorical_accuracy: stats.accuracy,
            elapsed_ms: stats.elapsed_ms,
        })?;
        if let (Some(loss), Some(acc)) = (stats.val_loss, stats.val_accuracy) {
            Self::append(&self.validation, &Event {
                epoch: stats.epoch,
                loss,
                categorical_accuracy: acc,
                elapsed_ms: stats.elapsed_ms,
            })?;
        }
        Ok(())
    }
}

/// Reads back every event of one curve.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path).at_path(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line.at_path(path)?;
        if !line.trim().is_empty() {
            events.push(serde_json::from_str(&line)?);
        }
    }
    Ok(events)
}
