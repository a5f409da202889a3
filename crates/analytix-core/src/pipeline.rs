//! The fixed sequence of checkpoints a run walks through.

use std::time::Duration;

use serde::Serialize;

use crate::{PipelineTiming, RunStatus};

/// Continuous progress ramp started when a checkpoint is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    pub target: u8,
    pub duration: Duration,
}

/// A discrete, timer-triggered update to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Wait after the previous checkpoint before applying this one.
    pub delay: Duration,
    pub status: RunStatus,
    /// Lines appended to the run log.
    pub log: &'static [&'static str],
    /// New progress value; `None` keeps the current one.
    pub progress: Option<u8>,
    pub ramp: Option<Ramp>,
}

/// The four checkpoints of a run, in order. The first has no delay.
pub fn checkpoints(timing: &PipelineTiming) -> Vec<Checkpoint> {
    vec![
        Checkpoint {
            delay: Duration::ZERO,
            status: RunStatus::Uploading,
            log: &["File uploading..."],
            progress: Some(10),
            ramp: None,
        },
        Checkpoint {
            delay: timing.upload_delay(),
            status: RunStatus::Running,
            log: &["Successfully uploaded", "Paddle running..."],
            progress: Some(35),
            ramp: None,
        },
        Checkpoint {
            delay: timing.run_delay(),
            status: RunStatus::Analyzing,
            log: &["Analyzing..."],
            progress: None,
            ramp: Some(Ramp {
                target: timing.ramp_target,
                duration: timing.ramp_duration(),
            }),
        },
        Checkpoint {
            delay: timing.analyze_delay(),
            status: RunStatus::Done,
            log: &["Successfully analysed", "Generating output..."],
            progress: Some(100),
            ramp: None,
        },
    ]
}

/// Display state of one stage badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Active,
    Done,
}

/// A labelled stage shown next to the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageBadge {
    pub label: &'static str,
    pub state: StageState,
}

/// (label, active from, done from)
const STAGES: [(&str, RunStatus, RunStatus); 5] = [
    ("Uploading", RunStatus::Uploading, RunStatus::Uploading),
    ("Uploaded", RunStatus::Uploading, RunStatus::Running),
    ("Paddle running", RunStatus::Running, RunStatus::Analyzing),
    ("Analyzing", RunStatus::Analyzing, RunStatus::Done),
    ("Completed", RunStatus::Done, RunStatus::Done),
];

/// Badge states derived from the current run status.
pub fn stage_badges(status: RunStatus) -> [StageBadge; 5] {
    STAGES.map(|(label, active_from, done_from)| {
        let state = if status.rank() >= done_from.rank() {
            StageState::Done
        } else if status.rank() >= active_from.rank() {
            StageState::Active
        } else {
            StageState::Pending
        };
        StageBadge { label, state }
    })
}
