use analytix_core::{RunError, RunOutcome, RunSnapshot};

/// Events flowing from background tasks to the TUI.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// The controller published a new state.
    Snapshot(RunSnapshot),
    /// A run started from the analysis screen has ended.
    RunFinished {
        generation: u64,
        outcome: Result<RunOutcome, RunError>,
    },
}
