//! Simulated analysis progress controller.
//!
//! A run walks the checkpoints from [`crate::pipeline`] on a spawned task,
//! with a progress ramp layered on top during `analyzing`. Status, progress
//! and log sit behind one mutex and change together. Every run carries a
//! generation number and a [`CancellationToken`]; `reset()` bumps the
//! generation and cancels the token, and each timer callback re-checks the
//! generation under the lock before touching state, so callbacks from a
//! superseded run are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::interpolate::{Interpolation, run_ramp};
use crate::pipeline::{self, Checkpoint};
use crate::{InputFile, PipelineTiming, ResultRecord, RunError, RunStatus};

/// Observable state of the analysis screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub progress: u8,
    pub log: Vec<String>,
    pub input: Option<InputFile>,
    /// Newest first.
    pub results: Vec<ResultRecord>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(ResultRecord),
    /// A reset (or a newer run) took over before the run reached `done`.
    Superseded,
}

/// Handle to an in-flight run. Dropping it does not stop the run.
#[derive(Debug)]
pub struct RunHandle {
    generation: u64,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to reach `done` or be superseded.
    pub async fn wait(self) -> Result<RunOutcome, RunError> {
        self.task
            .await
            .map_err(|e| RunError::TaskFailed(e.to_string()))
    }
}

#[derive(Debug, Default)]
struct RunState {
    status: RunStatus,
    progress: u8,
    log: Vec<String>,
    input: Option<InputFile>,
    results: Vec<ResultRecord>,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl RunState {
    fn apply(&mut self, checkpoint: &Checkpoint) {
        self.status = checkpoint.status;
        self.log.extend(checkpoint.log.iter().map(|line| line.to_string()));
        if let Some(progress) = checkpoint.progress {
            self.progress = progress;
        }
    }

    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            status: self.status,
            progress: self.progress,
            log: self.log.clone(),
            input: self.input.clone(),
            results: self.results.clone(),
        }
    }
}

struct Shared {
    state: Mutex<RunState>,
    snapshots: watch::Sender<RunSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RunState) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Run `f` against the state if `generation` is still current.
    fn update<T>(&self, generation: u64, f: impl FnOnce(&mut RunState) -> T) -> Option<T> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }
        let out = f(&mut state);
        self.publish(&state);
        Some(out)
    }

    /// Ramp sink: raise progress while this run is still analyzing.
    fn advance_ramp(&self, generation: u64, value: u8) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.status != RunStatus::Analyzing {
            return false;
        }
        if value > state.progress {
            state.progress = value;
            self.publish(&state);
        }
        true
    }
}

/// Drives the analysis state machine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AnalysisController {
    shared: Arc<Shared>,
    timing: Arc<PipelineTiming>,
}

impl Default for AnalysisController {
    fn default() -> Self {
        Self::new(PipelineTiming::default())
    }
}

impl std::fmt::Debug for AnalysisController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("AnalysisController")
            .field("status", &state.status)
            .field("progress", &state.progress)
            .field("generation", &state.generation)
            .field("results", &state.results.len())
            .finish()
    }
}

impl AnalysisController {
    pub fn new(timing: PipelineTiming) -> Self {
        let (snapshots, _) = watch::channel(RunSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RunState::default()),
                snapshots,
            }),
            timing: Arc::new(timing),
        }
    }

    pub fn timing(&self) -> &PipelineTiming {
        &self.timing
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.shared.lock().snapshot()
    }

    /// Receiver that sees every published state change (latest value wins).
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Remember the file the next run will use. The allow-list is advisory.
    pub fn select_input(&self, file: InputFile) {
        if !file.is_allowed() {
            log::warn!(
                "{} has an extension outside the advertised allow-list",
                file.name
            );
        }
        let mut state = self.shared.lock();
        state.input = Some(file);
        self.shared.publish(&state);
    }

    /// Start a run on the selected input.
    ///
    /// The first checkpoint is applied before this returns; the rest happen
    /// on a task spawned on the current Tokio runtime. Fails without touching
    /// state when there is no runtime, no input is selected or a run is
    /// already in flight.
    pub fn start(&self) -> Result<RunHandle, RunError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RunError::NoRuntime)?;
        let mut plan = pipeline::checkpoints(&self.timing).into_iter();

        let (generation, cancel, input) = {
            let mut state = self.shared.lock();
            let Some(input) = state.input.clone() else {
                return Err(RunError::NoInputSelected);
            };
            if state.status.is_in_flight() {
                return Err(RunError::RunAlreadyInProgress);
            }

            state.generation += 1;
            let cancel = CancellationToken::new();
            if let Some(previous) = state.cancel.replace(cancel.clone()) {
                previous.cancel();
            }
            state.log.clear();
            if let Some(first) = plan.next() {
                state.apply(&first);
            }
            self.shared.publish(&state);
            (state.generation, cancel, input)
        };

        log::info!("run {generation}: started on {}", input.name);

        let task = runtime.spawn(drive(
            self.shared.clone(),
            plan.collect(),
            generation,
            cancel,
            self.timing.frame_interval(),
            input,
        ));

        Ok(RunHandle { generation, task })
    }

    /// Return the screen to its initial state, dropping results and
    /// superseding any in-flight run.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        let generation = state.generation + 1;
        *state = RunState {
            generation,
            ..RunState::default()
        };
        self.shared.publish(&state);
        log::info!("analysis reset (generation {generation})");
    }
}

async fn drive(
    shared: Arc<Shared>,
    plan: Vec<Checkpoint>,
    generation: u64,
    cancel: CancellationToken,
    frame: Duration,
    input: InputFile,
) -> RunOutcome {
    let mut ramp_task: Option<JoinHandle<()>> = None;

    let outcome = 'run: {
        for checkpoint in plan {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'run RunOutcome::Superseded,
                _ = tokio::time::sleep(checkpoint.delay) => {}
            }

            let applied = shared.update(generation, |state| {
                state.apply(&checkpoint);
                let record = (checkpoint.status == RunStatus::Done).then(|| {
                    let record = ResultRecord::synthesize(state.results.len() + 1, &input);
                    state.results.insert(0, record.clone());
                    record
                });
                (state.progress, record)
            });

            let Some((progress, record)) = applied else {
                break 'run RunOutcome::Superseded;
            };
            log::debug!("run {generation}: {:?} at {progress}%", checkpoint.status);

            if let Some(record) = record {
                break 'run RunOutcome::Completed(record);
            }

            if let Some(ramp) = checkpoint.ramp {
                let interp = Interpolation::new(progress, ramp.target, ramp.duration);
                let shared = shared.clone();
                let cancel = cancel.clone();
                ramp_task = Some(tokio::spawn(async move {
                    run_ramp(interp, frame, cancel, |value| {
                        shared.advance_ramp(generation, value)
                    })
                    .await;
                }));
            }
        }
        RunOutcome::Superseded
    };

    if let Some(task) = ramp_task {
        task.abort();
    }

    match &outcome {
        RunOutcome::Completed(record) => {
            log::info!("run {generation}: completed, {} row(s)", record.ordinal)
        }
        RunOutcome::Superseded => log::info!("run {generation}: superseded"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller_with(file: &str, size: u64) -> AnalysisController {
        let controller = AnalysisController::default();
        controller.select_input(InputFile::new(file, size));
        controller
    }

    #[tokio::test(start_paused = true)]
    async fn start_without_input_is_rejected() {
        let controller = AnalysisController::default();
        let err = controller.start().unwrap_err();
        assert_eq!(err, RunError::NoInputSelected);
        assert_eq!(controller.snapshot(), RunSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoints_land_on_schedule() {
        let controller = controller_with("notes.txt", 100);
        let handle = controller.start().unwrap();

        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Uploading);
        assert_eq!(snap.progress, 10);
        assert_eq!(snap.log, vec!["File uploading..."]);

        sleep(ms(601)).await;
        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.progress, 35);
        assert_eq!(
            snap.log,
            vec!["File uploading...", "Successfully uploaded", "Paddle running..."]
        );

        sleep(ms(900)).await;
        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Analyzing);
        assert_eq!(snap.log.last().map(String::as_str), Some("Analyzing..."));
        assert!(snap.progress >= 35 && snap.progress < 98);

        sleep(ms(1300)).await;
        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Analyzing);
        assert_eq!(snap.progress, 98);

        let outcome = handle.wait().await.unwrap();
        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Done);
        assert_eq!(snap.progress, 100);
        assert_eq!(snap.log.len(), 6);
        assert_eq!(snap.results.len(), 1);
        assert_eq!(outcome, RunOutcome::Completed(snap.results[0].clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_never_decreases() {
        let controller = controller_with("scan.png", 4096);
        let handle = controller.start().unwrap();

        let sampler = {
            let controller = controller.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    let snap = controller.snapshot();
                    seen.push(snap.progress);
                    if snap.status == RunStatus::Done {
                        break seen;
                    }
                    sleep(ms(5)).await;
                }
            })
        };

        handle.wait().await.unwrap();
        let seen = sampler.await.unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.iter().any(|&p| p > 35 && p < 98));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_in_flight_is_rejected() {
        let controller = controller_with("a.csv", 10);
        let handle = controller.start().unwrap();
        sleep(ms(700)).await;

        let before = controller.snapshot();
        assert_eq!(
            controller.start().unwrap_err(),
            RunError::RunAlreadyInProgress
        );
        assert_eq!(controller.snapshot(), before);

        handle.wait().await.unwrap();
        assert_eq!(controller.snapshot().results.len(), 1);
        assert_eq!(controller.snapshot().log.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_record_for_pdf() {
        let controller = controller_with("report.PDF", 2048);
        let outcome = controller.start().unwrap().wait().await.unwrap();
        let RunOutcome::Completed(record) = outcome else {
            panic!("run did not complete");
        };
        assert_eq!(record.ordinal, 1);
        assert_eq!(record.file_type, "PDF");
        assert_eq!(record.description, "Uploaded 2 KB PDF file");
        assert_eq!(
            record.insights,
            "Auto-detected structure. No critical issues. PDF parsed."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_runs_prepend_with_next_ordinal() {
        let controller = controller_with("first.txt", 1);
        controller.start().unwrap().wait().await.unwrap();
        controller.select_input(InputFile::new("second.json", 1));
        controller.start().unwrap().wait().await.unwrap();

        let results = controller.snapshot().results;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ordinal, 2);
        assert_eq!(results[0].file_name, "second.json");
        assert_eq!(results[1].ordinal, 1);
        assert_eq!(results[1].file_name, "first.txt");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_done_resets_log() {
        let controller = controller_with("first.txt", 1);
        controller.start().unwrap().wait().await.unwrap();
        controller.start().unwrap();

        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Uploading);
        assert_eq!(snap.progress, 10);
        assert_eq!(snap.log, vec!["File uploading..."]);
        assert_eq!(snap.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_yields_initial_state() {
        let controller = controller_with("data.json", 10);
        controller.start().unwrap().wait().await.unwrap();
        controller.reset();
        assert_eq!(controller.snapshot(), RunSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_mid_run_cancels_pending_steps() {
        let controller = controller_with("data.json", 10);
        let handle = controller.start().unwrap();
        sleep(ms(1600)).await;
        assert_eq!(controller.snapshot().status, RunStatus::Analyzing);

        controller.reset();
        assert_eq!(handle.wait().await.unwrap(), RunOutcome::Superseded);

        sleep(ms(5000)).await;
        assert_eq!(controller.snapshot(), RunSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_run_does_not_leak_into_new_run() {
        let controller = controller_with("old.txt", 10);
        let stale = controller.start().unwrap();
        sleep(ms(1000)).await;

        controller.reset();
        controller.select_input(InputFile::new("new.txt", 10));
        let fresh = controller.start().unwrap();
        assert!(fresh.generation() > stale.generation());

        // The stale run would have hit `analyzing` at 1500ms.
        sleep(ms(550)).await;
        let snap = controller.snapshot();
        assert_eq!(snap.status, RunStatus::Uploading);
        assert_eq!(snap.log, vec!["File uploading..."]);

        assert_eq!(stale.wait().await.unwrap(), RunOutcome::Superseded);
        let RunOutcome::Completed(record) = fresh.wait().await.unwrap() else {
            panic!("fresh run did not complete");
        };
        assert_eq!(record.ordinal, 1);
        assert_eq!(record.file_name, "new.txt");

        let snap = controller.snapshot();
        assert_eq!(snap.results.len(), 1);
        assert_eq!(snap.log.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_final_state() {
        let controller = controller_with("a.txt", 1);
        let mut rx = controller.subscribe();
        controller.start().unwrap();

        let snap = rx
            .wait_for(|s| s.status == RunStatus::Done)
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.progress, 100);
        assert_eq!(snap.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delays_still_complete() {
        let controller = AnalysisController::new(PipelineTiming {
            upload_delay_ms: 0,
            run_delay_ms: 0,
            analyze_delay_ms: 0,
            ramp_duration_ms: 0,
            ..Default::default()
        });
        controller.select_input(InputFile::new("quick.txt", 1));
        let outcome = controller.start().unwrap().wait().await.unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(controller.snapshot().progress, 100);
    }

    #[test]
    fn start_outside_runtime_leaves_state_untouched() {
        let controller = AnalysisController::new(PipelineTiming {
            upload_delay_ms: 0,
            run_delay_ms: 0,
            analyze_delay_ms: 0,
            ramp_duration_ms: 0,
            ..Default::default()
        });
        controller.select_input(InputFile::new("offline.csv", 10));
        let before = controller.snapshot();

        assert_eq!(controller.start().unwrap_err(), RunError::NoRuntime);
        assert_eq!(controller.snapshot(), before);

        // Not stuck in flight: a later start inside a runtime goes through.
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let outcome = rt.block_on(async { controller.start().unwrap().wait().await.unwrap() });
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(controller.snapshot().results.len(), 1);
    }
}
