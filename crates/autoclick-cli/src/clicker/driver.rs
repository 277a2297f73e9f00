//! The click loop.
//!
//! `Initializing` probes the pointer and clicks once to seed [`LoopState`].
//! `Running` then ticks on a fixed period: probe, compare against the last
//! accepted position, and either click or stop. Both end in `Stopped` or
//! `Failed`, and a [`StopSignal`] preempts either phase, including a tick
//! that is waiting on the backend.

use std::fmt;
use std::time::Duration;

use autoclick_core::{exceeds_tolerance, BackendError, Coordinate};
use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::clicker::backend::Backend;
use crate::clicker::stop::StopSignal;

/// Timing and movement settings for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub interval: Duration,
    pub tolerance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Running,
    Stopped,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initializing => write!(f, "initializing"),
            Phase::Running => write!(f, "running"),
            Phase::Stopped => write!(f, "stopped"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// State carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopState {
    /// Position observed at the end of the last successful tick.
    pub last: Coordinate,
    pub ticks: u64,
    pub clicks: u64,
}

/// Result of a single successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Pointer stayed put and was clicked; carries the updated state.
    Clicked(LoopState),
    /// Pointer moved past the tolerance. `state.last` is still `from`.
    Moved {
        from: Coordinate,
        to: Coordinate,
        state: LoopState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    Moved { from: Coordinate, to: Coordinate },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::Moved { from, to } => write!(f, "pointer moved from {} to {}", from, to),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Stopped(StopReason),
    Failed { phase: Phase, error: BackendError },
}

/// How a run ended, plus the last state reached (if initialization finished).
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub state: Option<LoopState>,
}

impl RunReport {
    fn stopped(reason: StopReason, state: Option<LoopState>) -> Self {
        debug!("Phase: {} ({})", Phase::Stopped, reason);
        Self {
            outcome: Outcome::Stopped(reason),
            state,
        }
    }

    fn failed(phase: Phase, error: BackendError, state: Option<LoopState>) -> Self {
        debug!("Phase: {} while {}", Phase::Failed, phase);
        Self {
            outcome: Outcome::Failed { phase, error },
            state,
        }
    }

    /// Terminal phase of the run.
    pub fn phase(&self) -> Phase {
        match self.outcome {
            Outcome::Stopped(_) => Phase::Stopped,
            Outcome::Failed { .. } => Phase::Failed,
        }
    }

    /// Process exit code: 0 for a clean stop, 1 for any failure.
    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            Outcome::Stopped(_) => 0,
            Outcome::Failed { .. } => 1,
        }
    }

    pub fn clicks(&self) -> u64 {
        self.state.map_or(0, |s| s.clicks)
    }

    /// Machine-readable form for `--json`.
    pub fn summary(&self) -> RunSummary {
        let (reason, error) = match &self.outcome {
            Outcome::Stopped(reason) => (reason.to_string(), None),
            Outcome::Failed { phase, error } => {
                (format!("failed while {}", phase), Some(error.to_string()))
            }
        };
        RunSummary {
            status: self.phase(),
            reason,
            error,
            clicks: self.clicks(),
            ticks: self.state.map_or(0, |s| s.ticks),
            last: self.state.map(|s| s.last),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub status: Phase,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub clicks: u64,
    pub ticks: u64,
    pub last: Option<Coordinate>,
}

/// Probe the starting position and click once.
pub async fn initialize<B: Backend>(backend: &mut B) -> Result<LoopState, BackendError> {
    let start = backend.position().await?;
    backend.click().await?;
    info!("Clicked at {}", start);

    Ok(LoopState {
        last: start,
        ticks: 0,
        clicks: 1,
    })
}

/// Probe, compare against `state.last`, and click if the pointer held still.
pub async fn tick<B: Backend>(
    backend: &mut B,
    state: LoopState,
    tolerance: u32,
) -> Result<TickOutcome, BackendError> {
    let current = backend.position().await?;
    let state = LoopState {
        ticks: state.ticks + 1,
        ..state
    };

    if exceeds_tolerance(state.last, current, tolerance) {
        return Ok(TickOutcome::Moved {
            from: state.last,
            to: current,
            state,
        });
    }

    backend.click().await?;
    info!("Clicked at {}", current);

    Ok(TickOutcome::Clicked(LoopState {
        last: current,
        ticks: state.ticks,
        clicks: state.clicks + 1,
    }))
}

/// Run the loop until the pointer moves, `stop` is requested, or the
/// backend fails.
///
/// Ticks never overlap: the timer is only awaited again once the previous
/// tick, including its subprocess waits, has returned. Late ticks are
/// delayed rather than bunched up.
pub async fn run<B: Backend>(
    backend: &mut B,
    config: &LoopConfig,
    stop: &StopSignal,
) -> RunReport {
    debug!("Phase: {}", Phase::Initializing);
    let init = tokio::select! {
        biased;
        _ = stop.requested() => None,
        result = initialize(backend) => Some(result),
    };
    let mut state = match init {
        None => return RunReport::stopped(StopReason::Interrupted, None),
        Some(Err(error)) => return RunReport::failed(Phase::Initializing, error, None),
        Some(Ok(state)) => state,
    };

    debug!("Phase: {}", Phase::Running);
    let mut timer = interval_at(Instant::now() + config.interval, config.interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let step = tokio::select! {
            biased;
            _ = stop.requested() => None,
            result = async {
                timer.tick().await;
                tick(backend, state, config.tolerance).await
            } => Some(result),
        };

        match step {
            None => return RunReport::stopped(StopReason::Interrupted, Some(state)),
            Some(Err(error)) => return RunReport::failed(Phase::Running, error, Some(state)),
            Some(Ok(TickOutcome::Clicked(next))) => state = next,
            Some(Ok(TickOutcome::Moved { from, to, state })) => {
                info!("Pointer moved from {} to {}, stopping", from, to);
                return RunReport::stopped(StopReason::Moved { from, to }, Some(state));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use autoclick_core::BackendMode;

    use super::*;
    use crate::clicker::backend::BackendCommand;

    const HOME: Coordinate = Coordinate::new(500, 500);

    /// Replays scripted probe results. Once the script runs out, probes
    /// hang forever, like a stuck backend process.
    #[derive(Default)]
    struct ScriptedBackend {
        positions: VecDeque<Result<Coordinate, BackendError>>,
        /// 1-based index of a click attempt that should fail.
        fail_click: Option<u64>,
        probes: u64,
        clicks: u64,
    }

    impl ScriptedBackend {
        fn with_positions(positions: impl IntoIterator<Item = Coordinate>) -> Self {
            Self {
                positions: positions.into_iter().map(Ok).collect(),
                ..Self::default()
            }
        }
    }

    impl Backend for ScriptedBackend {
        async fn position(&mut self) -> Result<Coordinate, BackendError> {
            self.probes += 1;
            match self.positions.pop_front() {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }

        async fn click(&mut self) -> Result<(), BackendError> {
            self.clicks += 1;
            if self.fail_click == Some(self.clicks) {
                return Err(BackendError::command_failed(
                    BackendMode::Click,
                    Some(1),
                    "click refused",
                ));
            }
            Ok(())
        }
    }

    fn fast_config(tolerance: u32) -> LoopConfig {
        LoopConfig {
            interval: Duration::from_millis(1),
            tolerance,
        }
    }

    async fn run_with_timeout(
        backend: &mut ScriptedBackend,
        config: LoopConfig,
        stop: &StopSignal,
    ) -> RunReport {
        tokio::time::timeout(Duration::from_secs(5), run(backend, &config, stop))
            .await
            .expect("run should finish")
    }

    #[tokio::test]
    async fn test_still_pointer_keeps_clicking() {
        let mut backend = ScriptedBackend::with_positions([HOME; 6]);

        let mut state = initialize(&mut backend).await.expect("init");
        assert_eq!(state.clicks, 1);

        for _ in 0..5 {
            match tick(&mut backend, state, 10).await.expect("tick") {
                TickOutcome::Clicked(next) => state = next,
                other => panic!("Expected a click, got {:?}", other),
            }
        }

        assert_eq!(backend.clicks, 6);
        assert_eq!(state.ticks, 5);
        assert_eq!(state.clicks, 6);
        assert_eq!(state.last, HOME);
    }

    #[tokio::test]
    async fn test_small_drift_moves_baseline() {
        let positions = [500, 505, 510, 515, 520].map(|x| Coordinate::new(x, 500));
        let mut backend = ScriptedBackend::with_positions(positions);

        let mut state = initialize(&mut backend).await.expect("init");
        for expected in &positions[1..] {
            match tick(&mut backend, state, 10).await.expect("tick") {
                TickOutcome::Clicked(next) => state = next,
                other => panic!("Expected a click, got {:?}", other),
            }
            assert_eq!(state.last, *expected);
        }
        // Total drift of 20 never stopped the loop since each step was 5
        assert_eq!(state.clicks, 5);
    }

    #[tokio::test]
    async fn test_movement_stops_loop() {
        let mut backend =
            ScriptedBackend::with_positions([HOME, HOME, HOME, Coordinate::new(515, 500)]);
        let stop = StopSignal::new();

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        match report.outcome {
            Outcome::Stopped(StopReason::Moved { from, to }) => {
                assert_eq!(from, HOME);
                assert_eq!(to, Coordinate::new(515, 500));
            }
            ref other => panic!("Expected movement stop, got {:?}", other),
        }
        assert_eq!(report.exit_code(), 0);
        // Initial click plus ticks 1 and 2; tick 3 saw the movement
        assert_eq!(backend.clicks, 3);
        let state = report.state.expect("state after init");
        assert_eq!(state.ticks, 3);
        assert_eq!(state.clicks, 3);
        assert_eq!(state.last, HOME);
    }

    #[tokio::test]
    async fn test_missing_backend_fails_before_clicking() {
        let mut backend = BackendCommand::cliclick("autoclick-test-missing-backend");
        let stop = StopSignal::new();

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            run(&mut backend, &fast_config(10), &stop),
        )
        .await
        .expect("run should finish");

        match &report.outcome {
            Outcome::Failed {
                phase: Phase::Initializing,
                error: BackendError::Unavailable { .. },
            } => {}
            other => panic!("Expected Unavailable during init, got {:?}", other),
        }
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.clicks(), 0);
        assert!(report.summary().error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_interrupt_mid_tick() {
        // Initial probe succeeds, then the first tick's probe hangs
        let mut backend = ScriptedBackend::with_positions([HOME]);
        let stop = StopSignal::new();

        let producer = stop.clone();
        let interrupter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let first = producer.request();
            let second = producer.request();
            (first, second)
        });

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        assert!(matches!(
            report.outcome,
            Outcome::Stopped(StopReason::Interrupted)
        ));
        assert_eq!(report.exit_code(), 0);
        assert_eq!(backend.clicks, 1);
        assert_eq!(backend.probes, 2);

        let (first, second) = interrupter.await.expect("interrupter panicked");
        assert!(first);
        assert!(!second, "repeat interrupt should be a no-op");

        // Nothing keeps ticking after the run returned
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.probes, 2);
    }

    #[tokio::test]
    async fn test_interrupt_after_several_ticks() {
        let mut backend = ScriptedBackend::with_positions([HOME; 6]);
        let stop = StopSignal::new();

        let producer = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            producer.request();
        });

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        assert!(matches!(
            report.outcome,
            Outcome::Stopped(StopReason::Interrupted)
        ));
        let state = report.state.expect("state after init");
        assert_eq!(state.ticks, 5);
        assert_eq!(state.clicks, 6);
        assert_eq!(backend.clicks, 6);
    }

    #[tokio::test]
    async fn test_interrupt_before_start() {
        let mut backend = ScriptedBackend::with_positions([HOME]);
        let stop = StopSignal::new();
        stop.request();

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        assert!(matches!(
            report.outcome,
            Outcome::Stopped(StopReason::Interrupted)
        ));
        assert!(report.state.is_none());
        assert_eq!(backend.probes, 0);
        assert_eq!(backend.clicks, 0);
    }

    #[tokio::test]
    async fn test_initial_click_failure() {
        let mut backend = ScriptedBackend {
            fail_click: Some(1),
            ..ScriptedBackend::with_positions([HOME, HOME])
        };
        let stop = StopSignal::new();

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        assert!(matches!(
            report.outcome,
            Outcome::Failed {
                phase: Phase::Initializing,
                error: BackendError::CommandFailed { .. },
            }
        ));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(backend.probes, 1);
    }

    #[tokio::test]
    async fn test_malformed_probe_while_running() {
        let mut backend = ScriptedBackend::with_positions([HOME, HOME]);
        backend.positions.push_back(Err(BackendError::MalformedOutput {
            output: "garbage".into(),
        }));
        backend.positions.push_back(Ok(HOME));
        let stop = StopSignal::new();

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        assert!(matches!(
            report.outcome,
            Outcome::Failed {
                phase: Phase::Running,
                error: BackendError::MalformedOutput { .. },
            }
        ));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(backend.clicks, 2);
        // The probe queued after the failure is never consumed
        assert_eq!(backend.positions.len(), 1);
    }

    #[tokio::test]
    async fn test_click_failure_while_running() {
        let mut backend = ScriptedBackend {
            fail_click: Some(3),
            ..ScriptedBackend::with_positions([HOME; 5])
        };
        let stop = StopSignal::new();

        let report = run_with_timeout(&mut backend, fast_config(10), &stop).await;

        assert!(matches!(
            report.outcome,
            Outcome::Failed {
                phase: Phase::Running,
                ..
            }
        ));
        // State reflects the last successful tick only
        let state = report.state.expect("state after init");
        assert_eq!(state.clicks, 2);
        assert_eq!(backend.clicks, 3);
    }

    #[test]
    fn test_summary_json() {
        let report = RunReport {
            outcome: Outcome::Stopped(StopReason::Moved {
                from: HOME,
                to: Coordinate::new(515, 500),
            }),
            state: Some(LoopState {
                last: HOME,
                ticks: 3,
                clicks: 3,
            }),
        };

        let json = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(json["status"], "stopped");
        assert_eq!(json["clicks"], 3);
        assert_eq!(json["last"]["x"], 500);
        assert!(json["reason"].as_str().unwrap().contains("(515, 500)"));
        assert!(json.get("error").is_none());
    }
}
