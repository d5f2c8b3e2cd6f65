//! Polling state machine with hysteresis.

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::rms::{relative_error, rms};
use rime_fields::{FieldError, Materialization, SnapshotSource, TimeLevel};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where the monitor is within one check cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    #[default]
    WaitingForNewLevels,
    Reconstructing,
    ComputingRms,
    Deciding,
    Steady,
}

/// Outcome of a single field within one check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldVerdict {
    Passed,
    Failed,
    /// RMS missing or zero at the newer level, or no threshold configured.
    NoVerdict,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldEvaluation {
    pub field: String,
    pub rms_older: Option<f64>,
    pub rms_newer: Option<f64>,
    pub relative_error: Option<f64>,
    pub threshold: Option<f64>,
    pub verdict: FieldVerdict,
}

/// One comparison of the two newest time levels.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldCheck {
    pub older: TimeLevel,
    pub newer: TimeLevel,
    pub fields: Vec<FieldEvaluation>,
    /// No evaluated field failed.
    pub passed: bool,
    /// Hysteresis counter after this check.
    pub steady_count: usize,
}

impl FieldCheck {
    pub fn failed_fields(&self) -> impl Iterator<Item = &FieldEvaluation> {
        self.fields
            .iter()
            .filter(|f| f.verdict == FieldVerdict::Failed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckOutcome {
    /// Fewer than two levels, or nothing newer than what was already seen.
    NoNewLevels,
    /// A level is not yet written by every partition. Retried next poll.
    Incomplete { level: TimeLevel },
    Evaluated(FieldCheck),
    /// Steady state reached; carries the newer of the two compared levels.
    Steady(TimeLevel),
}

/// Seen time levels and the running hysteresis counter.
#[derive(Clone, Debug, Default)]
pub struct ConvergenceState {
    seen: BTreeSet<TimeLevel>,
    steady_count: usize,
    phase: MonitorPhase,
}

impl ConvergenceState {
    pub fn steady_count(&self) -> usize {
        self.steady_count
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn has_seen(&self, level: &TimeLevel) -> bool {
        self.seen.contains(level)
    }
}

/// Blocking wait between polls, plus the clock the watchdog reads.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);

    /// Monotonic wall-clock reading. Only differences are used.
    fn elapsed(&self) -> Duration;
}

/// Sleeps the current thread.
#[derive(Debug)]
pub struct ThreadSleeper {
    started: Instant,
}

impl ThreadSleeper {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Detects quasi-steady state from successive solver time levels.
#[derive(Debug)]
pub struct ConvergenceMonitor {
    config: MonitorConfig,
    state: ConvergenceState,
}

impl ConvergenceMonitor {
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: ConvergenceState::default(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &ConvergenceState {
        &self.state
    }

    /// Forget seen levels and the counter, e.g. before a new solver run.
    pub fn reset(&mut self) {
        self.state = ConvergenceState::default();
    }

    /// Run one full cycle: look for new levels, materialize the newest two,
    /// compare RMS per field and update the hysteresis counter.
    ///
    /// Levels are only marked seen once they have been compared, so an
    /// incomplete or failed cycle is retried on the next call.
    pub fn check_once<S: SnapshotSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> MonitorResult<CheckOutcome> {
        if self.state.phase == MonitorPhase::Steady {
            self.reset();
        }
        self.state.phase = MonitorPhase::WaitingForNewLevels;

        let levels = source.available_levels()?;
        let new: Vec<&TimeLevel> = levels.iter().filter(|l| !self.state.has_seen(l)).collect();
        if levels.len() < 2 || new.is_empty() {
            return Ok(CheckOutcome::NoNewLevels);
        }
        info!(
            new_levels = ?new.iter().map(|l| l.name()).collect::<Vec<_>>(),
            "new time levels detected"
        );

        let last_two = [levels[levels.len() - 2].clone(), levels[levels.len() - 1].clone()];

        self.state.phase = MonitorPhase::Reconstructing;
        if let Materialization::Incomplete { level } = source.materialize(&last_two)? {
            debug!(%level, "time level incomplete, waiting");
            self.state.phase = MonitorPhase::WaitingForNewLevels;
            return Ok(CheckOutcome::Incomplete { level });
        }

        self.state.phase = MonitorPhase::ComputingRms;
        let [older, newer] = last_two;
        let mut fields = Vec::with_capacity(self.config.fields.len());
        for field in &self.config.fields {
            let rms_older = field_rms(source, field, &older)?;
            let rms_newer = field_rms(source, field, &newer)?;
            fields.push(self.evaluate(field, rms_older, rms_newer));
        }
        self.state.seen.extend(levels.iter().cloned());

        self.state.phase = MonitorPhase::Deciding;
        let passed = fields.iter().all(|f| f.verdict != FieldVerdict::Failed);
        if passed {
            self.state.steady_count += 1;
            info!(
                older = %older,
                newer = %newer,
                steady_count = self.state.steady_count,
                required = self.config.steady_count_required,
                "all fields below thresholds"
            );
        } else {
            self.state.steady_count = 0;
            for f in fields.iter().filter(|f| f.verdict == FieldVerdict::Failed) {
                info!(
                    field = %f.field,
                    error = f.relative_error.unwrap_or(f64::NAN),
                    threshold = f.threshold.unwrap_or(f64::NAN),
                    "field not converged"
                );
            }
        }

        if self.state.steady_count >= self.config.steady_count_required {
            info!(level = %newer, "steady state reached");
            self.state.phase = MonitorPhase::Steady;
            return Ok(CheckOutcome::Steady(newer));
        }

        self.state.phase = MonitorPhase::WaitingForNewLevels;
        Ok(CheckOutcome::Evaluated(FieldCheck {
            older,
            newer,
            fields,
            passed,
            steady_count: self.state.steady_count,
        }))
    }

    fn evaluate(&self, field: &str, rms_older: Option<f64>, rms_newer: Option<f64>) -> FieldEvaluation {
        let error = match (rms_older, rms_newer) {
            (Some(a), Some(b)) => relative_error(a, b),
            _ => None,
        };
        let threshold = self.config.threshold(field);
        let verdict = match (error, threshold) {
            (Some(e), Some(t)) if e < t => FieldVerdict::Passed,
            (Some(_), Some(_)) => FieldVerdict::Failed,
            _ => FieldVerdict::NoVerdict,
        };
        debug!(field, rms_older, rms_newer, relative_error = error, ?verdict, "field RMS");
        FieldEvaluation {
            field: field.to_string(),
            rms_older,
            rms_newer,
            relative_error: error,
            threshold,
            verdict,
        }
    }

    /// Poll until steady state, sleeping `poll_interval_s` between cycles.
    ///
    /// Failed cycles are logged and retried. Only steady state or an
    /// expired watchdog end the loop.
    pub fn run<S, Z>(&mut self, source: &mut S, sleeper: &mut Z) -> MonitorResult<TimeLevel>
    where
        S: SnapshotSource + ?Sized,
        Z: Sleeper + ?Sized,
    {
        info!(
            fields = ?self.config.fields,
            poll_interval_s = self.config.poll_interval_s,
            "monitoring convergence"
        );
        let started = sleeper.elapsed();
        loop {
            match self.check_once(source) {
                Ok(CheckOutcome::Steady(level)) => return Ok(level),
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    debug!(error = %e, "transient error during check, retrying");
                    self.state.phase = MonitorPhase::WaitingForNewLevels;
                }
                Err(e) => {
                    warn!(error = %e, "check failed, retrying next poll");
                    self.state.phase = MonitorPhase::WaitingForNewLevels;
                }
            }

            if let Some(limit) = self.config.watchdog() {
                let waited = sleeper.elapsed().saturating_sub(started);
                if waited >= limit {
                    return Err(MonitorError::WatchdogExpired {
                        waited_s: waited.as_secs_f64(),
                    });
                }
            }
            sleeper.sleep(self.config.poll_interval());
        }
    }
}

/// RMS of one field, or `None` when its file is absent at that level.
fn field_rms<S: SnapshotSource + ?Sized>(
    source: &S,
    field: &str,
    level: &TimeLevel,
) -> MonitorResult<Option<f64>> {
    match source.snapshot(field, level) {
        Ok(snapshot) => {
            if snapshot.skipped > 0 {
                debug!(field, %level, skipped = snapshot.skipped, "skipped malformed entries");
            }
            Ok(rms(&snapshot.values))
        }
        Err(FieldError::Missing { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
