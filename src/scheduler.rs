//! Fixed-interval scheduling with a single-flight guard.
//!
//! Runs execute on the blocking pool one at a time. A tick whose deadline
//! passes while the previous run is still busy is dropped, never queued.

use crate::error::FeedError;
use log::debug;
use log::error;
use log::info;
use log::warn;
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep_until;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub interval: Duration,
    /// Run immediately instead of one interval after start
    pub run_on_start: bool,
}

/// One scheduled invocation.
#[derive(Clone, Copy, Debug)]
pub struct Tick {
    /// 1-based run number
    pub sequence: u64,
    pub started_at: std::time::Instant,
}

/// Work invoked on every tick.
///
/// Returning `FeedError::InterruptRequested` stops the scheduler after the
/// current run without counting it as a failure.
pub trait Job: Send + Sync + 'static {
    fn run(&self, tick: &Tick) -> Result<(), FeedError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub runs: u64,
    pub failures: u64,
    /// Deadlines dropped because a run was still in progress
    pub skipped: u64,
    /// The loop ended because a job returned `FeedError::InterruptRequested`
    pub stopped_by_job: bool,
}

/// Admits at most one holder at a time.
#[derive(Clone, Debug, Default)]
pub struct SingleFlight {
    active: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the flight, or `None` while another guard is alive.
    pub fn try_acquire(&self) -> Option<FlightGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                active: Arc::clone(&self.active),
            })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the flight when dropped.
#[derive(Debug)]
pub struct FlightGuard {
    active: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    config: ScheduleConfig,
    flight: SingleFlight,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Scheduler {
            config,
            flight: SingleFlight::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Invokes `job` every interval until `shutdown` resolves.
    ///
    /// A run in progress when `shutdown` resolves is awaited before returning.
    /// After each run the next deadline is the first `run start + k * interval`
    /// that is still ahead, so consecutive starts are at least one interval apart.
    pub async fn run_until<J, F>(&self, job: Arc<J>, shutdown: F) -> ScheduleSummary
    where
        J: Job,
        F: Future<Output = ()>,
    {
        let interval = self.config.interval;
        let mut summary = ScheduleSummary::default();
        let mut sequence = 0u64;
        let mut deadline = if self.config.run_on_start {
            Instant::now()
        } else {
            Instant::now() + interval
        };
        tokio::pin!(shutdown);
        info!("Scheduler started, interval {:?}", interval);

        loop {
            debug!("Next run due in {:?}", deadline.saturating_duration_since(Instant::now()));
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = sleep_until(deadline) => {}
            }

            let Some(guard) = self.flight.try_acquire() else {
                summary.skipped += 1;
                deadline += interval;
                warn!("Previous run still active, tick dropped");
                continue;
            };
            sequence += 1;
            let started = Instant::now();
            let tick = Tick {
                sequence,
                started_at: started.into_std(),
            };
            let worker = Arc::clone(&job);
            let mut handle = tokio::task::spawn_blocking(move || {
                let _guard = guard;
                worker.run(&tick)
            });

            let mut interrupted = false;
            let result = loop {
                tokio::select! {
                    result = &mut handle => break result,
                    _ = &mut shutdown, if !interrupted => {
                        interrupted = true;
                        info!("Shutdown requested, waiting for run {} to finish", sequence);
                    }
                }
            };

            summary.runs += 1;
            match result {
                Ok(Ok(())) => debug!("Run {} finished in {:?}", sequence, started.elapsed()),
                Ok(Err(FeedError::InterruptRequested)) => {
                    info!("Run {} requested shutdown", sequence);
                    summary.stopped_by_job = true;
                    interrupted = true;
                }
                Ok(Err(error @ FeedError::SourceNotFound(_))) => {
                    summary.failures += 1;
                    warn!("Run {} skipped: {}", sequence, error);
                }
                Ok(Err(error)) => {
                    summary.failures += 1;
                    error!("Run {} failed: {}", sequence, error);
                }
                Err(join_error) => {
                    summary.failures += 1;
                    error!("Run {} failed: {}", sequence, FeedError::JobAborted(join_error.to_string()));
                }
            }
            if interrupted {
                break;
            }

            deadline = started + interval;
            let now = Instant::now();
            while deadline <= now {
                deadline += interval;
                summary.skipped += 1;
                debug!("Run {} overran its interval, deadline dropped", sequence);
            }
        }

        info!(
            "Scheduler stopped after {} runs ({} failed, {} skipped)",
            summary.runs, summary.failures, summary.skipped
        );
        summary
    }
}
