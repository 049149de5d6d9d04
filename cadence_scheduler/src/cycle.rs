//! Fixed-period driver around [`Scheduler::run`].
//!
//! ## RT setup (`rt` feature)
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! Without the feature every step is a no-op and the loop paces itself
//! with `std::thread::sleep`.
//!
//! ## Overruns
//! A tick that takes longer than the period is counted. The configured
//! [`OverrunPolicy`] decides whether it is only logged or stops the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OverrunPolicy;
use crate::scheduler::Scheduler;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub cycle_count: u64,
    /// Last tick duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    pub overruns: u64,
    /// Worst wake-up latency [ns] (RT loop only).
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average tick time [ns], 0 before the first tick.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error("cycle overrun at tick {tick}: {actual_ns}ns > {budget_ns}ns budget")]
    Overrun {
        tick: u64,
        actual_ns: i64,
        budget_ns: i64,
    },
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop does not page-fault on first use.
#[cfg(feature = "rt")]
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(not(feature = "rt"))]
fn prefault_stack() {}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Prepare the calling thread for the cycle loop. No-op without `rt`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Runs the scheduler once per period until stopped.
pub struct CycleRunner {
    scheduler: Scheduler,
    stats: CycleStats,
    period_ns: i64,
    overrun_policy: OverrunPolicy,
    running: Arc<AtomicBool>,
    max_ticks: Option<u64>,
}

impl CycleRunner {
    pub fn new(scheduler: Scheduler, overrun_policy: OverrunPolicy) -> Self {
        let period_ns = i64::try_from(scheduler.period().as_nanos()).unwrap_or(i64::MAX);
        Self {
            scheduler,
            stats: CycleStats::new(),
            period_ns,
            overrun_policy,
            running: Arc::new(AtomicBool::new(true)),
            max_ticks: None,
        }
    }

    /// Stop after `ticks` ticks. `None` runs until the shutdown flag clears.
    pub fn with_max_ticks(mut self, ticks: Option<u64>) -> Self {
        self.max_ticks = ticks;
        self
    }

    /// Flag polled once per tick; store `false` to stop the loop.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn into_scheduler(self) -> Scheduler {
        self.scheduler
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Enter the loop. Returns the number of ticks run.
    pub fn run(&mut self) -> Result<u64, CycleError> {
        self.run_with(|_| {})
    }

    /// Enter the loop, calling `before_tick` ahead of every tick (input
    /// sampling, scripted events).
    pub fn run_with<F>(&mut self, before_tick: F) -> Result<u64, CycleError>
    where
        F: FnMut(&mut Scheduler),
    {
        info!(
            period_ms = self.scheduler.period().as_millis() as u64,
            policy = ?self.overrun_policy,
            max_ticks = ?self.max_ticks,
            "Cycle loop starting"
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(before_tick);
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(before_tick);

        info!(
            ticks = self.stats.cycle_count,
            overruns = self.stats.overruns,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            "Cycle loop stopped"
        );
        result.map(|()| self.stats.cycle_count)
    }

    /// Run one measured tick without pacing.
    pub fn step(&mut self) -> Result<(), CycleError> {
        let start = std::time::Instant::now();
        self.scheduler.run();
        let duration_ns = i64::try_from(start.elapsed().as_nanos()).unwrap_or(i64::MAX);
        self.finish_tick(duration_ns, 0)
    }

    fn keep_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.max_ticks.is_none_or(|max| self.stats.cycle_count < max)
    }

    fn finish_tick(&mut self, duration_ns: i64, latency_ns: i64) -> Result<(), CycleError> {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns <= self.period_ns {
            return Ok(());
        }
        self.stats.overruns += 1;
        let tick = self.scheduler.clock().tick;
        match self.overrun_policy {
            OverrunPolicy::Warn => {
                warn!(
                    tick,
                    actual_ns = duration_ns,
                    budget_ns = self.period_ns,
                    "Cycle overrun"
                );
                Ok(())
            }
            OverrunPolicy::Abort => Err(CycleError::Overrun {
                tick,
                actual_ns: duration_ns,
                budget_ns: self.period_ns,
            }),
        }
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop<F>(&mut self, mut before_tick: F) -> Result<(), CycleError>
    where
        F: FnMut(&mut Scheduler),
    {
        use std::time::{Duration, Instant};

        let period = self.scheduler.period();
        let mut next_wake = Instant::now() + period;
        while self.keep_running() {
            let start = Instant::now();
            before_tick(&mut self.scheduler);
            self.scheduler.run();
            let elapsed = start.elapsed();
            self.finish_tick(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX), 0)?;

            let now = Instant::now();
            if let Some(remaining) = next_wake.checked_duration_since(now) {
                std::thread::sleep(remaining);
                next_wake += period;
            } else {
                // Behind schedule: re-anchor instead of bursting to catch up.
                debug!(late_ns = (now - next_wake).as_nanos() as u64, "Tick started late");
                next_wake = now + period.max(Duration::from_nanos(1));
            }
        }
        Ok(())
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop<F>(&mut self, mut before_tick: F) -> Result<(), CycleError>
    where
        F: FnMut(&mut Scheduler),
    {
        use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")));
        let mut next_wake = now()?;

        while self.keep_running() {
            next_wake = timespec_add_ns(next_wake, self.period_ns);

            let start = now()?;
            before_tick(&mut self.scheduler);
            self.scheduler.run();
            let end = now()?;

            let latency_ns = timespec_diff_ns(&start, &next_wake).abs();
            self.finish_tick(timespec_diff_ns(&end, &start), latency_ns)?;

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let total = ts.tv_nsec() + ns;
    TimeSpec::new(
        ts.tv_sec() + total.div_euclid(1_000_000_000),
        total.rem_euclid(1_000_000_000),
    )
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
