//! Fixed-step tick driver.
//!
//! Every tick advances the simulation by exactly one `timestep`; with realtime
//! pacing enabled the driver also sleeps so ticks land on a wall-clock cadence.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use fragfall_shared::{PhysicsAdapter, Simulation};

use crate::emit::SnapshotSink;

/// Falling behind by more than this resets the pacing schedule instead of
/// bursting to catch up.
const MAX_LAG: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    pub max_ticks: Option<u64>,
    pub realtime: bool,
    pub stop_when_empty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub ticks: u64,
    pub splits: usize,
    pub despawned: usize,
    pub reason: StopReason,
}

/// Seconds between `last` and `now`, or `None` if the clock went backwards.
pub fn delta_time(now: Instant, last: Instant) -> Option<f32> {
    now.checked_duration_since(last)
        .map(|dur| dur.as_micros() as f32 / 1_000_000.0)
}

/// Tick `sim` until the tick cap is hit or (optionally) every fragment is gone.
pub fn run<P: PhysicsAdapter>(
    sim: &mut Simulation<P>,
    config: DriverConfig,
    sink: &mut dyn SnapshotSink,
) -> Result<RunOutcome> {
    let interval = Duration::from_secs_f32(sim.settings().timestep);
    let mut outcome = RunOutcome {
        ticks: 0,
        splits: 0,
        despawned: 0,
        reason: StopReason::TickLimit,
    };

    let mut last_tick = Instant::now();
    let mut deadline = last_tick + interval;

    loop {
        if config.max_ticks.is_some_and(|max| outcome.ticks >= max) {
            outcome.reason = StopReason::TickLimit;
            break;
        }

        sim.tick();
        let report = sim.last_report();
        sink.emit(report, sim.snapshot())?;

        outcome.ticks += 1;
        outcome.splits += report.resolve.splits;
        outcome.despawned += report.despawned.len();

        if config.stop_when_empty && sim.is_empty() {
            outcome.reason = StopReason::Empty;
            break;
        }

        if config.realtime {
            let now = Instant::now();
            if let Some(real_dt) = delta_time(now, last_tick) {
                tracing::trace!(real_dt, "tick");
            }
            last_tick = now;

            if now < deadline {
                thread::sleep(deadline - now);
                deadline += interval;
            } else if now - deadline > MAX_LAG {
                tracing::warn!(
                    behind_ms = (now - deadline).as_millis() as u64,
                    "tick driver fell behind; resetting schedule"
                );
                deadline = now + interval;
            } else {
                deadline += interval;
            }
        }
    }

    sink.finish()?;
    tracing::info!(
        ticks = outcome.ticks,
        splits = outcome.splits,
        despawned = outcome.despawned,
        reason = ?outcome.reason,
        "driver stopped"
    );
    Ok(outcome)
}
