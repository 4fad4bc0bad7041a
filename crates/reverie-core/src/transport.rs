//! Shared virtual clock and periodic cadence scheduling.
//!
//! The transport is started and stopped at most once per play session
//! and drives the two independent cadences (melodic, ambience). Fires
//! are drained into an out-vec by `tick`, mirroring the cooperative
//! pump the front-ends run every animation frame.

use crate::error::{EngineError, Result};
use smallvec::SmallVec;

/// Monotonic time source in seconds. Injectable so tests can drive the
/// engine without wall-clock waits.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock over `instant`, usable on both native and wasm targets.
pub struct SystemClock {
    origin: instant::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: instant::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CadenceRole {
    Melodic,
    Ambience,
}

#[derive(Clone, Debug)]
struct Cadence {
    role: CadenceRole,
    interval_sec: f64,
    next_due: f64,
}

/// One due cadence instant produced by `tick`.
#[derive(Clone, Copy, Debug)]
pub struct CadenceFire {
    pub role: CadenceRole,
    pub at_sec: f64,
}

#[derive(Default)]
pub struct Transport {
    running: bool,
    cadences: SmallVec<[Cadence; 2]>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn armed(&self) -> usize {
        self.cadences.len()
    }

    pub fn start(&mut self, now: f64) {
        if self.running {
            log::debug!("[transport] start: already running");
            return;
        }
        self.running = true;
        log::info!("[transport] started at {:.3}s", now);
    }

    pub fn stop(&mut self) {
        if !self.running {
            log::debug!("[transport] stop: not running");
            return;
        }
        self.running = false;
        self.cadences.clear();
        log::info!("[transport] stopped");
    }

    /// Disarm all cadences without stopping the clock; used when a
    /// playback session is destroyed mid-play.
    pub fn disarm_all(&mut self) {
        self.cadences.clear();
    }

    /// Arm a periodic cadence `offset_sec` from `now`. Two events armed
    /// at an identical instant would collide on the shared clock and one
    /// would be silently dropped, so an exact collision is rejected here
    /// instead.
    pub fn arm(
        &mut self,
        role: CadenceRole,
        interval_sec: f64,
        offset_sec: f64,
        now: f64,
    ) -> Result<()> {
        if !self.running {
            return Err(EngineError::scheduling("arm before transport start"));
        }
        let due = now + offset_sec;
        if self.cadences.iter().any(|c| c.next_due == due) {
            return Err(EngineError::scheduling(format!(
                "{:?} cadence collides at t={:.3}",
                role, due
            )));
        }
        self.cadences.push(Cadence {
            role,
            interval_sec: interval_sec.max(1e-3),
            next_due: due,
        });
        Ok(())
    }

    /// Drain every cadence instant due at or before `now`.
    pub fn tick(&mut self, now: f64, out: &mut Vec<CadenceFire>) {
        if !self.running {
            return;
        }
        for cadence in self.cadences.iter_mut() {
            while cadence.next_due <= now {
                out.push(CadenceFire {
                    role: cadence.role,
                    at_sec: cadence.next_due,
                });
                cadence.next_due += cadence.interval_sec;
            }
        }
    }
}
