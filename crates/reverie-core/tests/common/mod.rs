#![allow(dead_code)]
// Shared test doubles: a manually advanced clock and a recording audio
// backend, so engine ordering can be asserted without wall-clock waits
// or a real audio output.

use reverie_core::{AudioBackend, Clock, EngineError, Result, TimbreParams};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }

    pub fn set(&self, t: f64) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Acquire,
    CreateGain(f32),
    CreateTone,
    CreateNoise,
    SetGain(f32),
    Tone { frequency_hz: f32, velocity: f32, delay_sec: f64 },
    Noise { level: f32, delay_sec: f64 },
    DisposeGain,
    DisposeNoise,
    DisposeTone,
}

#[derive(Default)]
pub struct BackendLog {
    pub ops: Vec<Op>,
    pub fail_acquire: bool,
}

impl BackendLog {
    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    pub fn last_gain(&self) -> Option<f32> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::SetGain(level) => Some(*level),
            Op::CreateGain(level) => Some(*level),
            _ => None,
        })
    }
}

/// Records every backend call; node handles are plain counters.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    pub log: Rc<RefCell<BackendLog>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let backend = Self::default();
        backend.log.borrow_mut().fail_acquire = true;
        backend
    }
}

impl AudioBackend for RecordingBackend {
    type Gain = u32;
    type Tone = u32;
    type Noise = u32;

    fn acquire_output(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.fail_acquire {
            return Err(EngineError::initialization("no user gesture yet"));
        }
        log.ops.push(Op::Acquire);
        Ok(())
    }

    fn create_gain(&mut self, level: f32) -> Result<u32> {
        self.log.borrow_mut().ops.push(Op::CreateGain(level));
        Ok(0)
    }

    fn create_tone(&mut self, _out: &u32) -> Result<u32> {
        self.log.borrow_mut().ops.push(Op::CreateTone);
        Ok(1)
    }

    fn create_noise(&mut self, _out: &u32) -> Result<u32> {
        self.log.borrow_mut().ops.push(Op::CreateNoise);
        Ok(2)
    }

    fn set_gain(&mut self, _gain: &u32, level: f32) {
        self.log.borrow_mut().ops.push(Op::SetGain(level));
    }

    fn trigger_tone(
        &mut self,
        _tone: &u32,
        frequency_hz: f32,
        velocity: f32,
        delay_sec: f64,
        _timbre: &TimbreParams,
    ) {
        self.log.borrow_mut().ops.push(Op::Tone {
            frequency_hz,
            velocity,
            delay_sec,
        });
    }

    fn trigger_noise(&mut self, _noise: &u32, level: f32, delay_sec: f64) {
        self.log.borrow_mut().ops.push(Op::Noise { level, delay_sec });
    }

    fn dispose_gain(&mut self, _gain: u32) -> Result<()> {
        self.log.borrow_mut().ops.push(Op::DisposeGain);
        Ok(())
    }

    fn dispose_noise(&mut self, _noise: u32) -> Result<()> {
        self.log.borrow_mut().ops.push(Op::DisposeNoise);
        Ok(())
    }

    fn dispose_tone(&mut self, _tone: u32) -> Result<()> {
        self.log.borrow_mut().ops.push(Op::DisposeTone);
        Ok(())
    }
}
