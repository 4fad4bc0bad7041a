//! Audio resource graph ownership: creation, volume control, disposal.
//!
//! The platform seam is the [`AudioBackend`] trait; the web front-end
//! implements it over the Web Audio API and the native demo over a cpal
//! software synth. [`GraphManager`] owns the one live node chain and is
//! the only code allowed to touch it.

use crate::constants::VOLUME_FLOOR_DB;
use crate::error::Result;
use crate::moods::TimbreParams;

/// Platform audio primitives behind the engine.
///
/// `acquire_output` is the one operation with an external precondition:
/// most hosts refuse to open an audio output without a prior user
/// interaction. The engine surfaces that failure and does not retry
/// internally.
pub trait AudioBackend {
    type Gain;
    type Tone;
    type Noise;

    fn acquire_output(&mut self) -> Result<()>;
    fn create_gain(&mut self, level: f32) -> Result<Self::Gain>;
    fn create_tone(&mut self, out: &Self::Gain) -> Result<Self::Tone>;
    fn create_noise(&mut self, out: &Self::Gain) -> Result<Self::Noise>;
    fn set_gain(&mut self, gain: &Self::Gain, level: f32);
    fn trigger_tone(
        &mut self,
        tone: &Self::Tone,
        frequency_hz: f32,
        velocity: f32,
        delay_sec: f64,
        timbre: &TimbreParams,
    );
    fn trigger_noise(&mut self, noise: &Self::Noise, level: f32, delay_sec: f64);
    fn dispose_gain(&mut self, gain: Self::Gain) -> Result<()>;
    fn dispose_noise(&mut self, noise: Self::Noise) -> Result<()>;
    fn dispose_tone(&mut self, tone: Self::Tone) -> Result<()>;
}

/// The live tone -> gain -> output chain plus the noise generator feeding
/// the same gain. Exactly one exists while the engine is initialized.
pub struct GraphHandle<B: AudioBackend> {
    pub tone: B::Tone,
    pub noise: B::Noise,
    pub gain: B::Gain,
}

pub struct GraphManager<B: AudioBackend> {
    backend: B,
    handle: Option<GraphHandle<B>>,
    volume: f32,
}

impl<B: AudioBackend> GraphManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handle: None,
            volume: 0.5,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Build the node chain. Idempotent: returns immediately when a live
    /// handle already exists.
    pub fn initialize(&mut self, initial_volume: f32) -> Result<()> {
        if self.handle.is_some() {
            log::debug!("[graph] initialize: already built");
            return Ok(());
        }
        self.backend.acquire_output()?;
        if !initial_volume.is_nan() {
            self.volume = initial_volume.clamp(0.0, 1.0);
        }
        let gain = self.backend.create_gain(volume_to_gain(self.volume))?;
        let tone = self.backend.create_tone(&gain)?;
        let noise = self.backend.create_noise(&gain)?;
        self.handle = Some(GraphHandle { tone, noise, gain });
        log::info!("[graph] built (volume {:.2})", self.volume);
        Ok(())
    }

    /// Clamp and apply immediately; remembered and applied at build time
    /// when the graph does not exist yet. NaN is rejected, keeping the
    /// last valid level (`clamp` would pass it straight to the gain).
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            log::warn!("[graph] set_volume: NaN ignored");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = &self.handle {
            self.backend.set_gain(&handle.gain, volume_to_gain(self.volume));
        }
    }

    pub fn trigger_tone(
        &mut self,
        frequency_hz: f32,
        velocity: f32,
        delay_sec: f64,
        timbre: &TimbreParams,
    ) {
        match &self.handle {
            Some(handle) => {
                self.backend
                    .trigger_tone(&handle.tone, frequency_hz, velocity, delay_sec, timbre)
            }
            None => log::debug!("[graph] tone trigger on disposed graph; ignoring"),
        }
    }

    pub fn trigger_noise(&mut self, level: f32, delay_sec: f64) {
        match &self.handle {
            Some(handle) => self.backend.trigger_noise(&handle.noise, level, delay_sec),
            None => log::debug!("[graph] noise trigger on disposed graph; ignoring"),
        }
    }

    /// Dispose nodes in strict reverse-connection order and invalidate
    /// the handle. Idempotent; safe if never initialized. Disposal
    /// failures are logged and treated as already-clean.
    pub fn teardown(&mut self) {
        match self.handle.take() {
            Some(handle) => {
                if let Err(e) = self.backend.dispose_gain(handle.gain) {
                    log::warn!("[graph] gain dispose: {e}");
                }
                if let Err(e) = self.backend.dispose_noise(handle.noise) {
                    log::warn!("[graph] noise dispose: {e}");
                }
                if let Err(e) = self.backend.dispose_tone(handle.tone) {
                    log::warn!("[graph] tone dispose: {e}");
                }
                log::info!("[graph] torn down");
            }
            None => log::debug!("[graph] teardown: nothing to dispose"),
        }
    }
}

/// Map user volume in `[0, 1]` onto a perceptual gain curve: silence at
/// zero, the dB floor just above it, unity at one.
pub fn volume_to_gain(volume: f32) -> f32 {
    let v = volume.clamp(0.0, 1.0);
    if v.is_nan() || v <= 0.0 {
        return 0.0;
    }
    let db = VOLUME_FLOOR_DB * (1.0 - v);
    10.0_f32.powf(db / 20.0)
}
