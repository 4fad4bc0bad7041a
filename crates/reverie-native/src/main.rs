//! Native playback demo: drives the soundscape engine through a cpal
//! output stream with a small sample-accurate software synth, cycling
//! through the full mood set.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use reverie_core::{
    AudioBackend, EngineConfig, EngineError, Mood, Result as EngineResult, SoundscapeEngine,
    SystemClock, TimbreParams, Waveform,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// ---------------- cpal-backed synth ----------------

#[derive(Clone)]
struct Voice {
    amplitude: f32,
    phase: f32,     // radians
    phase_inc: f32, // radians per sample
    delay_samples: u32,
    total_samples: u32,
    samples_emitted: u32,
    attack_samples: u32,
    release_samples: u32,
    wave: Waveform,
}

#[derive(Clone)]
struct Burst {
    level: f32,
    delay_samples: u32,
    total_samples: u32,
    samples_emitted: u32,
    seed: u32,
}

struct SynthState {
    sample_rate: f32,
    master_gain: f32,
    voices: Vec<Voice>,
    bursts: Vec<Burst>,
}

/// Marker handles: the synth keeps one master gain and two trigger
/// channels inside the shared state.
pub struct MasterGain;
pub struct ToneChannel;
pub struct NoiseChannel;

pub struct CpalBackend {
    shared: Arc<Mutex<SynthState>>,
    stream: Option<cpal::Stream>,
    burst_counter: u32,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(SynthState {
                sample_rate: 44_100.0,
                master_gain: 0.0,
                voices: Vec::new(),
                bursts: Vec::new(),
            })),
            stream: None,
            burst_counter: 0,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SynthState> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    type Gain = MasterGain;
    type Tone = ToneChannel;
    type Noise = NoiseChannel;

    fn acquire_output(&mut self) -> EngineResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::initialization("no default output device"))?;
        let config = device
            .default_output_config()
            .map_err(|e| EngineError::initialization(format!("output config: {e}")))?;
        let channels = config.channels() as usize;
        self.lock().sample_rate = config.sample_rate().0 as f32;

        let err_fn = |err| log::error!("audio stream error: {err}");
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream_f32(
                &device,
                &config.into(),
                channels,
                Arc::clone(&self.shared),
                err_fn,
            ),
            cpal::SampleFormat::I16 => build_stream_i16(
                &device,
                &config.into(),
                channels,
                Arc::clone(&self.shared),
                err_fn,
            ),
            other => {
                return Err(EngineError::initialization(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| EngineError::initialization(format!("build stream: {e}")))?;
        stream
            .play()
            .map_err(|e| EngineError::initialization(format!("play: {e}")))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn create_gain(&mut self, level: f32) -> EngineResult<MasterGain> {
        self.lock().master_gain = level;
        Ok(MasterGain)
    }

    fn create_tone(&mut self, _out: &MasterGain) -> EngineResult<ToneChannel> {
        Ok(ToneChannel)
    }

    fn create_noise(&mut self, _out: &MasterGain) -> EngineResult<NoiseChannel> {
        Ok(NoiseChannel)
    }

    fn set_gain(&mut self, _gain: &MasterGain, level: f32) {
        self.lock().master_gain = level;
    }

    fn trigger_tone(
        &mut self,
        _tone: &ToneChannel,
        frequency_hz: f32,
        velocity: f32,
        delay_sec: f64,
        timbre: &TimbreParams,
    ) {
        let mut state = self.lock();
        let sr = state.sample_rate;
        let total = ((timbre.note_duration_sec + timbre.release_sec) * sr) as u32;
        let attack = (timbre.attack_sec * sr) as u32;
        let release = (timbre.release_sec * sr) as u32;
        state.voices.push(Voice {
            amplitude: velocity.min(1.0),
            phase: 0.0,
            phase_inc: 2.0 * std::f32::consts::PI * frequency_hz / sr,
            delay_samples: (delay_sec * sr as f64) as u32,
            total_samples: total.max(1),
            samples_emitted: 0,
            attack_samples: attack.min(total),
            release_samples: release.min(total),
            wave: timbre.waveform,
        });
    }

    fn trigger_noise(&mut self, _noise: &NoiseChannel, level: f32, delay_sec: f64) {
        self.burst_counter = self.burst_counter.wrapping_add(1);
        let mut state = self.lock();
        let sr = state.sample_rate;
        state.bursts.push(Burst {
            level,
            delay_samples: (delay_sec * sr as f64) as u32,
            total_samples: (1.8 * sr) as u32,
            samples_emitted: 0,
            seed: 0x7890_FEDC ^ self.burst_counter.wrapping_mul(0x9E37_79B9),
        });
    }

    fn dispose_gain(&mut self, _gain: MasterGain) -> EngineResult<()> {
        self.lock().master_gain = 0.0;
        Ok(())
    }

    fn dispose_noise(&mut self, _noise: NoiseChannel) -> EngineResult<()> {
        self.lock().bursts.clear();
        Ok(())
    }

    fn dispose_tone(&mut self, _tone: ToneChannel) -> EngineResult<()> {
        self.lock().voices.clear();
        Ok(())
    }
}

fn render_wave_sample(phase: f32, wave: Waveform) -> f32 {
    match wave {
        Waveform::Sine => phase.sin(),
        Waveform::Square => {
            if phase.sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Saw => {
            let t = phase / (2.0 * std::f32::consts::PI);
            (2.0 * (t - t.floor())) * 2.0 - 1.0
        }
        Waveform::Triangle => {
            let t = phase / (2.0 * std::f32::consts::PI);
            let saw = (2.0 * (t - t.floor())) * 2.0 - 1.0;
            (2.0 / std::f32::consts::PI) * saw.asin()
        }
    }
}

fn envelope(n: u32, total: u32, attack: u32, release: u32) -> f32 {
    if n < attack {
        n as f32 / attack.max(1) as f32
    } else if n > total.saturating_sub(release) {
        let rel_n = n.saturating_sub(total - release);
        1.0 - (rel_n as f32 / release.max(1) as f32)
    } else {
        1.0
    }
}

fn mix_sample(state: &mut SynthState) -> f32 {
    let mut mixed = 0.0f32;
    let mut i = 0usize;
    while i < state.voices.len() {
        let voice = &mut state.voices[i];
        if voice.delay_samples > 0 {
            voice.delay_samples -= 1;
            i += 1;
            continue;
        }
        let amp = voice.amplitude
            * envelope(
                voice.samples_emitted,
                voice.total_samples,
                voice.attack_samples,
                voice.release_samples,
            );
        mixed += render_wave_sample(voice.phase, voice.wave) * amp;
        voice.phase += voice.phase_inc;
        if voice.phase > 2.0 * std::f32::consts::PI {
            voice.phase -= 2.0 * std::f32::consts::PI;
        }
        voice.samples_emitted += 1;
        if voice.samples_emitted >= voice.total_samples {
            state.voices.swap_remove(i);
            continue;
        }
        i += 1;
    }

    let mut b = 0usize;
    while b < state.bursts.len() {
        let burst = &mut state.bursts[b];
        if burst.delay_samples > 0 {
            burst.delay_samples -= 1;
            b += 1;
            continue;
        }
        burst.seed ^= burst.seed << 13;
        burst.seed ^= burst.seed >> 17;
        burst.seed ^= burst.seed << 5;
        let noise = (burst.seed as f32 / u32::MAX as f32) * 2.0 - 1.0;
        let env = envelope(
            burst.samples_emitted,
            burst.total_samples,
            burst.total_samples / 8,
            burst.total_samples / 2,
        );
        mixed += noise * burst.level * env;
        burst.samples_emitted += 1;
        if burst.samples_emitted >= burst.total_samples {
            state.bursts.swap_remove(b);
            continue;
        }
        b += 1;
    }

    (mixed * state.master_gain).tanh()
}

fn build_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    state: Arc<Mutex<SynthState>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_output_stream(
        config,
        move |data: &mut [f32], _| {
            let mut guard = match state.lock() {
                Ok(g) => g,
                Err(p) => p.into_inner(),
            };
            for frame in data.chunks_mut(channels) {
                let sample = mix_sample(&mut guard);
                for out in frame.iter_mut() {
                    *out = sample;
                }
            }
        },
        err_fn,
        None,
    )
}

fn build_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    state: Arc<Mutex<SynthState>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_output_stream(
        config,
        move |data: &mut [i16], _| {
            let mut guard = match state.lock() {
                Ok(g) => g,
                Err(p) => p.into_inner(),
            };
            for frame in data.chunks_mut(channels) {
                let sample = (mix_sample(&mut guard) * i16::MAX as f32) as i16;
                for out in frame.iter_mut() {
                    *out = sample;
                }
            }
        },
        err_fn,
        None,
    )
}

// ---------------- demo driver ----------------

const MOOD_DWELL_SEC: f64 = 10.0;
const PUMP_INTERVAL_MS: u64 = 15;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut engine = SoundscapeEngine::new(CpalBackend::new(), SystemClock::new(), EngineConfig::default());
    engine
        .initialize(0.7)
        .map_err(|e| anyhow!("initialize: {e}"))?;
    engine.start();
    log::info!("cycling through {} moods, {MOOD_DWELL_SEC}s each", Mood::ALL.len());

    for mood in Mood::ALL {
        engine.change_mood(mood.label());
        let dwell = Duration::from_secs_f64(MOOD_DWELL_SEC);
        let started = std::time::Instant::now();
        while started.elapsed() < dwell {
            engine.tick();
            thread::sleep(Duration::from_millis(PUMP_INTERVAL_MS));
        }
    }

    engine.stop();
    // let the debounced stop resolve before tearing down
    let settle = std::time::Instant::now();
    while settle.elapsed() < Duration::from_millis(400) {
        engine.tick();
        thread::sleep(Duration::from_millis(PUMP_INTERVAL_MS));
    }
    engine.teardown();
    Ok(())
}
