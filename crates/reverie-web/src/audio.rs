//! WebAudio implementation of the engine's audio backend.
//!
//! Tone triggers are one-shot oscillators enveloped through their own
//! gain into the tone submix; ambience triggers replay a procedurally
//! generated noise buffer. Both submixes feed the master gain, which is
//! the node the engine's volume control drives.

use reverie_core::{AudioBackend, EngineError, Result, TimbreParams, Waveform};
use web_sys as web;

pub struct WebGain {
    pub node: web::GainNode,
}

pub struct WebTone {
    submix: web::GainNode,
}

pub struct WebNoise {
    submix: web::GainNode,
    buffer: web::AudioBuffer,
}

#[derive(Default)]
pub struct WebAudioBackend {
    ctx: Option<web::AudioContext>,
}

impl WebAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn ctx(&self) -> Result<&web::AudioContext> {
        self.ctx
            .as_ref()
            .ok_or_else(|| EngineError::initialization("audio output not acquired"))
    }
}

fn create_gain(ctx: &web::AudioContext, value: f32, label: &str) -> Result<web::GainNode> {
    match web::GainNode::new(ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Ok(g)
        }
        Err(e) => {
            log::error!("{} GainNode error: {:?}", label, e);
            Err(EngineError::initialization(format!("{label} gain: {e:?}")))
        }
    }
}

// Deterministic noise via xorshift32; enough texture for ambience.
fn fill_noise(buf: &mut [f32], mut seed: u32) {
    for sample in buf.iter_mut() {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        *sample = (seed as f32 / u32::MAX as f32) * 2.0 - 1.0;
    }
}

impl AudioBackend for WebAudioBackend {
    type Gain = WebGain;
    type Tone = WebTone;
    type Noise = WebNoise;

    fn acquire_output(&mut self) -> Result<()> {
        if self.ctx.is_some() {
            return Ok(());
        }
        let ctx = web::AudioContext::new()
            .map_err(|e| EngineError::initialization(format!("AudioContext: {e:?}")))?;
        // Suspended until a user gesture; the hosting page calls
        // initialize from its click handler, so resume fires then.
        let _ = ctx.resume();
        self.ctx = Some(ctx);
        Ok(())
    }

    fn create_gain(&mut self, level: f32) -> Result<WebGain> {
        let ctx = self.ctx()?;
        let master = create_gain(ctx, level, "master")?;
        let _ = master.connect_with_audio_node(&ctx.destination());
        Ok(WebGain { node: master })
    }

    fn create_tone(&mut self, out: &WebGain) -> Result<WebTone> {
        let ctx = self.ctx()?;
        let submix = create_gain(ctx, 0.9, "tone submix")?;
        let _ = submix.connect_with_audio_node(&out.node);
        Ok(WebTone { submix })
    }

    fn create_noise(&mut self, out: &WebGain) -> Result<WebNoise> {
        let ctx = self.ctx()?;
        let submix = create_gain(ctx, 1.0, "ambience submix")?;
        let _ = submix.connect_with_audio_node(&out.node);

        let sr = ctx.sample_rate();
        let len = (sr * 2.0) as u32;
        let buffer = ctx
            .create_buffer(1, len, sr)
            .map_err(|e| EngineError::initialization(format!("noise buffer: {e:?}")))?;
        let mut samples = vec![0.0_f32; len as usize];
        fill_noise(&mut samples, 0x1234_ABCD);
        let _ = buffer.copy_to_channel(&mut samples, 0);
        Ok(WebNoise { submix, buffer })
    }

    fn set_gain(&mut self, gain: &WebGain, level: f32) {
        gain.node.gain().set_value(level);
    }

    fn trigger_tone(
        &mut self,
        tone: &WebTone,
        frequency_hz: f32,
        velocity: f32,
        delay_sec: f64,
        timbre: &TimbreParams,
    ) {
        let ctx = match self.ctx.as_ref() {
            Some(ctx) => ctx,
            None => return,
        };
        let src = match web::OscillatorNode::new(ctx) {
            Ok(s) => s,
            Err(e) => {
                log::error!("OscillatorNode error: {:?}", e);
                return;
            }
        };
        match timbre.waveform {
            Waveform::Sine => src.set_type(web::OscillatorType::Sine),
            Waveform::Square => src.set_type(web::OscillatorType::Square),
            Waveform::Saw => src.set_type(web::OscillatorType::Sawtooth),
            Waveform::Triangle => src.set_type(web::OscillatorType::Triangle),
        }
        src.frequency().set_value(frequency_hz);

        let env = match web::GainNode::new(ctx) {
            Ok(g) => g,
            Err(e) => {
                log::error!("envelope GainNode error: {:?}", e);
                return;
            }
        };
        env.gain().set_value(0.0);
        let t0 = ctx.current_time() + delay_sec + 0.005;
        let t_end = t0 + timbre.note_duration_sec as f64;
        let _ = env
            .gain()
            .linear_ramp_to_value_at_time(velocity, t0 + timbre.attack_sec as f64);
        let _ = env
            .gain()
            .linear_ramp_to_value_at_time(0.0, t_end + timbre.release_sec as f64);

        let _ = src.connect_with_audio_node(&env);
        let _ = env.connect_with_audio_node(&tone.submix);
        let _ = src.start_with_when(t0);
        let _ = src.stop_with_when(t_end + timbre.release_sec as f64 + 0.05);
    }

    fn trigger_noise(&mut self, noise: &WebNoise, level: f32, delay_sec: f64) {
        let ctx = match self.ctx.as_ref() {
            Some(ctx) => ctx,
            None => return,
        };
        let src = match web::AudioBufferSourceNode::new(ctx) {
            Ok(s) => s,
            Err(e) => {
                log::error!("AudioBufferSourceNode error: {:?}", e);
                return;
            }
        };
        src.set_buffer(Some(&noise.buffer));

        let env = match web::GainNode::new(ctx) {
            Ok(g) => g,
            Err(e) => {
                log::error!("burst GainNode error: {:?}", e);
                return;
            }
        };
        env.gain().set_value(0.0);
        let t0 = ctx.current_time() + delay_sec + 0.005;
        let _ = env.gain().linear_ramp_to_value_at_time(level, t0 + 0.1);
        let _ = env.gain().linear_ramp_to_value_at_time(0.0, t0 + 1.8);

        let _ = src.connect_with_audio_node(&env);
        let _ = env.connect_with_audio_node(&noise.submix);
        let _ = src.start_with_when(t0);
    }

    fn dispose_gain(&mut self, gain: WebGain) -> Result<()> {
        gain.node
            .disconnect()
            .map_err(|e| EngineError::disposal(format!("master: {e:?}")))
    }

    fn dispose_noise(&mut self, noise: WebNoise) -> Result<()> {
        noise
            .submix
            .disconnect()
            .map_err(|e| EngineError::disposal(format!("ambience submix: {e:?}")))
    }

    fn dispose_tone(&mut self, tone: WebTone) -> Result<()> {
        tone.submix
            .disconnect()
            .map_err(|e| EngineError::disposal(format!("tone submix: {e:?}")))
    }
}
