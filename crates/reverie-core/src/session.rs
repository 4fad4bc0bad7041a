//! Playback session: the live cadence pair bound to one mood profile.
//!
//! A session owns its RNG so playback is reproducible from the engine
//! seed. Sessions are created on every transition into "playing with
//! mood M" and destroyed on the next mood change or stop; they never
//! outlive their profile binding.

use crate::constants::{
    ECHO_PROBABILITY, ECHO_SUBDIVISION_SEC, SESSION_SEED_MIX, VELOCITY_MAX, VELOCITY_MIN,
};
use crate::moods::{note_to_hz, profile_for, Mood, MoodProfile};
use rand::prelude::*;

/// One tone trigger, offset relative to its cadence fire instant.
#[derive(Clone, Copy, Debug)]
pub struct NoteEvent {
    pub frequency_hz: f32,
    pub velocity: f32,
    pub offset_sec: f64,
    pub duration_sec: f32,
}

/// One low-amplitude noise burst, offset relative to its cadence fire.
#[derive(Clone, Copy, Debug)]
pub struct AmbienceEvent {
    pub level: f32,
    pub offset_sec: f64,
}

pub struct PlaybackSession {
    mood: Mood,
    id: u64,
    rng: StdRng,
}

impl PlaybackSession {
    pub fn new(mood: Mood, engine_seed: u64, id: u64) -> Self {
        let mix = engine_seed ^ id.wrapping_mul(SESSION_SEED_MIX);
        Self {
            mood,
            id,
            rng: StdRng::seed_from_u64(mix),
        }
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn profile(&self) -> &'static MoodProfile {
        profile_for(self.mood)
    }

    /// Melodic cadence fire: one pseudo-random note from the profile's
    /// note set at a randomized velocity, plus (with fixed probability)
    /// a second note a short subdivision later for textural variation.
    pub fn melodic_fire(&mut self, out: &mut Vec<NoteEvent>) {
        let profile = self.profile();
        self.push_note(profile, 0.0, out);
        if self.rng.gen::<f32>() < ECHO_PROBABILITY {
            self.push_note(profile, ECHO_SUBDIVISION_SEC, out);
        }
    }

    /// Ambience cadence fire: a noise burst at the profile's distinct
    /// positive offset, with a little density jitter.
    pub fn ambience_fire(&mut self) -> AmbienceEvent {
        let profile = self.profile();
        let jitter = 0.8 + self.rng.gen::<f32>() * 0.4;
        AmbienceEvent {
            level: profile.ambience_density * jitter,
            offset_sec: profile.ambience_offset_sec,
        }
    }

    fn push_note(&mut self, profile: &MoodProfile, offset_sec: f64, out: &mut Vec<NoteEvent>) {
        let label = *profile.notes.choose(&mut self.rng).unwrap_or(&"A4");
        let velocity = VELOCITY_MIN + self.rng.gen::<f32>() * (VELOCITY_MAX - VELOCITY_MIN);
        match note_to_hz(label) {
            Some(frequency_hz) => out.push(NoteEvent {
                frequency_hz,
                velocity,
                offset_sec,
                duration_sec: profile.timbre.note_duration_sec,
            }),
            None => log::warn!("[session] unparseable note label {:?}", label),
        }
    }
}
