//! Static mood profile table: mood label -> musical parameters.
//!
//! Profiles are defined at process start and never mutated. Lookup by an
//! unrecognized label resolves to a caller-supplied fallback mood rather
//! than failing; live playback prefers a wrong soundscape over no
//! soundscape.

use fnv::FnvHashMap;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    Peaceful,
    Mysterious,
    Dramatic,
    Cheerful,
    Melancholic,
    Cosmic,
    Galactic,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Peaceful,
        Mood::Mysterious,
        Mood::Dramatic,
        Mood::Cheerful,
        Mood::Melancholic,
        Mood::Cosmic,
        Mood::Galactic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Peaceful => "peaceful",
            Mood::Mysterious => "mysterious",
            Mood::Dramatic => "dramatic",
            Mood::Cheerful => "cheerful",
            Mood::Melancholic => "melancholic",
            Mood::Cosmic => "cosmic",
            Mood::Galactic => "galactic",
        }
    }

    /// Strict parse of a lowercase-insensitive mood label.
    pub fn parse(label: &str) -> Option<Mood> {
        let lower = label.trim().to_ascii_lowercase();
        label_map().get(lower.as_str()).copied()
    }

    /// Resolve a label from an external scorer, falling back to `fallback`
    /// for anything outside the closed mood set.
    pub fn resolve(label: &str, fallback: Mood) -> Mood {
        match Self::parse(label) {
            Some(mood) => mood,
            None => {
                log::info!(
                    "[moods] unrecognized label {:?}; falling back to {}",
                    label,
                    fallback.label()
                );
                fallback
            }
        }
    }
}

fn label_map() -> &'static FnvHashMap<&'static str, Mood> {
    static MAP: OnceLock<FnvHashMap<&'static str, Mood>> = OnceLock::new();
    MAP.get_or_init(|| Mood::ALL.iter().map(|m| (m.label(), *m)).collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

#[derive(Clone, Copy, Debug)]
pub struct TimbreParams {
    pub waveform: Waveform,
    pub attack_sec: f32,
    pub release_sec: f32,
    pub note_duration_sec: f32,
}

/// Immutable musical parameter set bound to one mood label.
#[derive(Clone, Copy, Debug)]
pub struct MoodProfile {
    pub mood: Mood,
    /// Ordered note-label set the melodic cadence draws from.
    pub notes: &'static [&'static str],
    pub melodic_cadence_sec: f64,
    pub ambience_cadence_sec: f64,
    /// Amplitude scalar for the ambience noise bursts.
    pub ambience_density: f32,
    /// Mood-specific positive delay applied to each ambience trigger.
    /// Distinct across the mood set so concurrently armed cadences can
    /// never collide at the same transport instant.
    pub ambience_offset_sec: f64,
    pub timbre: TimbreParams,
}

// Indexed by `Mood as usize`; order must match `Mood::ALL`.
pub static PROFILES: [MoodProfile; 7] = [
    MoodProfile {
        mood: Mood::Peaceful,
        notes: &["C4", "D4", "E4", "G4", "A4", "C5"],
        melodic_cadence_sec: 2.5,
        ambience_cadence_sec: 7.0,
        ambience_density: 0.12,
        ambience_offset_sec: 0.10,
        timbre: TimbreParams {
            waveform: Waveform::Sine,
            attack_sec: 0.08,
            release_sec: 1.2,
            note_duration_sec: 2.0,
        },
    },
    MoodProfile {
        mood: Mood::Mysterious,
        notes: &["D4", "F4", "G4", "A4", "C5", "D5"],
        melodic_cadence_sec: 3.2,
        ambience_cadence_sec: 6.0,
        ambience_density: 0.18,
        ambience_offset_sec: 0.16,
        timbre: TimbreParams {
            waveform: Waveform::Triangle,
            attack_sec: 0.15,
            release_sec: 1.8,
            note_duration_sec: 2.6,
        },
    },
    MoodProfile {
        mood: Mood::Dramatic,
        notes: &["A3", "C4", "E4", "F4", "A4", "B4"],
        melodic_cadence_sec: 1.6,
        ambience_cadence_sec: 4.0,
        ambience_density: 0.30,
        ambience_offset_sec: 0.22,
        timbre: TimbreParams {
            waveform: Waveform::Saw,
            attack_sec: 0.02,
            release_sec: 0.8,
            note_duration_sec: 1.2,
        },
    },
    MoodProfile {
        mood: Mood::Cheerful,
        notes: &["C4", "E4", "G4", "A4", "C5", "E5"],
        melodic_cadence_sec: 1.2,
        ambience_cadence_sec: 5.0,
        ambience_density: 0.15,
        ambience_offset_sec: 0.28,
        timbre: TimbreParams {
            waveform: Waveform::Triangle,
            attack_sec: 0.01,
            release_sec: 0.5,
            note_duration_sec: 0.8,
        },
    },
    MoodProfile {
        mood: Mood::Melancholic,
        notes: &["A3", "C4", "D4", "E4", "G4", "A4"],
        melodic_cadence_sec: 3.0,
        ambience_cadence_sec: 8.0,
        ambience_density: 0.10,
        ambience_offset_sec: 0.34,
        timbre: TimbreParams {
            waveform: Waveform::Sine,
            attack_sec: 0.20,
            release_sec: 2.4,
            note_duration_sec: 3.2,
        },
    },
    MoodProfile {
        mood: Mood::Cosmic,
        notes: &["C4", "D4", "F#4", "G4", "B4", "D5"],
        melodic_cadence_sec: 4.0,
        ambience_cadence_sec: 9.0,
        ambience_density: 0.22,
        ambience_offset_sec: 0.40,
        timbre: TimbreParams {
            waveform: Waveform::Sine,
            attack_sec: 0.30,
            release_sec: 3.0,
            note_duration_sec: 4.0,
        },
    },
    MoodProfile {
        mood: Mood::Galactic,
        notes: &["E3", "B3", "E4", "F#4", "B4", "C#5"],
        melodic_cadence_sec: 3.6,
        ambience_cadence_sec: 6.5,
        ambience_density: 0.26,
        ambience_offset_sec: 0.45,
        timbre: TimbreParams {
            waveform: Waveform::Square,
            attack_sec: 0.10,
            release_sec: 2.0,
            note_duration_sec: 2.8,
        },
    },
];

pub fn profile_for(mood: Mood) -> &'static MoodProfile {
    &PROFILES[mood as usize]
}

/// Parse a note label like `"C4"`, `"F#3"` or `"Bb2"` into a MIDI number.
pub fn note_to_midi(label: &str) -> Option<i32> {
    let mut chars = label.chars();
    let base = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (accidental, octave_str) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };
    let octave: i32 = octave_str.parse().ok()?;
    Some((octave + 1) * 12 + base + accidental)
}

pub fn note_to_hz(label: &str) -> Option<f32> {
    note_to_midi(label).map(|midi| midi_to_hz(midi as f32))
}

pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}
