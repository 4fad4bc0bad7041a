// Shared timing and synthesis tuning constants used across the engine.

// Intent scheduling
pub const DEBOUNCE_WINDOW_SEC: f64 = 0.3; // rapid start/stop requests coalesce inside this window
pub const TRANSITION_GRACE_SEC: f64 = 0.1; // audio tails decay before a new session is built

// Cadence arming. Both offsets are strictly positive and distinct so the
// two cadences never land on the same transport instant (the transport
// drops one of two events armed at an identical time).
pub const MELODIC_ARM_OFFSET_SEC: f64 = 0.1;
pub const AMBIENCE_ARM_OFFSET_SEC: f64 = 0.3;

// Melodic texture
pub const ECHO_PROBABILITY: f32 = 0.3; // chance of a trailing second note per melodic fire
pub const ECHO_SUBDIVISION_SEC: f64 = 0.125; // fixed offset of that second note
pub const VELOCITY_MIN: f32 = 0.4;
pub const VELOCITY_MAX: f32 = 0.6;

// Volume mapping: user volume 0..1 sweeps the master gain from the dB
// floor up to unity, with a hard cut to silence at zero.
pub const VOLUME_FLOOR_DB: f32 = -60.0;

// Per-session RNG seeds are derived from the engine seed with this mix
// so each session gets an independent, reproducible stream.
pub const SESSION_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;
