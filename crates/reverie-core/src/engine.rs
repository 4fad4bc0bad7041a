//! Transition coordinator: the five public operations serialized into
//! one intent stream over the shared transport clock.
//!
//! Concurrency here is cooperative, not parallel: overlapping start,
//! stop and mood-change intents race against the clock through two
//! pending slots (debounced play target, grace-delayed mood target)
//! resolved by `tick`. The front-ends call `tick` once per animation
//! frame / scheduler pass. At most one mood transition is in flight at a
//! time; overlapping start/stop requests coalesce to the last one rather
//! than queuing.

use crate::constants::{
    AMBIENCE_ARM_OFFSET_SEC, DEBOUNCE_WINDOW_SEC, MELODIC_ARM_OFFSET_SEC, TRANSITION_GRACE_SEC,
};
use crate::error::Result;
use crate::graph::{AudioBackend, GraphManager};
use crate::lifecycle::{Lifecycle, TransitionFlag};
use crate::moods::{profile_for, Mood};
use crate::session::{NoteEvent, PlaybackSession};
use crate::transport::{CadenceFire, CadenceRole, Clock, Transport};

#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub initial_mood: Mood,
    /// Where unrecognized mood labels resolve. Configurable rather than
    /// hard-coded; the default preserves the documented fallback policy.
    pub fallback_mood: Mood,
    pub debounce_sec: f64,
    pub grace_sec: f64,
    /// Lead offsets for the staggered cadence arms. Must differ, or the
    /// transport rejects the second arm as a same-instant collision.
    pub melodic_offset_sec: f64,
    pub ambience_offset_sec: f64,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_mood: Mood::Peaceful,
            fallback_mood: Mood::Peaceful,
            debounce_sec: DEBOUNCE_WINDOW_SEC,
            grace_sec: TRANSITION_GRACE_SEC,
            melodic_offset_sec: MELODIC_ARM_OFFSET_SEC,
            ambience_offset_sec: AMBIENCE_ARM_OFFSET_SEC,
            seed: 42,
        }
    }
}

/// Observable engine snapshot for the UI and the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineState {
    pub initialized: bool,
    pub playing: bool,
    pub current_mood: Mood,
    pub transitioning: bool,
}

#[derive(Clone, Copy, Debug)]
struct PendingPlay {
    playing: bool,
    due: f64,
}

#[derive(Clone, Copy, Debug)]
struct PendingMood {
    target: Mood,
    due: f64,
}

pub struct SoundscapeEngine<B: AudioBackend, C: Clock> {
    graph: GraphManager<B>,
    transport: Transport,
    clock: C,
    config: EngineConfig,
    lifecycle: Lifecycle,
    transition: TransitionFlag,
    session: Option<PlaybackSession>,
    sessions_created: u64,
    initialized: bool,
    playing: bool,
    current_mood: Mood,
    pending_play: Option<PendingPlay>,
    pending_mood: Option<PendingMood>,
    // scratch buffers reused across ticks
    fires: Vec<CadenceFire>,
    notes: Vec<NoteEvent>,
}

impl<B: AudioBackend, C: Clock> SoundscapeEngine<B, C> {
    pub fn new(backend: B, clock: C, config: EngineConfig) -> Self {
        Self {
            graph: GraphManager::new(backend),
            transport: Transport::new(),
            clock,
            lifecycle: Lifecycle::new(),
            transition: TransitionFlag::default(),
            session: None,
            sessions_created: 0,
            initialized: false,
            playing: false,
            current_mood: config.initial_mood,
            pending_play: None,
            pending_mood: None,
            fires: Vec::new(),
            notes: Vec::new(),
            config,
        }
    }

    // ---------------- observable state ----------------

    pub fn state(&self) -> EngineState {
        EngineState {
            initialized: self.initialized,
            playing: self.playing,
            current_mood: self.current_mood,
            transitioning: self.transition.is_active(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    pub fn current_mood(&self) -> Mood {
        self.current_mood
    }

    pub fn volume(&self) -> f32 {
        self.graph.volume()
    }

    /// Identity of the live playback session, if any.
    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.id())
    }

    // ---------------- public operations ----------------

    /// Build the audio graph. Idempotent; the one fallible operation
    /// (the output acquisition has a user-interaction precondition) and
    /// the re-entry point after a full teardown.
    pub fn initialize(&mut self, initial_volume: f32) -> Result<()> {
        if !self.lifecycle.is_mounted() {
            self.lifecycle.mount();
            log::info!("[engine] remounted for a fresh initialize");
        }
        if self.initialized {
            log::debug!("[engine] initialize: already initialized");
            return Ok(());
        }
        self.graph.initialize(initial_volume)?;
        self.initialized = true;
        Ok(())
    }

    /// Request playback; debounced and coalesced last-wins with `stop`.
    pub fn start(&mut self) {
        self.request_play(true);
    }

    /// Request silence; debounced and coalesced last-wins with `start`.
    pub fn stop(&mut self) {
        self.request_play(false);
    }

    /// Swap the soundscape to a new mood. No-op when the label resolves
    /// to the current mood or while another transition is in flight;
    /// callers needing a rejected change must re-issue it once
    /// `transitioning` clears.
    pub fn change_mood(&mut self, label: &str) {
        if !self.lifecycle.ensure("change_mood") {
            return;
        }
        let target = Mood::resolve(label, self.config.fallback_mood);
        if target == self.current_mood {
            log::debug!("[engine] change_mood: already {}", target.label());
            return;
        }
        if !self.transition.try_begin() {
            log::info!(
                "[engine] change_mood to {} rejected mid-transition",
                target.label()
            );
            return;
        }
        // The session dies now; the graph nodes stay. The new session is
        // built after a grace interval so audio tails can decay.
        self.transport.disarm_all();
        self.session = None;
        self.pending_mood = Some(PendingMood {
            target,
            due: self.clock.now() + self.config.grace_sec,
        });
        log::info!("[engine] mood transition -> {}", target.label());
    }

    /// Clamped to `[0, 1]` and applied immediately at any engine state.
    pub fn set_volume(&mut self, volume: f32) {
        if !self.lifecycle.ensure("set_volume") {
            return;
        }
        self.graph.set_volume(volume);
    }

    /// Unmount, cancel all pending intents, then dispose the graph.
    /// Idempotent; safe before `initialize`.
    pub fn teardown(&mut self) {
        self.lifecycle.unmount();
        self.pending_play = None;
        self.pending_mood = None;
        self.transport.stop();
        self.session = None;
        self.graph.teardown();
        self.initialized = false;
        self.playing = false;
        self.transition.release();
        log::info!("[engine] torn down");
    }

    // ---------------- cooperative pump ----------------

    /// Resolve due intents and drain due cadence fires. Called by the
    /// hosting loop; a no-op once the engine is torn down.
    pub fn tick(&mut self) {
        if !self.lifecycle.is_mounted() {
            return;
        }
        let now = self.clock.now();
        if let Some(pending) = self.pending_play {
            if pending.due <= now {
                self.pending_play = None;
                self.apply_play(pending.playing, now);
            }
        }
        if let Some(pending) = self.pending_mood {
            if pending.due <= now {
                self.pending_mood = None;
                self.finish_mood_change(pending.target, now);
            }
        }
        self.pump_cadences(now);
    }

    // ---------------- internals ----------------

    fn request_play(&mut self, playing: bool) {
        let what = if playing { "start" } else { "stop" };
        if !self.lifecycle.ensure(what) {
            return;
        }
        let due = self.clock.now() + self.config.debounce_sec;
        if let Some(prev) = self.pending_play.replace(PendingPlay { playing, due }) {
            log::debug!(
                "[engine] {} supersedes pending {}",
                what,
                if prev.playing { "start" } else { "stop" }
            );
        }
    }

    fn apply_play(&mut self, playing: bool, now: f64) {
        if playing {
            if !self.initialized {
                log::warn!("[engine] start resolved before initialize; ignoring");
                return;
            }
            if self.playing {
                log::debug!("[engine] start: already playing");
                return;
            }
            if self.session.is_none() {
                self.session = Some(self.new_session(self.current_mood));
            }
            self.transport.start(now);
            if let Err(e) = self.arm_cadences(now) {
                log::warn!("[engine] arming cadences: {e}");
            }
            self.playing = true;
            log::info!("[engine] playing ({})", self.current_mood.label());
        } else {
            self.transport.stop();
            self.session = None;
            self.playing = false;
            log::info!("[engine] stopped");
        }
    }

    /// Completes a mood change after the grace interval. The transition
    /// flag is released on every exit path, including a failed rebuild.
    fn finish_mood_change(&mut self, target: Mood, now: f64) {
        if let Err(e) = self.rebuild_session(target, now) {
            log::error!(
                "[engine] mood transition to {} failed: {e}",
                target.label()
            );
        }
        self.transition.release();
    }

    fn rebuild_session(&mut self, target: Mood, now: f64) -> Result<()> {
        self.current_mood = target;
        if self.playing {
            // A debounced start resolving inside the grace interval arms
            // the outgoing mood's pair; drop whatever is armed so exactly
            // one pair is live per session.
            self.transport.disarm_all();
            self.session = Some(self.new_session(target));
            if !self.transport.is_running() {
                self.transport.start(now);
            }
            self.arm_cadences(now)?;
        }
        log::info!("[engine] mood is now {}", target.label());
        Ok(())
    }

    /// Arm both cadences at their staggered lead offsets, never at zero,
    /// so neither collides with the other on the shared clock.
    fn arm_cadences(&mut self, now: f64) -> Result<()> {
        let profile = profile_for(self.current_mood);
        self.transport.arm(
            CadenceRole::Melodic,
            profile.melodic_cadence_sec,
            self.config.melodic_offset_sec,
            now,
        )?;
        self.transport.arm(
            CadenceRole::Ambience,
            profile.ambience_cadence_sec,
            self.config.ambience_offset_sec,
            now,
        )?;
        Ok(())
    }

    fn new_session(&mut self, mood: Mood) -> PlaybackSession {
        self.sessions_created += 1;
        PlaybackSession::new(mood, self.config.seed, self.sessions_created)
    }

    fn pump_cadences(&mut self, now: f64) {
        let mut fires = std::mem::take(&mut self.fires);
        fires.clear();
        self.transport.tick(now, &mut fires);
        for fire in &fires {
            self.dispatch_fire(*fire, now);
        }
        self.fires = fires;
    }

    fn dispatch_fire(&mut self, fire: CadenceFire, now: f64) {
        let mut notes = std::mem::take(&mut self.notes);
        notes.clear();
        let mut ambience = None;
        match self.session.as_mut() {
            Some(session) => match fire.role {
                CadenceRole::Melodic => session.melodic_fire(&mut notes),
                CadenceRole::Ambience => ambience = Some(session.ambience_fire()),
            },
            // The session can vanish between a fire becoming due and the
            // pump draining it; the callback degrades to a no-op.
            None => log::debug!("[engine] {:?} fire with no live session; ignoring", fire.role),
        }
        let timbre = profile_for(self.current_mood).timbre;
        let lead = (fire.at_sec - now).max(0.0);
        for note in &notes {
            self.graph.trigger_tone(
                note.frequency_hz,
                note.velocity,
                lead + note.offset_sec,
                &timbre,
            );
        }
        if let Some(burst) = ambience {
            self.graph.trigger_noise(burst.level, lead + burst.offset_sec);
        }
        self.notes = notes;
    }
}
