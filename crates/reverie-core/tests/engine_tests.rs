// Engine-level ordering: debounce coalescing, single-flight mood
// transitions, lifecycle guarding and the end-to-end scenarios.

mod common;

use common::{ManualClock, Op, RecordingBackend};
use reverie_core::{EngineConfig, Mood, SoundscapeEngine};

type Engine = SoundscapeEngine<RecordingBackend, ManualClock>;

fn make_engine() -> (Engine, ManualClock, RecordingBackend) {
    let backend = RecordingBackend::new();
    let clock = ManualClock::new();
    let engine = SoundscapeEngine::new(backend.clone(), clock.clone(), EngineConfig::default());
    (engine, clock, backend)
}

/// Advance the clock past the debounce window and pump once.
fn settle(engine: &mut Engine, clock: &ManualClock, dt: f64) {
    clock.advance(dt);
    engine.tick();
}

#[test]
fn start_resolves_after_the_debounce_window() {
    let (mut engine, clock, _backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();

    engine.tick();
    assert!(!engine.is_playing(), "not before the window elapses");

    settle(&mut engine, &clock, 0.3);
    assert!(engine.is_playing());
    assert!(engine.session_id().is_some());
}

#[test]
fn stop_within_the_window_cancels_the_start() {
    let (mut engine, clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();

    engine.start();
    clock.advance(0.1);
    engine.stop(); // last-wins: replaces the pending start outright
    settle(&mut engine, &clock, 0.5);

    assert!(!engine.is_playing());
    let log = backend.log.borrow();
    assert_eq!(
        log.count(|op| matches!(op, Op::Tone { .. } | Op::Noise { .. })),
        0,
        "the canceled start must never become audible"
    );
}

#[test]
fn playback_emits_staggered_cadence_triggers() {
    let (mut engine, clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();
    settle(&mut engine, &clock, 0.3);

    // melodic arms at +0.1, ambience at +0.3; pump past both
    settle(&mut engine, &clock, 0.5);
    let log = backend.log.borrow();
    assert!(log.count(|op| matches!(op, Op::Tone { .. })) >= 1);
    assert_eq!(log.count(|op| matches!(op, Op::Noise { .. })), 1);

    // the ambience burst carries the mood's own positive offset
    let noise_delay = log.ops.iter().find_map(|op| match op {
        Op::Noise { delay_sec, .. } => Some(*delay_sec),
        _ => None,
    });
    assert!(noise_delay.unwrap() > 0.0);
}

#[test]
fn change_mood_is_idempotent() {
    let (mut engine, clock, _backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();
    settle(&mut engine, &clock, 0.3);

    engine.change_mood("dramatic");
    settle(&mut engine, &clock, 0.1);
    let first = engine.state();
    let first_session = engine.session_id();

    engine.change_mood("dramatic"); // same mood: no-op
    settle(&mut engine, &clock, 0.2);

    assert_eq!(engine.state(), first);
    assert_eq!(engine.session_id(), first_session);
}

#[test]
fn mood_change_mid_transition_is_rejected() {
    // Scenario C: the second of two rapid changes is ignored.
    let (mut engine, clock, _backend) = make_engine();
    engine.initialize(0.5).unwrap();

    engine.change_mood("dramatic");
    assert!(engine.is_transitioning());
    engine.change_mood("cosmic"); // rejected outright

    settle(&mut engine, &clock, 0.1);
    assert!(!engine.is_transitioning());
    assert_eq!(engine.current_mood(), Mood::Dramatic);

    // once the flag clears, a re-issued change is accepted
    engine.change_mood("cosmic");
    settle(&mut engine, &clock, 0.1);
    assert_eq!(engine.current_mood(), Mood::Cosmic);
}

#[test]
fn transition_flag_releases_when_the_rebuild_fails() {
    // Identical lead offsets make every cadence pair collide on the
    // shared clock, so the session rebuild after the grace interval
    // fails. The single-flight flag must still clear.
    let backend = RecordingBackend::new();
    let clock = ManualClock::new();
    let config = EngineConfig {
        melodic_offset_sec: 0.2,
        ambience_offset_sec: 0.2,
        ..EngineConfig::default()
    };
    let mut engine = SoundscapeEngine::new(backend.clone(), clock.clone(), config);
    engine.initialize(0.5).unwrap();
    engine.start();
    settle(&mut engine, &clock, 0.3);
    assert!(engine.is_playing());

    engine.change_mood("dramatic");
    assert!(engine.is_transitioning());
    settle(&mut engine, &clock, 0.1);

    assert!(!engine.is_transitioning(), "released on the error path too");
    assert_eq!(engine.current_mood(), Mood::Dramatic);

    // not wedged: a follow-up change is accepted and completes
    engine.change_mood("cosmic");
    assert!(engine.is_transitioning());
    settle(&mut engine, &clock, 0.1);
    assert!(!engine.is_transitioning());
    assert_eq!(engine.current_mood(), Mood::Cosmic);
}

#[test]
fn unknown_mood_falls_back_without_interrupting_playback() {
    // Scenario B: fallback resolves to peaceful; playback continues.
    let (mut engine, clock, _backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();
    settle(&mut engine, &clock, 0.3);
    assert!(engine.is_playing());
    let session = engine.session_id();

    engine.change_mood("not-a-real-mood");
    settle(&mut engine, &clock, 0.2);

    assert_eq!(engine.current_mood(), Mood::Peaceful);
    assert!(engine.is_playing());
    assert_eq!(engine.session_id(), session, "fallback == current is a no-op");
}

#[test]
fn mood_change_while_playing_swaps_the_session_and_keeps_playing() {
    let (mut engine, clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();
    settle(&mut engine, &clock, 0.3);
    let old_session = engine.session_id();

    engine.change_mood("galactic");
    assert!(engine.is_transitioning());
    assert!(engine.session_id().is_none(), "old session dies immediately");

    settle(&mut engine, &clock, 0.1);
    assert!(!engine.is_transitioning());
    assert!(engine.is_playing());
    assert_eq!(engine.current_mood(), Mood::Galactic);
    assert_ne!(engine.session_id(), old_session);

    // the graph survived the swap: no disposals happened
    assert_eq!(
        backend.log.borrow().count(|op| matches!(op, Op::DisposeGain)),
        0
    );

    // and the new session is audible
    settle(&mut engine, &clock, 0.5);
    assert!(backend.log.borrow().count(|op| matches!(op, Op::Tone { .. })) >= 1);
}

#[test]
fn start_resolving_mid_transition_keeps_one_cadence_pair() {
    let (mut engine, clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();

    // the mood change lands inside the debounce window, so its grace
    // interval overlaps the pending start resolving
    clock.advance(0.25);
    engine.tick();
    engine.change_mood("dramatic");

    // pump well past several cadence periods
    for _ in 0..195 {
        settle(&mut engine, &clock, 0.05);
    }

    assert!(engine.is_playing());
    assert_eq!(engine.current_mood(), Mood::Dramatic);

    // only the dramatic ambience cadence (4.0s period, armed ~0.65s)
    // may fire: 3 bursts by t=10. A stale pair left over from the
    // superseded start would add its own bursts on top.
    let log = backend.log.borrow();
    assert_eq!(log.count(|op| matches!(op, Op::Noise { .. })), 3);
}

#[test]
fn scenario_full_drive_ends_clean() {
    // Scenario A: initialize -> start -> changeMood -> stop -> teardown.
    let (mut engine, clock, _backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();
    settle(&mut engine, &clock, 0.3);
    engine.change_mood("dramatic");
    settle(&mut engine, &clock, 0.1);
    engine.stop();
    settle(&mut engine, &clock, 0.3);
    engine.teardown();

    assert!(!engine.is_initialized());
    assert!(!engine.is_playing());
    assert!(!engine.is_transitioning());
}

#[test]
fn teardown_is_idempotent_in_any_order() {
    let (mut engine, clock, _backend) = make_engine();

    engine.teardown(); // before initialize
    assert!(!engine.is_initialized());
    assert!(!engine.is_playing());

    engine.initialize(0.5).unwrap();
    engine.teardown();
    engine.teardown();
    assert!(!engine.is_initialized());
    assert!(!engine.is_playing());

    // full teardown + initialize cycle builds a fresh graph
    engine.initialize(0.5).unwrap();
    assert!(engine.is_initialized());
    engine.start();
    settle(&mut engine, &clock, 0.3);
    assert!(engine.is_playing());
}

#[test]
fn teardown_cancels_pending_intents() {
    let (mut engine, clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.start();
    engine.change_mood("mysterious");
    engine.teardown();

    // nothing pending may touch the torn-down engine
    settle(&mut engine, &clock, 2.0);
    assert!(!engine.is_playing());
    assert_eq!(engine.current_mood(), Mood::Peaceful);
    assert_eq!(
        backend.log.borrow().count(|op| matches!(op, Op::Tone { .. } | Op::Noise { .. })),
        0
    );
}

#[test]
fn operations_after_teardown_are_ignored() {
    let (mut engine, clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();
    engine.teardown();

    engine.start();
    engine.change_mood("dramatic");
    engine.set_volume(1.0);
    settle(&mut engine, &clock, 1.0);

    assert!(!engine.is_playing());
    assert_eq!(engine.current_mood(), Mood::Peaceful);
    assert_eq!(backend.log.borrow().count(|op| matches!(op, Op::SetGain(_))), 0);
}

#[test]
fn initialize_failure_is_retryable() {
    let backend = RecordingBackend::failing();
    let clock = ManualClock::new();
    let mut engine =
        SoundscapeEngine::new(backend.clone(), clock.clone(), EngineConfig::default());

    assert!(engine.initialize(0.5).is_err());
    assert!(!engine.is_initialized());

    backend.log.borrow_mut().fail_acquire = false;
    engine.initialize(0.5).unwrap();
    assert!(engine.is_initialized());
}

#[test]
fn volume_clamping_through_the_engine() {
    let (mut engine, _clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();

    engine.set_volume(-5.0);
    let low = backend.log.borrow().last_gain().unwrap();
    engine.set_volume(0.0);
    assert_eq!(low, backend.log.borrow().last_gain().unwrap());

    engine.set_volume(3.0);
    let high = backend.log.borrow().last_gain().unwrap();
    engine.set_volume(1.0);
    assert_eq!(high, backend.log.borrow().last_gain().unwrap());
}

#[test]
fn nan_volume_is_ignored() {
    let (mut engine, _clock, backend) = make_engine();
    engine.initialize(0.5).unwrap();

    engine.set_volume(0.8);
    let before = backend.log.borrow().last_gain().unwrap();

    engine.set_volume(f32::NAN);
    assert_eq!(engine.volume(), 0.8, "last valid level survives");
    assert_eq!(backend.log.borrow().last_gain().unwrap(), before);
}

#[test]
fn mood_change_before_initialize_only_retargets_state() {
    let (mut engine, clock, backend) = make_engine();
    engine.change_mood("melancholic");
    settle(&mut engine, &clock, 0.2);

    assert_eq!(engine.current_mood(), Mood::Melancholic);
    assert!(!engine.is_playing());
    assert!(backend.log.borrow().ops.is_empty(), "graph untouched");
}
