#![cfg(target_arch = "wasm32")]
//! WASM bindings for the soundscape engine.
//!
//! The hosting page constructs one [`Soundscape`], calls `initialize`
//! from a click handler (browsers refuse to open an audio output without
//! a user gesture) and then drives the five operations from its own UI.
//! `run` installs a requestAnimationFrame pump that resolves the
//! engine's debounced and grace-delayed intents.

mod audio;

pub use audio::WebAudioBackend;

use reverie_core::{EngineConfig, SoundscapeEngine, SystemClock};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

type Engine = SoundscapeEngine<WebAudioBackend, SystemClock>;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("reverie-web starting");
    Ok(())
}

#[wasm_bindgen]
pub struct Soundscape {
    engine: Rc<RefCell<Engine>>,
}

impl Default for Soundscape {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Soundscape {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Soundscape {
        let engine = SoundscapeEngine::new(
            WebAudioBackend::new(),
            SystemClock::new(),
            EngineConfig::default(),
        );
        Soundscape {
            engine: Rc::new(RefCell::new(engine)),
        }
    }

    /// Must be called from a user gesture handler the first time.
    pub fn initialize(&self, initial_volume: f32) -> Result<(), JsValue> {
        self.engine
            .borrow_mut()
            .initialize(initial_volume)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn start(&self) {
        self.engine.borrow_mut().start();
    }

    pub fn stop(&self) {
        self.engine.borrow_mut().stop();
    }

    pub fn change_mood(&self, mood: &str) {
        self.engine.borrow_mut().change_mood(mood);
    }

    pub fn set_volume(&self, volume: f32) {
        self.engine.borrow_mut().set_volume(volume);
    }

    pub fn teardown(&self) {
        self.engine.borrow_mut().teardown();
    }

    /// Single cooperative pump step; exposed for hosts with their own
    /// frame loop. `run` is the usual entry point.
    pub fn tick(&self) {
        self.engine.borrow_mut().tick();
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.borrow().is_initialized()
    }

    pub fn is_playing(&self) -> bool {
        self.engine.borrow().is_playing()
    }

    pub fn is_transitioning(&self) -> bool {
        self.engine.borrow().is_transitioning()
    }

    pub fn current_mood(&self) -> String {
        self.engine.borrow().current_mood().label().to_string()
    }

    /// Drive the engine from requestAnimationFrame until teardown.
    pub fn run(&self) {
        let engine = self.engine.clone();
        let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let tick_clone = tick.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            engine.borrow_mut().tick();
            if !engine.borrow().is_mounted() {
                log::info!("[pump] engine torn down; stopping frame loop");
                return;
            }
            request_frame(&tick_clone);
        }) as Box<dyn FnMut()>));
        request_frame(&tick);
    }
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let Some(w) = web::window() {
        if let Some(closure) = tick.borrow().as_ref() {
            let _ = w.request_animation_frame(closure.as_ref().unchecked_ref());
        }
    }
}
