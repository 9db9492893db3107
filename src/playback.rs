//! Text-to-speech playback, multiplexed across messages.
//!
//! The browser exposes exactly one speech-synthesis engine per page, so the
//! controller owns it behind the [`SpeechEngine`] trait and enforces the one
//! serialization rule of the chat surface: starting playback for any message
//! index first cancels whatever another index was playing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{SpeechSynthesis, SpeechSynthesisErrorEvent, SpeechSynthesisEvent,
    SpeechSynthesisUtterance};

/// Language tag for both speech directions.
pub const SPEECH_LANG: &str = "en-IN";

/// The one shared speech-output engine.
pub trait SpeechEngine {
    fn speak(&mut self, text: &str);
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

/// Which message index owns playback, and in what state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking(usize),
    Paused(usize),
}

impl PlaybackState {
    pub fn active_index(self) -> Option<usize> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Speaking(i) | PlaybackState::Paused(i) => Some(i),
        }
    }

    pub fn is_speaking(self, index: usize) -> bool {
        self == PlaybackState::Speaking(index)
    }

    pub fn is_paused(self, index: usize) -> bool {
        self == PlaybackState::Paused(index)
    }
}

/// Finite-state controller over a speech engine. At most one index is ever
/// `Speaking` or `Paused`; every transition that starts playback for a new
/// index cancels the current utterance first.
pub struct PlaybackController<E> {
    state: PlaybackState,
    engine: E,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            state: PlaybackState::Idle,
            engine,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// User action on one message's speak affordance: start from idle, pause
    /// while speaking, resume while paused, or steal playback from another
    /// index.
    pub fn toggle(&mut self, index: usize, text: &str) -> PlaybackState {
        self.state = match self.state {
            PlaybackState::Idle => {
                self.engine.speak(text);
                PlaybackState::Speaking(index)
            }
            PlaybackState::Speaking(current) if current == index => {
                self.engine.pause();
                PlaybackState::Paused(index)
            }
            PlaybackState::Paused(current) if current == index => {
                self.engine.resume();
                PlaybackState::Speaking(index)
            }
            PlaybackState::Speaking(_) | PlaybackState::Paused(_) => {
                self.engine.cancel();
                self.engine.speak(text);
                PlaybackState::Speaking(index)
            }
        };
        self.state
    }

    /// Explicit stop from any state.
    pub fn stop(&mut self) -> PlaybackState {
        self.engine.cancel();
        self.state = PlaybackState::Idle;
        self.state
    }

    /// Engine-reported natural completion or error. The engine is already
    /// idle, so there is nothing to cancel.
    pub fn finished(&mut self) -> PlaybackState {
        self.state = PlaybackState::Idle;
        self.state
    }
}

/// [`SpeechEngine`] over the browser's `speechSynthesis` global.
///
/// `cancel()` makes the browser fire terminal events for the utterance it
/// kills; the generation counter drops those so only a genuine natural
/// end or error reaches the completion callback.
pub struct WebSpeechEngine {
    synth: SpeechSynthesis,
    generation: Rc<Cell<u64>>,
    on_done: Rc<RefCell<Option<Box<dyn Fn()>>>>,
}

impl WebSpeechEngine {
    /// One-time capability probe. `None` hides the speak affordances.
    pub fn probe() -> Option<Self> {
        let synth = web_sys::window()?.speech_synthesis().ok()?;
        Some(Self {
            synth,
            generation: Rc::new(Cell::new(0)),
            on_done: Rc::new(RefCell::new(None)),
        })
    }

    /// Install the terminal-event callback. Interior mutability lets the
    /// owner wire this up after the controller is constructed.
    pub fn set_on_done(&self, callback: impl Fn() + 'static) {
        *self.on_done.borrow_mut() = Some(Box::new(callback));
    }

    fn terminal_handler(&self, generation: u64) -> impl Fn() + 'static {
        let current = Rc::clone(&self.generation);
        let on_done = Rc::clone(&self.on_done);
        move || {
            if current.get() != generation {
                // event from a force-cancelled utterance
                return;
            }
            if let Some(callback) = on_done.borrow().as_ref() {
                callback();
            }
        }
    }
}

impl SpeechEngine for WebSpeechEngine {
    fn speak(&mut self, text: &str) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let utterance = match SpeechSynthesisUtterance::new_with_text(text) {
            Ok(utterance) => utterance,
            Err(e) => {
                log::error!("failed to create utterance: {e:?}");
                return;
            }
        };
        utterance.set_lang(SPEECH_LANG);

        let handler = self.terminal_handler(generation);
        let onend = Closure::<dyn Fn(SpeechSynthesisEvent)>::new(move |_| handler());
        utterance.set_onend(Some(onend.as_ref().unchecked_ref()));
        onend.forget();

        let handler = self.terminal_handler(generation);
        let onerror = Closure::<dyn Fn(SpeechSynthesisErrorEvent)>::new(move |_| handler());
        utterance.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        self.synth.speak(&utterance);
    }

    fn pause(&mut self) {
        self.synth.pause();
    }

    fn resume(&mut self) {
        self.synth.resume();
    }

    fn cancel(&mut self) {
        // invalidate pending terminal events before the browser fires them
        self.generation.set(self.generation.get() + 1);
        self.synth.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Speak(String),
        Pause,
        Resume,
        Cancel,
    }

    #[derive(Default)]
    struct MockEngine {
        calls: Vec<Call>,
    }

    impl SpeechEngine for MockEngine {
        fn speak(&mut self, text: &str) {
            self.calls.push(Call::Speak(text.to_string()));
        }
        fn pause(&mut self) {
            self.calls.push(Call::Pause);
        }
        fn resume(&mut self) {
            self.calls.push(Call::Resume);
        }
        fn cancel(&mut self) {
            self.calls.push(Call::Cancel);
        }
    }

    fn controller() -> PlaybackController<MockEngine> {
        PlaybackController::new(MockEngine::default())
    }

    #[test]
    fn test_idle_toggle_starts_speaking() {
        let mut c = controller();
        assert_eq!(c.toggle(0, "hello"), PlaybackState::Speaking(0));
        assert_eq!(c.engine().calls, vec![Call::Speak("hello".to_string())]);
    }

    #[test]
    fn test_same_index_toggles_pause_then_resume() {
        let mut c = controller();
        c.toggle(2, "text");
        assert_eq!(c.toggle(2, "text"), PlaybackState::Paused(2));
        assert_eq!(c.toggle(2, "text"), PlaybackState::Speaking(2));
        assert_eq!(
            c.engine().calls,
            vec![Call::Speak("text".to_string()), Call::Pause, Call::Resume]
        );
    }

    #[test]
    fn test_other_index_steals_playback() {
        let mut c = controller();
        c.toggle(0, "first");
        assert_eq!(c.toggle(3, "second"), PlaybackState::Speaking(3));
        assert_eq!(
            c.engine().calls,
            vec![
                Call::Speak("first".to_string()),
                Call::Cancel,
                Call::Speak("second".to_string()),
            ]
        );
    }

    #[test]
    fn test_steal_from_paused_cancels_first() {
        let mut c = controller();
        c.toggle(0, "first");
        c.toggle(0, "first"); // paused
        assert_eq!(c.toggle(1, "second"), PlaybackState::Speaking(1));
        assert_eq!(c.state().active_index(), Some(1));
    }

    #[test]
    fn test_only_one_index_active() {
        let mut c = controller();
        c.toggle(0, "a");
        c.toggle(1, "b");
        c.toggle(2, "c");
        assert_eq!(c.state(), PlaybackState::Speaking(2));
        assert!(!c.state().is_speaking(0));
        assert!(!c.state().is_speaking(1));
    }

    #[test]
    fn test_stop_from_any_state_is_idle() {
        let mut c = controller();
        assert_eq!(c.stop(), PlaybackState::Idle);
        c.toggle(0, "a");
        assert_eq!(c.stop(), PlaybackState::Idle);
        c.toggle(0, "a");
        c.toggle(0, "a"); // paused
        assert_eq!(c.stop(), PlaybackState::Idle);
        let cancels = c.engine().calls.iter().filter(|call| **call == Call::Cancel);
        assert_eq!(cancels.count(), 3);
    }

    #[test]
    fn test_natural_completion_goes_idle_without_cancel() {
        let mut c = controller();
        c.toggle(0, "a");
        assert_eq!(c.finished(), PlaybackState::Idle);
        assert!(!c.engine().calls.contains(&Call::Cancel));
    }

    #[test]
    fn test_restart_after_completion() {
        let mut c = controller();
        c.toggle(0, "a");
        c.finished();
        assert_eq!(c.toggle(0, "a"), PlaybackState::Speaking(0));
    }
}
