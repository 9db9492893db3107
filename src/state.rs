use std::collections::HashMap;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen_futures::JsFuture;

use crate::api;
use crate::models::{AnswerMode, ChatRequest, Message};
use crate::playback::{PlaybackController, PlaybackState, WebSpeechEngine};
use crate::session;
use crate::voice::VoiceCapture;

/// Delay before auto-playback of a fresh answer, letting rendering settle.
const AUTOPLAY_SETTLE_MS: u32 = 150;

/// How long the per-message "Copied" feedback stays up.
const COPY_FLASH_MS: u32 = 1200;

/// Shared chat-surface state, provided via Leptos context. Lives for the
/// lifetime of the mounted chat surface; nothing here is persisted.
///
/// The methods on this struct are the only writers of the transcript.
#[derive(Clone, Copy)]
pub struct ChatState {
    // --- Read signals (for components to subscribe to) ---
    pub messages: ReadSignal<Vec<Message>>,
    pub pending: ReadSignal<bool>,
    pub input: ReadSignal<String>,
    pub mode: ReadSignal<AnswerMode>,
    pub open_sources: ReadSignal<HashMap<usize, bool>>,
    pub playback: ReadSignal<PlaybackState>,
    pub copied: ReadSignal<Option<usize>>,

    // --- Write signals ---
    pub set_input: WriteSignal<String>,
    pub set_mode: WriteSignal<AnswerMode>,

    // --- One-time capability probes ---
    pub tts_available: bool,
    pub stt_available: bool,

    set_messages: WriteSignal<Vec<Message>>,
    set_pending: WriteSignal<bool>,
    set_open_sources: WriteSignal<HashMap<usize, bool>>,
    set_playback: WriteSignal<PlaybackState>,
    set_copied: WriteSignal<Option<usize>>,

    controller: StoredValue<Option<PlaybackController<WebSpeechEngine>>, LocalStorage>,
    capture: StoredValue<VoiceCapture, LocalStorage>,
}

impl ChatState {
    /// Create a fresh session and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (messages, set_messages) = signal(Vec::<Message>::new());
        let (pending, set_pending) = signal(false);
        let (input, set_input) = signal(String::new());
        let (mode, set_mode) = signal(AnswerMode::Qa);
        let (open_sources, set_open_sources) = signal(HashMap::<usize, bool>::new());
        let (playback, set_playback) = signal(PlaybackState::Idle);
        let (copied, set_copied) = signal(None::<usize>);

        let engine = WebSpeechEngine::probe();
        let tts_available = engine.is_some();
        let controller = StoredValue::new_local(engine.map(PlaybackController::new));

        let capture = StoredValue::new_local(VoiceCapture::probe(move |transcript| {
            set_input.set(transcript);
        }));
        let stt_available = capture.with_value(VoiceCapture::is_available);

        // Genuine terminal events from the engine release the active index.
        controller.with_value(|c| {
            if let Some(c) = c {
                c.engine().set_on_done(move || {
                    controller.update_value(|c| {
                        if let Some(c) = c {
                            c.finished();
                        }
                    });
                    set_playback.set(PlaybackState::Idle);
                });
            }
        });

        let state = Self {
            messages,
            pending,
            input,
            mode,
            open_sources,
            playback,
            copied,
            set_input,
            set_mode,
            tts_available,
            stt_available,
            set_messages,
            set_pending,
            set_open_sources,
            set_playback,
            set_copied,
            controller,
            capture,
        };

        provide_context(state);
        state
    }

    /// Send the current input as a new user turn. Rejected (not queued) while
    /// a round-trip is pending.
    pub fn submit(&self) {
        let text = self.input.get_untracked().trim().to_string();
        if text.is_empty() || self.pending.get_untracked() {
            return;
        }
        self.send(text);
    }

    /// Re-send the most recent user turn as a full new round-trip. The
    /// earlier answer stays in the transcript.
    pub fn regenerate(&self) {
        if self.pending.get_untracked() {
            return;
        }
        let Some(text) = session::last_user_text(&self.messages.get_untracked()) else {
            return;
        };
        self.send(text);
    }

    fn send(&self, text: String) {
        let state = *self;

        state.set_input.set(String::new());
        state.set_pending.set(true);
        state
            .set_messages
            .update(|msgs| msgs.push(session::user_turn(&text, now_label())));

        let request = ChatRequest {
            message: text,
            history: session::history_for_backend(&state.messages.get_untracked()),
            mode: state.mode.get_untracked(),
        };

        spawn_local(async move {
            match api::send_chat(&request).await {
                Ok(response) => {
                    let sources = response.sources.unwrap_or_default();
                    let answer = session::assistant_turn(&response.answer, sources, now_label());
                    let speak_text = answer.content.clone();
                    let index = state.messages.with_untracked(Vec::len);
                    state.set_messages.update(|msgs| msgs.push(answer));

                    // auto-playback goes through the same toggle path a click
                    // takes, after a short delay so rendering settles
                    Timeout::new(AUTOPLAY_SETTLE_MS, move || {
                        state.toggle_speak(index, &speak_text);
                    })
                    .forget();
                }
                Err(err) => {
                    log::error!("chat request failed: {err}");
                    state
                        .set_messages
                        .update(|msgs| msgs.push(session::error_turn(&err, now_label())));
                }
            }
            state.set_pending.set(false);
        });
    }

    /// Reset the transcript, citation disclosure and input, and halt any
    /// active playback.
    pub fn clear(&self) {
        self.stop_speech();
        self.set_messages.set(Vec::new());
        self.set_open_sources.set(HashMap::new());
        self.set_input.set(String::new());
    }

    pub fn toggle_sources(&self, index: usize) {
        self.set_open_sources.update(|open| {
            let entry = open.entry(index).or_insert(false);
            *entry = !*entry;
        });
    }

    /// Reactive read of one message's citation disclosure.
    pub fn sources_open(&self, index: usize) -> bool {
        self.open_sources
            .with(|open| open.get(&index).copied().unwrap_or(false))
    }

    /// Speak/pause/resume playback for one message.
    pub fn toggle_speak(&self, index: usize, text: &str) {
        let set_playback = self.set_playback;
        self.controller.update_value(|controller| {
            if let Some(controller) = controller {
                set_playback.set(controller.toggle(index, text));
            }
        });
    }

    pub fn stop_speech(&self) {
        self.controller.update_value(|controller| {
            if let Some(controller) = controller {
                controller.stop();
            }
        });
        self.set_playback.set(PlaybackState::Idle);
    }

    /// Begin one voice capture. Playback is stopped first so the recognizer
    /// does not transcribe the engine's own voice.
    pub fn start_voice_input(&self) {
        self.stop_speech();
        self.capture.with_value(VoiceCapture::start);
    }

    /// Best-effort clipboard copy with a short per-message "Copied" flash.
    /// Failures are swallowed.
    pub fn copy_message(&self, index: usize, text: &str) {
        let set_copied = self.set_copied;
        let text = text.to_string();
        spawn_local(async move {
            let clipboard = window().navigator().clipboard();
            if JsFuture::from(clipboard.write_text(&text)).await.is_ok() {
                set_copied.set(Some(index));
                Timeout::new(COPY_FLASH_MS, move || set_copied.set(None)).forget();
            }
        });
    }
}

/// Local wall-clock label for a finalized turn.
fn now_label() -> String {
    js_sys::Date::new_0().to_locale_time_string("en-US").into()
}
