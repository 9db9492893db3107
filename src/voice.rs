//! Speech-to-text capture for the question input.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{SpeechRecognition, SpeechRecognitionEvent};

use crate::playback::SPEECH_LANG;

/// Single-utterance speech recognition, probed once at session start. When
/// the browser has no recognition engine the mic affordance is hidden
/// entirely rather than rendered disabled.
pub struct VoiceCapture {
    recognition: Option<SpeechRecognition>,
}

impl VoiceCapture {
    /// Probe the capability and wire the result handler. `on_transcript`
    /// receives the best transcript of a completed capture; errors and
    /// no-match results are silently abandoned.
    pub fn probe(on_transcript: impl Fn(String) + 'static) -> Self {
        let recognition = match SpeechRecognition::new() {
            Ok(recognition) => recognition,
            Err(_) => return Self { recognition: None },
        };
        recognition.set_lang(SPEECH_LANG);
        recognition.set_continuous(false);
        recognition.set_interim_results(false);

        let onresult = Closure::<dyn Fn(SpeechRecognitionEvent)>::new(
            move |event: SpeechRecognitionEvent| {
                if let Some(alternative) =
                    event.results().and_then(|r| r.get(0)).and_then(|r| r.get(0))
                {
                    on_transcript(alternative.transcript());
                }
            },
        );
        recognition.set_onresult(Some(onresult.as_ref().unchecked_ref()));
        onresult.forget();

        let onerror = Closure::<dyn Fn(web_sys::Event)>::new(|_| {
            log::debug!("speech recognition attempt abandoned");
        });
        recognition.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        Self {
            recognition: Some(recognition),
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognition.is_some()
    }

    /// Begin one non-continuous capture. The caller stops any active
    /// playback first so the recognizer does not hear the engine.
    pub fn start(&self) {
        if let Some(recognition) = &self.recognition {
            if let Err(e) = recognition.start() {
                log::debug!("speech recognition failed to start: {e:?}");
            }
        }
    }
}
