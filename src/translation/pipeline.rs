//! # Translation Pipeline
//!
//! Composes the four collaborator operations into the audio-to-audio transform
//! the relay session invokes per frame:
//!
//! 1. Transcribe with the primary recognition hint; on no result, retry with
//!    the secondary hint
//! 2. Detect the transcript's language
//! 3. Pick the *other* configured language as the translation target
//! 4. Translate, then synthesize speech in the target language
//!
//! Any step that comes up empty — unintelligible audio, undetectable language,
//! a collaborator failure — collapses to `None`: the frame is simply not
//! broadcast and the session moves on to the next one. Backend calls may block
//! for a long time, so they run on the blocking thread pool; a hang there
//! stalls only the calling session, never the accept loop or other sessions.

use crate::config::LanguagesConfig;
use crate::translation::{DetectedLanguage, Transcript, TranslationBackend};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Audio-to-audio translation transform shared by all relay sessions.
pub struct TranslationPipeline {
    backend: Arc<dyn TranslationBackend>,
    languages: LanguagesConfig,
}

impl TranslationPipeline {
    pub fn new(backend: Arc<dyn TranslationBackend>, languages: LanguagesConfig) -> Self {
        Self { backend, languages }
    }

    /// Translate one audio payload, returning the synthesized audio in the
    /// other configured language, or `None` if there is nothing to broadcast.
    pub async fn translate_audio(&self, audio: Vec<u8>) -> Option<Vec<u8>> {
        let backend = Arc::clone(&self.backend);
        let languages = self.languages.clone();

        let result =
            tokio::task::spawn_blocking(move || run_pipeline(&*backend, &languages, &audio)).await;

        match result {
            Ok(output) => output,
            Err(join_err) => {
                // A panicking backend must not take the session's socket or
                // registry entry with it; treat it as a no-result frame.
                error!("translation backend panicked: {}", join_err);
                None
            }
        }
    }
}

fn run_pipeline(
    backend: &dyn TranslationBackend,
    languages: &LanguagesConfig,
    audio: &[u8],
) -> Option<Vec<u8>> {
    let text = match backend.transcribe(audio, &languages.primary_stt) {
        Transcript::Text(text) => text,
        Transcript::NoResult => match backend.transcribe(audio, &languages.secondary_stt) {
            Transcript::Text(text) => text,
            Transcript::NoResult => {
                debug!("could not understand audio in either language");
                return None;
            }
        },
    };

    if text.is_empty() {
        return None;
    }
    info!("transcribed: '{}'", text);

    let detected = match backend.detect_language(&text) {
        DetectedLanguage::Tag(tag) => tag,
        DetectedLanguage::Unknown => {
            debug!("could not detect language of transcript");
            return None;
        }
    };

    // Relay to the other side of the conversation: primary speech goes out in
    // the secondary language and vice versa.
    let target = if detected == languages.primary_tts {
        languages.secondary_tts.as_str()
    } else {
        languages.primary_tts.as_str()
    };

    let translated = match backend.translate(&text, target) {
        Ok(translated) => translated,
        Err(err) => {
            error!("translation failed: {}", err);
            return None;
        }
    };
    info!("translated to ({}): '{}'", target, translated);

    match backend.synthesize(&translated, target) {
        Ok(audio) => Some(audio),
        Err(err) => {
            error!("speech synthesis failed: {}", err);
            None
        }
    }
}
