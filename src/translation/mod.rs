//! # Translation Collaborator Interface
//!
//! The relay treats speech translation as an opaque transform: audio bytes go
//! in, translated audio bytes (or nothing) come out. This module defines the
//! seam where an external speech-to-text / translation / text-to-speech stack
//! plugs in, plus the sum types those operations return.
//!
//! "Could not understand the audio" is an expected, frequent outcome — a peer
//! coughing into the microphone is not an error — so recognition results are
//! modeled as data (`Transcript::NoResult`) rather than as error values.

pub mod pipeline;

pub use pipeline::TranslationPipeline;

use anyhow::Result;

/// Outcome of a speech-to-text attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized speech.
    Text(String),
    /// The recognizer could not make out any words.
    NoResult,
}

/// Outcome of language detection on a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedLanguage {
    /// A language tag such as "en" or "es".
    Tag(String),
    /// The detector could not identify the language.
    Unknown,
}

/// External speech pipeline consumed by the relay.
///
/// Implementations may block for arbitrary wall-clock time; the relay invokes
/// them off the async runtime's core threads. Each method is a single call to
/// the corresponding external service.
pub trait TranslationBackend: Send + Sync {
    /// Transcribe audio using the given recognition hint (e.g. "en-US").
    fn transcribe(&self, audio: &[u8], language_hint: &str) -> Transcript;

    /// Detect the language of a transcript.
    fn detect_language(&self, text: &str) -> DetectedLanguage;

    /// Translate text into the target language.
    fn translate(&self, text: &str, target_language: &str) -> Result<String>;

    /// Synthesize speech audio for text in the given language.
    fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

/// Placeholder backend used when no external speech stack is wired up.
///
/// Every transcription attempt reports `NoResult`, so the server accepts and
/// reads frames but never broadcasts. Deployments replace this with a real
/// `TranslationBackend` implementation.
pub struct UnconfiguredBackend;

impl TranslationBackend for UnconfiguredBackend {
    fn transcribe(&self, _audio: &[u8], _language_hint: &str) -> Transcript {
        Transcript::NoResult
    }

    fn detect_language(&self, _text: &str) -> DetectedLanguage {
        DetectedLanguage::Unknown
    }

    fn translate(&self, _text: &str, _target_language: &str) -> Result<String> {
        Err(anyhow::anyhow!("no translation backend configured"))
    }

    fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>> {
        Err(anyhow::anyhow!("no translation backend configured"))
    }
}
