//! Platform speech engines.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::SpeechError;

/// A text-to-speech service.
///
/// `speak` resolves when the utterance has finished playing. `cancel` stops
/// whatever is playing; the pending `speak` then resolves with
/// [`SpeechError::Interrupted`].
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, text: &str, voice: &str) -> Result<(), SpeechError>;
    fn cancel(&self);
}

/// Holds the token of the utterance in flight so `cancel` can reach it.
#[derive(Debug, Default)]
struct Utterance {
    token: Mutex<CancellationToken>,
}

impl Utterance {
    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.token.lock() = token.clone();
        token
    }

    fn cancel(&self) {
        self.token.lock().cancel();
    }
}

/// Prints utterances to stdout, paced at a reading speed.
#[derive(Debug)]
pub struct ConsoleSpeech {
    words_per_minute: u32,
    utterance: Utterance,
}

impl ConsoleSpeech {
    /// `words_per_minute` of 0 disables pacing.
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute,
            utterance: Utterance::default(),
        }
    }

    fn duration_of(&self, text: &str) -> Duration {
        if self.words_per_minute == 0 {
            return Duration::ZERO;
        }
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / u64::from(self.words_per_minute))
    }
}

#[async_trait]
impl SpeechEngine for ConsoleSpeech {
    async fn speak(&self, text: &str, voice: &str) -> Result<(), SpeechError> {
        let token = self.utterance.begin();
        {
            let mut out = std::io::stdout().lock();
            let line = if voice == "default" {
                format!("  \u{bb} {text}")
            } else {
                format!("  \u{bb} [{voice}] {text}")
            };
            writeln!(out, "{line}").map_err(|e| SpeechError::Failed(e.to_string()))?;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.duration_of(text)) => Ok(()),
            _ = token.cancelled() => Err(SpeechError::Interrupted),
        }
    }

    fn cancel(&self) {
        self.utterance.cancel();
    }
}

/// In-memory engine: records what was spoken and takes a fixed time per
/// utterance. Optionally each utterance waits for a release signal instead,
/// and queued failures can be injected.
#[derive(Debug, Default)]
pub struct MemorySpeech {
    spoken: Mutex<Vec<(String, String)>>,
    duration: Duration,
    gate: Option<Arc<Notify>>,
    failures: Mutex<VecDeque<SpeechError>>,
    utterance: Utterance,
}

impl MemorySpeech {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Utterances complete only when `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Make the next `speak` call fail with `error`.
    pub fn fail_next(&self, error: SpeechError) {
        self.failures.lock().push_back(error);
    }

    /// Texts spoken so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|(text, _)| text.clone()).collect()
    }

    /// Texts spoken so far with the voice used for each.
    pub fn spoken_with_voices(&self) -> Vec<(String, String)> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl SpeechEngine for MemorySpeech {
    async fn speak(&self, text: &str, voice: &str) -> Result<(), SpeechError> {
        let token = self.utterance.begin();
        self.spoken.lock().push((text.to_string(), voice.to_string()));
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        match &self.gate {
            Some(gate) => {
                // Completion ignores cancellation: the caller must cope with
                // an utterance that finishes after it stopped caring.
                gate.notified().await;
                Ok(())
            }
            None => tokio::select! {
                _ = tokio::time::sleep(self.duration) => Ok(()),
                _ = token.cancelled() => Err(SpeechError::Interrupted),
            },
        }
    }

    fn cancel(&self) {
        self.utterance.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn memory_speech_records_and_waits() {
        let engine = MemorySpeech::new(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        engine.speak("Hello there.", "narrator").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(
            engine.spoken_with_voices(),
            vec![("Hello there.".to_string(), "narrator".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_pending_utterance() {
        let engine = Arc::new(MemorySpeech::new(Duration::from_secs(60)));
        let speaking = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.speak("long", "default").await })
        };
        tokio::task::yield_now().await;
        engine.cancel();
        assert_eq!(speaking.await.unwrap(), Err(SpeechError::Interrupted));
    }

    #[tokio::test]
    async fn injected_failure_is_returned_once() {
        let engine = MemorySpeech::new(Duration::ZERO);
        engine.fail_next(SpeechError::Failed("no audio device".into()));
        assert!(matches!(
            engine.speak("a", "default").await,
            Err(SpeechError::Failed(_))
        ));
        assert!(engine.speak("b", "default").await.is_ok());
    }

    #[test]
    fn console_pacing_scales_with_words() {
        let engine = ConsoleSpeech::new(120);
        assert_eq!(engine.duration_of("one two"), Duration::from_secs(1));
        assert_eq!(ConsoleSpeech::new(0).duration_of("x y z"), Duration::ZERO);
    }
}
