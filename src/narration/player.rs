//! Session-guarded narration playback.
//!
//! Any number of playback loops may exist at once (a loop that was stopped
//! keeps running until its next resumption point), but only the loop holding
//! the live session id may touch shared state. Every explicit stop, seek or
//! restart mints a new id and cancels the previous session's token.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::event::NarrationEvent;
use super::session::{PlaybackState, PlaybackStatus};
use super::speech::SpeechEngine;
use crate::config::{NarrationConfig, VoicesConfig};
use crate::echo::EchoGuard;
use crate::error::SpeechError;
use crate::highlight;
use crate::screen::Screen;

/// Timing knobs for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSettings {
    /// A skip-back within this long of a chunk's start goes to the previous chunk
    pub double_tap: Duration,
    /// Pause before speech resumes after navigation
    pub settle: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self::from(&NarrationConfig::default())
    }
}

impl From<&NarrationConfig> for PlayerSettings {
    fn from(config: &NarrationConfig) -> Self {
        Self {
            double_tap: Duration::from_millis(config.double_tap_ms),
            settle: Duration::from_millis(config.settle_ms),
        }
    }
}

struct Inner {
    screen: Arc<Mutex<Screen>>,
    echo: Arc<Mutex<EchoGuard>>,
    engine: Arc<dyn SpeechEngine>,
    voices: VoicesConfig,
    settings: PlayerSettings,
    state: Mutex<PlaybackState>,
    events: UnboundedSender<NarrationEvent>,
}

/// Handle to the narration player. Clones share the same player.
///
/// Lock order is playback state, then screen, then echo guard.
#[derive(Clone)]
pub struct NarrationPlayer {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for NarrationPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationPlayer")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn navigation(index: usize, total: usize, finished: bool) -> NarrationEvent {
    NarrationEvent::Navigation {
        can_back: total > 0 && (finished || index > 0),
        can_forward: !finished && index + 1 < total,
    }
}

impl NarrationPlayer {
    pub fn new(
        screen: Arc<Mutex<Screen>>,
        echo: Arc<Mutex<EchoGuard>>,
        engine: Arc<dyn SpeechEngine>,
        voices: VoicesConfig,
        settings: PlayerSettings,
    ) -> (Self, UnboundedReceiver<NarrationEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Inner {
            screen,
            echo,
            engine,
            voices,
            settings,
            state: Mutex::new(PlaybackState::default()),
            events,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    pub fn status(&self) -> PlaybackStatus {
        self.inner.state.lock().status()
    }

    pub fn screen(&self) -> &Arc<Mutex<Screen>> {
        &self.inner.screen
    }

    fn emit(&self, event: NarrationEvent) {
        // Nobody listening is fine.
        let _ = self.inner.events.send(event);
    }

    /// Play chunks from `start` to the end of the current list.
    ///
    /// Starts a new session, superseding any loop already running. Returns
    /// when the sequence finishes or the session is superseded.
    pub async fn speak(&self, start: usize) {
        let (session, token) = {
            let mut state = self.inner.state.lock();
            if !state.enabled {
                tracing::debug!("narration disabled; not speaking");
                return;
            }
            let ids = state.begin_session();
            state.paused = false;
            state.speaking = true;
            state.autoplay = true;
            state.finished = false;
            ids
        };
        self.inner.engine.cancel();
        self.run(session, token, start).await;
    }

    async fn run(&self, session: u64, token: CancellationToken, start: usize) {
        let revision = self.inner.screen.lock().revision();
        let mut index = start;
        tracing::debug!(session, start, "narration loop started");

        loop {
            let Some((text, voice)) = self.begin_chunk(session, revision, index) else {
                return;
            };
            let result = tokio::select! {
                result = self.inner.engine.speak(&text, &voice) => result,
                _ = token.cancelled() => {
                    tracing::trace!(session, index, "session superseded during speech");
                    return;
                }
            };
            if !self.complete_chunk(session, index, result) {
                return;
            }
            index += 1;
        }
    }

    /// Make chunk `index` current. `None` ends the loop.
    fn begin_chunk(&self, session: u64, revision: u64, index: usize) -> Option<(String, String)> {
        let mut state = self.inner.state.lock();
        if !state.is_current(session) || !state.enabled || state.paused {
            return None;
        }
        let mut screen = self.inner.screen.lock();
        if screen.revision() != revision {
            tracing::debug!(session, "screen content changed; narration loop ends");
            state.speaking = false;
            return None;
        }

        let total = screen.chunk_count();
        let Some(chunk) = screen.chunk(index) else {
            self.finish(&mut state, &mut screen, total);
            return None;
        };

        state.index = index;
        state.finished = false;
        state.chunk_started_at = Some(Instant::now());
        let report = highlight::apply(&mut screen, index);
        self.inner.echo.lock().record(&chunk.text);

        self.emit(NarrationEvent::Highlighted {
            chunk_index: index,
            chunk_text: chunk.text.clone(),
            total_chunks: total,
            success: report.success,
        });
        self.emit(navigation(index, total, false));

        let voice = self.inner.voices.voice_for(chunk.voice).to_string();
        Some((chunk.text, voice))
    }

    /// Account for a finished utterance. Returns whether to continue.
    fn complete_chunk(&self, session: u64, index: usize, result: Result<(), SpeechError>) -> bool {
        let state = self.inner.state.lock();
        if !state.is_current(session) {
            return false;
        }
        match result {
            Ok(()) => {}
            Err(SpeechError::Interrupted) => {
                tracing::debug!(index, "speech interrupted");
            }
            Err(error) => {
                tracing::warn!(index, %error, "speech failed; skipping chunk");
                self.emit(NarrationEvent::Status(error.to_string()));
            }
        }
        state.enabled && !state.paused && state.autoplay
    }

    fn finish(&self, state: &mut PlaybackState, screen: &mut Screen, total: usize) {
        state.index = total;
        state.finished = true;
        state.autoplay = false;
        state.speaking = false;
        state.chunk_started_at = None;
        highlight::clear(screen);
        screen.viewport_mut().scroll_to_bottom();
        tracing::debug!(total, "narration finished");
        self.emit(NarrationEvent::Finished);
        self.emit(navigation(total, total, true));
    }

    /// Stop speaking. The highlight stays when `preserve_highlight` is set.
    pub fn stop(&self, preserve_highlight: bool) {
        {
            let mut state = self.inner.state.lock();
            state.begin_session();
            state.speaking = false;
            state.autoplay = false;
        }
        self.inner.engine.cancel();
        if !preserve_highlight {
            highlight::clear(&mut self.inner.screen.lock());
        }
    }

    /// Stop speaking but keep position and highlight for [`resume`](Self::resume).
    pub fn pause(&self) {
        {
            let mut state = self.inner.state.lock();
            state.begin_session();
            state.paused = true;
            state.speaking = false;
        }
        self.inner.engine.cancel();
    }

    /// Continue from the current chunk after a pause.
    pub async fn resume(&self) {
        let index = {
            let state = self.inner.state.lock();
            if !state.paused || state.finished {
                return;
            }
            state.index
        };
        self.speak(index).await;
    }

    /// Enable or disable narration. Disabling stops playback.
    pub fn set_enabled(&self, enabled: bool) {
        if !enabled {
            self.stop(false);
        }
        self.inner.state.lock().enabled = enabled;
    }

    /// Jump to chunk `index` (clamped to the list).
    pub fn seek(&self, index: usize) -> Option<usize> {
        self.navigate(|_, _| index)
    }

    /// Move `delta` chunks forward (or back when negative), clamped.
    pub fn skip(&self, delta: isize) -> Option<usize> {
        self.navigate(|state, total| {
            let base = state.index.min(total) as isize;
            base.saturating_add(delta).clamp(0, total as isize - 1) as usize
        })
    }

    /// Restart the current chunk, or go to the previous one when pressed
    /// again right after a chunk started. From the finished state, go to
    /// the last chunk.
    pub fn skip_back(&self) -> Option<usize> {
        let double_tap = self.inner.settings.double_tap;
        self.navigate(move |state, total| {
            if state.finished {
                return total - 1;
            }
            let recent = state
                .chunk_started_at
                .is_some_and(|started| started.elapsed() <= double_tap);
            if recent {
                state.index.saturating_sub(1)
            } else {
                state.index
            }
        })
    }

    pub fn restart(&self) -> Option<usize> {
        self.navigate(|_, _| 0)
    }

    /// Shared navigation: new session, move the highlight, and resume speech
    /// at the target after the settle delay if it was speaking. Outside a
    /// Tokio runtime the player is left paused at the target instead.
    fn navigate(&self, target: impl FnOnce(&PlaybackState, usize) -> usize) -> Option<usize> {
        let (session, token, index, resume) = {
            let mut state = self.inner.state.lock();
            let mut screen = self.inner.screen.lock();
            let total = screen.chunk_count();
            if total == 0 {
                return None;
            }
            let index = target(&*state, total).min(total - 1);
            let resume = state.speaking && !state.paused && state.enabled;
            let (session, token) = state.begin_session();
            state.index = index;
            state.finished = false;
            state.chunk_started_at = Some(Instant::now());
            if !resume {
                state.speaking = false;
                state.paused = true;
            }

            let report = highlight::apply(&mut screen, index);
            let chunk_text = screen.chunk(index).map(|c| c.text).unwrap_or_default();
            self.emit(NarrationEvent::Highlighted {
                chunk_index: index,
                chunk_text,
                total_chunks: total,
                success: report.success,
            });
            self.emit(navigation(index, total, false));
            (session, token, index, resume)
        };
        tracing::debug!(index, resume, "navigated");

        if resume {
            self.inner.engine.cancel();
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                tracing::warn!(index, "no async runtime; narration left paused");
                let mut state = self.inner.state.lock();
                if state.is_current(session) {
                    state.speaking = false;
                    state.paused = true;
                }
                return Some(index);
            };
            let player = self.clone();
            let settle = self.inner.settings.settle;
            runtime.spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(settle) => {}
                    _ = token.cancelled() => return,
                }
                player.resume_session(session, token, index).await;
            });
        }
        Some(index)
    }

    async fn resume_session(&self, session: u64, token: CancellationToken, index: usize) {
        {
            let mut state = self.inner.state.lock();
            if !state.is_current(session) {
                return;
            }
            state.speaking = true;
            state.autoplay = true;
            state.paused = false;
        }
        self.run(session, token, index).await;
    }
}
