//! Playback session bookkeeping.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Mutable playback state shared between the player handle and its loops.
///
/// The session counter lives here so that checking it and acting on the
/// result happen under the same lock.
#[derive(Debug)]
pub struct PlaybackState {
    session: u64,
    token: CancellationToken,
    pub index: usize,
    pub paused: bool,
    pub enabled: bool,
    /// A loop is (or is about to be) speaking
    pub speaking: bool,
    /// Advance to the next chunk when one finishes
    pub autoplay: bool,
    /// The last chunk finished; index equals the chunk count
    pub finished: bool,
    pub chunk_started_at: Option<Instant>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            session: 0,
            token: CancellationToken::new(),
            index: 0,
            paused: false,
            enabled: true,
            speaking: false,
            autoplay: false,
            finished: false,
            chunk_started_at: None,
        }
    }
}

impl PlaybackState {
    /// Supersede the live session: wake anything waiting on its token and
    /// mint a new id.
    pub fn begin_session(&mut self) -> (u64, CancellationToken) {
        self.token.cancel();
        self.session += 1;
        self.token = CancellationToken::new();
        (self.session, self.token.clone())
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn is_current(&self, session: u64) -> bool {
        self.session == session
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            session: self.session,
            index: self.index,
            paused: self.paused,
            enabled: self.enabled,
            speaking: self.speaking,
            finished: self.finished,
        }
    }
}

/// Read-only view of the playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub session: u64,
    pub index: usize,
    pub paused: bool,
    pub enabled: bool,
    pub speaking: bool,
    pub finished: bool,
}
