/// Notifications emitted by the narration player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    /// A chunk became current. `success` is false when it could not be
    /// located on screen and plays unhighlighted.
    Highlighted {
        chunk_index: usize,
        chunk_text: String,
        total_chunks: usize,
        success: bool,
    },
    /// Whether back/forward navigation is currently possible.
    Navigation { can_back: bool, can_forward: bool },
    /// Human-readable status, e.g. a speech failure.
    Status(String),
    /// The last chunk finished playing.
    Finished,
}
