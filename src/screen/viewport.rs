//! Scroll viewport abstraction.

use std::sync::Arc;

use parking_lot::Mutex;

use super::Zone;
use crate::dom::NodeId;

/// Whatever presents the zones to the user and can scroll them.
pub trait Viewport: Send {
    /// Whether the node is entirely on screen.
    fn is_fully_visible(&self, zone: Zone, node: NodeId) -> bool;
    /// Scroll so that the node sits in the middle of the viewport.
    fn scroll_to_center(&mut self, zone: Zone, node: NodeId);
    /// Scroll the main text to its end.
    fn scroll_to_bottom(&mut self);
}

/// A scroll request observed by [`HeadlessViewport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportCall {
    Center(Zone, NodeId),
    Bottom,
}

/// Viewport with no display: records scroll calls for inspection.
///
/// Clones share the same call log, so a test can keep a handle after moving
/// the viewport into a [`Screen`](super::Screen).
#[derive(Debug, Clone, Default)]
pub struct HeadlessViewport {
    calls: Arc<Mutex<Vec<ViewportCall>>>,
    everything_visible: bool,
}

impl HeadlessViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A viewport that reports every node as already visible.
    pub fn all_visible() -> Self {
        Self {
            everything_visible: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ViewportCall> {
        self.calls.lock().clone()
    }
}

impl Viewport for HeadlessViewport {
    fn is_fully_visible(&self, _zone: Zone, _node: NodeId) -> bool {
        self.everything_visible
    }

    fn scroll_to_center(&mut self, zone: Zone, node: NodeId) {
        self.calls.lock().push(ViewportCall::Center(zone, node));
    }

    fn scroll_to_bottom(&mut self) {
        self.calls.lock().push(ViewportCall::Bottom);
    }
}
