use backend_api::model::SwipeDirection;

/// Default horizontal offset (logical pixels) that commits a pass/like.
pub const H_THRESHOLD: f32 = 120.0;
/// Default upward offset that commits a super-like.
pub const V_THRESHOLD: f32 = 140.0;

/// Tracks a drag from pointer-down to release and turns the final offset
/// into a swipe decision, or cancels below threshold.
#[derive(Debug)]
pub struct DragTracker {
    origin: Option<(f32, f32)>,
    offset: (f32, f32),
    h_threshold: f32,
    v_threshold: f32,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new(H_THRESHOLD, V_THRESHOLD)
    }
}

impl DragTracker {
    pub fn new(h_threshold: f32, v_threshold: f32) -> Self {
        Self {
            origin: None,
            offset: (0.0, 0.0),
            h_threshold,
            v_threshold,
        }
    }

    pub fn start(&mut self, x: f32, y: f32) {
        self.origin = Some((x, y));
        self.offset = (0.0, 0.0);
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        if let Some((ox, oy)) = self.origin {
            self.offset = (x - ox, y - oy);
        }
    }

    /// Current offset, for rendering the card under the pointer.
    pub fn offset(&self) -> (f32, f32) {
        self.offset
    }

    /// End the drag. Horizontal offsets win over vertical; below both
    /// thresholds the gesture cancels and the offset snaps back to zero.
    pub fn release(&mut self) -> Option<SwipeDirection> {
        let (dx, dy) = self.offset;
        self.origin = None;
        self.offset = (0.0, 0.0);
        if dx >= self.h_threshold {
            Some(SwipeDirection::Like)
        } else if dx <= -self.h_threshold {
            Some(SwipeDirection::Pass)
        } else if dy <= -self.v_threshold {
            Some(SwipeDirection::SuperLike)
        } else {
            None
        }
    }
}
