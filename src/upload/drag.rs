/// Reference-counted drag-and-drop hover state
///
/// Enter and leave events arrive for nested targets, so a leave only ends
/// the hover when the depth returns to zero. A drop always resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragTracker {
    depth: u32,
    dragging: bool,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A drag entered a target; only a drag carrying items shows the indicator
    pub fn on_enter(&mut self, has_items: bool) {
        self.depth = self.depth.saturating_add(1);
        if has_items {
            self.dragging = true;
        }
    }

    /// A drag left a target
    pub fn on_leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.dragging = false;
        }
    }

    /// Items were dropped
    pub fn on_drop(&mut self) {
        self.depth = 0;
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}
