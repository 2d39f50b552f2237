/// Near-bottom distance used to resume follow mode deterministically.
const AUTO_FOLLOW_RESUME_THRESHOLD: f32 = 24.0;
/// Small delta used to ignore floating-point scroll jitter.
const SCROLL_DELTA_EPSILON: f32 = 1.0;

/// Scroll position reported by the host, measured from the top of the list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub offset: f32,
    pub max_offset: f32,
}

impl Viewport {
    pub fn new(offset: f32, max_offset: f32) -> Self {
        Self { offset, max_offset }
    }

    fn is_near_bottom(&self) -> bool {
        if self.max_offset <= 0.0 {
            return true;
        }
        (self.max_offset - self.offset).abs() <= AUTO_FOLLOW_RESUME_THRESHOLD
    }
}

/// Keeps the message list pinned to the latest message unless the user scrolls away.
#[derive(Debug, Clone)]
pub struct ScrollFollow {
    pending_scroll_to_bottom: bool,
    follow_bottom: bool,
    last: Viewport,
}

impl ScrollFollow {
    pub fn new() -> Self {
        Self {
            pending_scroll_to_bottom: false,
            follow_bottom: true,
            last: Viewport::default(),
        }
    }

    pub fn is_following_bottom(&self) -> bool {
        self.follow_bottom
    }

    pub fn request_scroll_to_bottom(&mut self) {
        self.pending_scroll_to_bottom = true;
        self.follow_bottom = true;
    }

    pub fn request_scroll_to_bottom_if_following(&mut self) {
        if self.follow_bottom || self.last.is_near_bottom() {
            self.pending_scroll_to_bottom = true;
        }
    }

    /// Feeds the latest measured viewport back in after the host scrolled or re-laid out.
    pub fn update(&mut self, viewport: Viewport) {
        let offset_delta = viewport.offset - self.last.offset;
        let max_delta = (viewport.max_offset - self.last.max_offset).abs();
        let content_size_changed = max_delta > SCROLL_DELTA_EPSILON;
        let user_scrolled_up = offset_delta < -SCROLL_DELTA_EPSILON && !content_size_changed;
        let user_scrolled_down = offset_delta > SCROLL_DELTA_EPSILON && !content_size_changed;

        if self.pending_scroll_to_bottom || (content_size_changed && self.last.is_near_bottom()) {
            self.follow_bottom = true;
        } else if self.follow_bottom {
            // Pause only when the user moves away from the tail themselves.
            if user_scrolled_up {
                self.follow_bottom = false;
            }
        } else if user_scrolled_down && viewport.is_near_bottom() {
            self.follow_bottom = true;
        }

        self.last = viewport;
    }

    /// Returns the offset the host should scroll to, if any, and clears the request.
    pub fn take_scroll_target(&mut self) -> Option<f32> {
        let should_scroll = self.follow_bottom || self.pending_scroll_to_bottom;
        self.pending_scroll_to_bottom = false;
        should_scroll.then_some(self.last.max_offset.max(0.0))
    }
}

impl Default for ScrollFollow {
    fn default() -> Self {
        Self::new()
    }
}

/// Open/closed state of the floating widget plus its scroll behaviour.
#[derive(Debug, Clone, Default)]
pub struct WidgetPresentation {
    open: bool,
    scroll: ScrollFollow,
}

impl WidgetPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        if !self.open {
            self.open = true;
            // Reopening always lands on the latest message.
            self.scroll.request_scroll_to_bottom();
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn scroll(&self) -> &ScrollFollow {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollFollow {
        &mut self.scroll
    }

    pub fn history_changed(&mut self) {
        self.scroll.request_scroll_to_bottom_if_following();
    }
}
