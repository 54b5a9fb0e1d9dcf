// ── Scroll synchronization ────────────────────────────────────────────────────
//
// The engine reports its viewport after every layout-affecting change; this
// module turns that into scrollbar parameters.  Vertical sync pushes
// `(top, limit, visible)` with `limit = max_top + visible`; it never clamps,
// that is up to the scrollbar.  Horizontal sync is an extension point: the
// default does nothing, because word wrap (on by default) leaves nothing to
// scroll sideways.

/// A host scrollbar.
pub trait ScrollBar {
    /// `value` is the first visible unit, `limit` the total extent, `page`
    /// the visible extent.
    fn set_params(&mut self, value: usize, limit: usize, page: usize);
}

/// Plain scrollbar state, for hosts that draw their own bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub value: usize,
    pub limit: usize,
    pub page: usize,
}

impl ScrollBar for ScrollState {
    fn set_params(&mut self, value: usize, limit: usize, page: usize) {
        *self = Self { value, limit, page };
    }
}

impl ScrollState {
    /// Thumb `(offset, length)` for a track of `track` cells.
    pub fn thumb(&self, track: usize) -> (usize, usize) {
        if self.limit == 0 || self.page >= self.limit || track == 0 {
            return (0, track);
        }
        let len = (track * self.page / self.limit).clamp(1, track);
        let span = self.limit - self.page;
        let pos = (track - len) * self.value.min(span) / span.max(1);
        (pos, len)
    }
}

/// Push the engine's vertical viewport to `bar`.
pub fn sync_vertical(bar: &mut dyn ScrollBar, top_line: usize, max_top_line: usize, visible: usize) {
    bar.set_params(top_line, max_top_line + visible, visible);
}

// ── Horizontal extension point ────────────────────────────────────────────────

/// Horizontal sync policy.  The default implementation ignores updates.
pub trait HorizontalSync {
    fn sync(&mut self, _x_offset: usize, _max_width: usize, _page: usize) {}

    /// Current state, for hosts that display it.
    fn state(&self) -> Option<ScrollState> {
        None
    }
}

/// The default policy: no horizontal scrollbar.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHorizontalSync;

impl HorizontalSync for NoHorizontalSync {}

/// Opt-in policy for hosts that turn word wrap off.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackHorizontal(pub ScrollState);

impl HorizontalSync for TrackHorizontal {
    fn sync(&mut self, x_offset: usize, max_width: usize, page: usize) {
        self.0.set_params(x_offset, max_width, page);
    }

    fn state(&self) -> Option<ScrollState> {
        Some(self.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_max_top_plus_visible() {
        let mut bar = ScrollState::default();
        sync_vertical(&mut bar, 7, 40, 10);
        assert_eq!(bar, ScrollState { value: 7, limit: 50, page: 10 });
    }

    #[test]
    fn vertical_sync_does_not_clamp() {
        let mut bar = ScrollState::default();
        sync_vertical(&mut bar, 60, 40, 10);
        assert_eq!(bar.value, 60);
    }

    #[test]
    fn default_horizontal_policy_is_inert() {
        let mut h = NoHorizontalSync;
        h.sync(5, 2000, 80);
        assert_eq!(h.state(), None);
        let mut t = TrackHorizontal::default();
        t.sync(5, 2000, 80);
        assert_eq!(t.state(), Some(ScrollState { value: 5, limit: 2000, page: 80 }));
    }

    #[test]
    fn thumb_fills_track_when_everything_fits() {
        let s = ScrollState { value: 0, limit: 5, page: 10 };
        assert_eq!(s.thumb(8), (0, 8));
        let s = ScrollState { value: 90, limit: 100, page: 10 };
        assert_eq!(s.thumb(10), (9, 1));
    }
}
