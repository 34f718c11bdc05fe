//! Decides whether map motion is large enough to warrant a new search.

use provmap_core::Viewport;

/// Fraction of the previous span that the center or span must move by.
pub const REFETCH_THRESHOLD: f64 = 0.25;

/// `true` when `new` differs from `old` by more than [`REFETCH_THRESHOLD`]
/// of `old`'s span on either axis, either in center position or in span.
#[must_use]
pub fn exceeds_refetch_threshold(new: &Viewport, old: &Viewport) -> bool {
    let lat_limit = old.lat_span * REFETCH_THRESHOLD;
    let lng_limit = old.lng_span * REFETCH_THRESHOLD;

    (new.center.lat - old.center.lat).abs() > lat_limit
        || (new.center.lng - old.center.lng).abs() > lng_limit
        || (new.lng_span - old.lng_span).abs() > lng_limit
        || (new.lat_span - old.lat_span).abs() > lat_limit
}

/// Refetch advisor gated on the display surface being initialized.
///
/// Layout passes before the map is ready report throwaway regions; until
/// [`mark_display_ready`](Self::mark_display_ready) is called every answer
/// is `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportChangeDetector {
    display_ready: bool,
}

impl ViewportChangeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_display_ready(&mut self) {
        self.display_ready = true;
    }

    #[must_use]
    pub fn is_display_ready(&self) -> bool {
        self.display_ready
    }

    #[must_use]
    pub fn should_refetch(&self, new: &Viewport, old: &Viewport) -> bool {
        self.display_ready && exceeds_refetch_threshold(new, old)
    }
}
