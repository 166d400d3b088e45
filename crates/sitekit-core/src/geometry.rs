#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.

/// A bounding box, as reported by `getBoundingClientRect`.
///
/// Coordinates are relative to the viewport's top-left corner unless stated
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge. Alias for `self.x`.
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge. Alias for `self.y`.
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Translate by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}

/// Visible area of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The viewport as a rectangle at the origin.
    #[inline]
    pub const fn as_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Whether `rect` (viewport-relative) is inside the viewport.
///
/// `threshold` is a fraction of the viewport, clamped to `[0, 1]`. On each
/// axis the element's near edge must sit at or before `1 - threshold` of the
/// viewport and its far edge at or after `threshold` of it. A threshold of
/// `0` accepts any touch, `0.5` requires the element to straddle the
/// viewport's midline.
#[must_use]
pub fn is_in_viewport(rect: &Rect, viewport: &Viewport, threshold: f64) -> bool {
    let threshold = threshold.clamp(0.0, 1.0);
    let vertical = rect.top() <= viewport.height * (1.0 - threshold)
        && rect.bottom() >= viewport.height * threshold;
    let horizontal = rect.left() <= viewport.width * (1.0 - threshold)
        && rect.right() >= viewport.width * threshold;
    vertical && horizontal
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport::new(1024.0, 768.0);

    #[test]
    fn rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert!(!rect.is_empty());
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn rect_intersection_overlaps() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection_opt(&b), Some(Rect::new(2.0, 2.0, 2.0, 2.0)));
        assert_eq!(a.intersection_opt(&Rect::new(5.0, 5.0, 1.0, 1.0)), None);
    }

    #[test]
    fn element_fully_inside_is_visible() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert!(is_in_viewport(&rect, &VIEW, 0.0));
        assert!(is_in_viewport(&rect, &VIEW, 0.1));
    }

    #[test]
    fn element_below_fold_is_not_visible() {
        let rect = Rect::new(0.0, 900.0, 200.0, 100.0);
        assert!(!is_in_viewport(&rect, &VIEW, 0.0));
    }

    #[test]
    fn element_scrolled_past_is_not_visible() {
        let rect = Rect::new(0.0, -300.0, 200.0, 100.0);
        assert!(!is_in_viewport(&rect, &VIEW, 0.0));
    }

    #[test]
    fn threshold_requires_deeper_overlap() {
        // Top edge at 700px: visible at zero threshold, not once 10% is required.
        let rect = Rect::new(0.0, 700.0, 200.0, 200.0);
        assert!(is_in_viewport(&rect, &VIEW, 0.0));
        assert!(!is_in_viewport(&rect, &VIEW, 0.1));
    }

    #[test]
    fn horizontal_axis_is_checked() {
        let rect = Rect::new(1100.0, 10.0, 50.0, 50.0);
        assert!(!is_in_viewport(&rect, &VIEW, 0.0));
    }
}
