#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Coordinates are layout units (pixels), origin at the top-left of the
//! document canvas. Values are signed because carets may sit left of or above
//! a scrolled viewport.

/// A point in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle for caret bounds, selection highlights, and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in layout units.
    pub width: i32,
    /// Height in layout units.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
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

    /// The smallest rectangle that contains both.
    ///
    /// Empty rectangles do not contribute, so folding a list of rects from
    /// `Rect::default()` yields their tight bounding box.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }

    /// Move the rectangle by an offset.
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }
}

/// Local-to-absolute mapping for a renderer.
///
/// Renderers in the layout collaborator are positioned by translation and an
/// integral zoom factor (1 = unscaled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform {
    pub dx: i32,
    pub dy: i32,
    pub scale: i32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, no scaling.
    pub const IDENTITY: Transform = Transform {
        dx: 0,
        dy: 0,
        scale: 1,
    };

    /// A pure translation.
    #[inline]
    pub const fn translation(dx: i32, dy: i32) -> Self {
        Self { dx, dy, scale: 1 }
    }

    /// Map a local point to absolute coordinates.
    #[inline]
    pub const fn map_point(&self, p: Point) -> Point {
        Point::new(
            p.x.saturating_mul(self.scale).saturating_add(self.dx),
            p.y.saturating_mul(self.scale).saturating_add(self.dy),
        )
    }

    /// Map a local rectangle to absolute coordinates.
    #[inline]
    pub const fn map_rect(&self, r: Rect) -> Rect {
        let origin = self.map_point(r.origin());
        Rect::new(
            origin.x,
            origin.y,
            r.width.saturating_mul(self.scale),
            r.height.saturating_mul(self.scale),
        )
    }

    /// Compose: apply `self` first, then `outer`.
    pub const fn then(&self, outer: &Transform) -> Transform {
        Transform {
            dx: self.dx.saturating_mul(outer.scale).saturating_add(outer.dx),
            dy: self.dy.saturating_mul(outer.scale).saturating_add(outer.dy),
            scale: self.scale.saturating_mul(outer.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Transform};

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(Point::new(2, 3)));
        assert!(rect.contains(Point::new(5, 7)));
        assert!(!rect.contains(Point::new(6, 3)));
        assert!(!rect.contains(Point::new(2, 8)));
    }

    #[test]
    fn rect_intersection_no_overlap_is_empty() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(3, 3, 2, 2);
        assert_eq!(a.intersection(&b), Rect::default());
        assert_eq!(
            Rect::new(0, 0, 4, 4).intersection(&Rect::new(2, 2, 4, 4)),
            Rect::new(2, 2, 2, 2)
        );
    }

    #[test]
    fn union_ignores_empty() {
        let a = Rect::new(10, 10, 2, 16);
        assert_eq!(Rect::default().union(&a), a);
        assert_eq!(
            a.union(&Rect::new(0, 30, 4, 16)),
            Rect::new(0, 10, 12, 36)
        );
    }

    #[test]
    fn transform_maps_and_composes() {
        let inner = Transform::translation(5, 7);
        let outer = Transform {
            dx: 100,
            dy: 0,
            scale: 2,
        };
        let r = Rect::new(1, 1, 3, 4);
        let composed = inner.then(&outer);
        assert_eq!(composed.map_rect(r), outer.map_rect(inner.map_rect(r)));
        assert_eq!(Transform::IDENTITY.map_rect(r), r);
    }
}
