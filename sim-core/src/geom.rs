//! Axis-aligned rectangles used for index boundaries and range queries.

use glam::DVec2;

/// An axis-aligned rectangle given by its top-left corner and size.
///
/// World space has y growing downward, as on screen: the top edge is `y`,
/// the bottom edge is `y + height`, and "north" means smaller `y`.
///
/// Point containment is half-open (`x <= p.x < x + width`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size whose center is `center`.
    pub fn from_center(center: DVec2, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    #[inline]
    pub fn corner(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Returns `true` if `p` lies inside the rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom edges
    /// exclusive.
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Returns `true` if the two rectangles overlap or touch.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        let above = self.bottom() < other.y;
        let below = self.y > other.bottom();
        let right_of = self.x > other.right();
        let left_of = self.right() < other.x;
        !(above || below || right_of || left_of)
    }

    /// Scales width and height by `factor`, keeping the center fixed.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_center(self.center(), self.width * factor, self.height * factor)
    }

    /// Moves the rectangle so that its center is `center`.
    pub fn centered_at(&self, center: DVec2) -> Self {
        Self::from_center(center, self.width, self.height)
    }

    /// Splits the rectangle at its center into four quadrants.
    ///
    /// Neighboring quadrants share their split lines exactly, and the outer
    /// quadrant edges reach at least the parent's `right()` and `bottom()`,
    /// so every point the parent contains lies in exactly one quadrant.
    ///
    /// ### Returns
    /// `[northeast, southeast, southwest, northwest]`.
    pub fn quadrants(&self) -> [Rect; 4] {
        let c = self.center();
        let west = c.x - self.x;
        let north = c.y - self.y;
        // Same expressions as the west/north quadrants' `right()`/`bottom()`.
        let split_x = self.x + west;
        let split_y = self.y + north;
        let east = width_reaching(split_x, self.right());
        let south = width_reaching(split_y, self.bottom());
        [
            Rect::new(split_x, self.y, east, north),
            Rect::new(split_x, split_y, east, south),
            Rect::new(self.x, split_y, west, south),
            Rect::new(self.x, self.y, west, north),
        ]
    }

    /// Returns `true` if every component is finite and the size is positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Smallest width for which `start + width` is at least `end`.
///
/// `end - start` can round so that adding it back to `start` lands one ulp
/// short of `end`.
fn width_reaching(start: f64, end: f64) -> f64 {
    let mut width = (end - start).max(0.0);
    while start + width < end {
        width = f64::from_bits(width.to_bits() + 1);
    }
    width
}
