//! Rectangle type for plane bounds and sub-image views.
//!
//! # Coordinate System
//!
//! All coordinates use the standard image convention:
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//! - Rows are stored row-major, top row first
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Plane   │
//!   │   │  Bounds  │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! Coordinates are signed: container headers are untrusted and a rectangle
//! built from them may carry a negative extent, which plane allocation
//! rejects instead of wrapping.
//!
//! # Usage
//!
//! ```rust
//! use hdrtex_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(rect.contains(15, 25));
//! assert!(!rect.contains(5, 25));
//!
//! let other = Rect::new(50, 40, 100, 50);
//! if let Some(overlap) = rect.intersect(&other) {
//!     assert_eq!(overlap.width, 60);
//! }
//! ```
//!
//! # Used By
//!
//! - [`crate::plane::Plane`] - Bounds, sub-image intersection
//! - `hdrtex-io` - EXR data window, DDS mip dimensions

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// The left and top edges are inclusive, [`right`](Rect::right) and
/// [`bottom`](Rect::bottom) are exclusive.
///
/// # Invariants
///
/// - A rectangle with zero or negative width or height is empty
///
/// # Example
///
/// ```rust
/// use hdrtex_core::Rect;
///
/// let rect = Rect::new(10, 20, 100, 50);
/// assert_eq!(rect.right(), 110);
/// assert_eq!(rect.bottom(), 70);
/// assert_eq!(rect.area(), 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from origin (0, 0) with given dimensions.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Creates a rectangle from its top-left (inclusive) and bottom-right
    /// (exclusive) corners.
    ///
    /// ```rust
    /// use hdrtex_core::Rect;
    ///
    /// let rect = Rect::from_corners(2, 3, 10, 7);
    /// assert_eq!(rect, Rect::new(2, 3, 8, 4));
    /// ```
    #[inline]
    pub const fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Exact exclusive right edge.
    #[inline]
    const fn right_i64(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exact exclusive bottom edge.
    #[inline]
    const fn bottom_i64(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Number of pixels covered, zero for empty rectangles.
    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the point lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && (x as i64) < self.right_i64()
            && y >= self.y
            && (y as i64) < self.bottom_i64()
    }

    /// Returns the overlap of two rectangles, or `None` when they are
    /// disjoint or either is empty.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right_i64().min(other.right_i64());
        let y1 = self.bottom_i64().min(other.bottom_i64());
        if x1 <= x0 as i64 || y1 <= y0 as i64 {
            return None;
        }
        // the overlap is no wider than either input, so it fits in i32
        Some(Rect::new(
            x0,
            y0,
            (x1 - x0 as i64) as i32,
            (y1 - y0 as i64) as i32,
        ))
    }

    /// Iterates all coordinates row by row, top to bottom.
    pub fn iter_coords(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}
