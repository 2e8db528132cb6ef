//! Rectangles in document space and percentage boxes within a page.
//!
//! All selection geometry lives in document coordinates: viewport (client)
//! positions plus the current scroll offset. Scrolling therefore moves the
//! pointer, never the elements.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle, `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Rectangle spanning two corner points in any order.
    pub fn spanning(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Strict overlap: rectangles that only share an edge do not intersect,
    /// and a zero-area rectangle intersects nothing.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.area() > 0.0
            && other.area() > 0.0
            && self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

/// A box in percent of the page container, as written in overlay markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PercentBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Place this box inside `container`.
    pub fn to_rect(&self, container: &Rect) -> Rect {
        let x = container.left + container.width() * self.left / 100.0;
        let y = container.top + container.height() * self.top / 100.0;
        Rect::from_origin_size(
            x,
            y,
            container.width() * self.width / 100.0,
            container.height() * self.height / 100.0,
        )
    }
}

/// Current layout of the reading surface, supplied by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SurfaceLayout {
    /// Page container rectangle in document coordinates.
    pub container: Rect,
    /// Scroll offset of the reading surface.
    pub scroll: Point,
    /// Viewport height, for `vh` font sizes.
    pub viewport_height: f64,
}

impl SurfaceLayout {
    pub fn new(container: Rect) -> Self {
        Self {
            container,
            scroll: Point::default(),
            viewport_height: container.height(),
        }
    }

    /// Convert a viewport (client) position to document coordinates.
    pub fn to_document(&self, client: Point) -> Point {
        Point::new(client.x + self.scroll.x, client.y + self.scroll.y)
    }
}
