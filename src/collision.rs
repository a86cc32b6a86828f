/// Axis-aligned bounding boxes and the overlap test used for every hit.

use crate::vector::Vec2;

/// Screen-space rectangle; `top < bottom` because y grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Box of `size` centred on `center`.
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half_w = size.x / 2.0;
        let half_h = size.y / 2.0;
        Rect {
            left: center.x - half_w,
            top: center.y - half_h,
            right: center.x + half_w,
            bottom: center.y + half_h,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Anything with a derived bounding box.
pub trait Bounded {
    fn bounds(&self) -> Rect;
}

/// Separating-axis test. Boxes that only share an edge do not overlap.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !(a.right <= b.left || a.left >= b.right || a.bottom <= b.top || a.top >= b.bottom)
}

pub fn collides(a: &impl Bounded, b: &impl Bounded) -> bool {
    overlaps(&a.bounds(), &b.bounds())
}
