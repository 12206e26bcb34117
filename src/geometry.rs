//! Points, sizes, rects, margins, anchors and rounding helpers.
//!
//! Mirrors `PointT`/`SizeT`/`RectT`/`AnchorT` from the original packer: a
//! small templated geometry kit, specialized here to integer pixel-space
//! (`Point`, `Size`, `Rect`, `Anchor`) and sub-pixel float space (`PointF`,
//! `SizeF`, `Margin`, `AnchorF`) instead of being generic over `T`.

/// Returns `n` unchanged if `m == 0`, else the smallest multiple of `m` >= `n`.
#[must_use]
pub fn ceil_to_multiple(n: i32, m: i32) -> i32 {
    if m == 0 {
        return n;
    }
    let rem = n.rem_euclid(m);
    if rem == 0 {
        n
    } else {
        n + (m - rem)
    }
}

/// Smallest power of two >= `n`. `0` maps to `0`.
#[must_use]
pub fn ceil_to_pot(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    if n.is_power_of_two() {
        return n;
    }
    1u32 << (32 - (n - 1).leading_zeros())
}

/// Largest power of two <= `n`. `0` maps to `0`.
#[must_use]
pub fn floor_to_pot(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    1u32 << (31 - n.leading_zeros())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeF {
    pub x: f64,
    pub y: f64,
}

impl Size {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Size {
    type Output = Size;

    fn sub(self, rhs: Size) -> Size {
        Size::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub const fn xy(&self) -> Point {
        Point { x: self.x, y: self.y }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size { x: self.w, y: self.h }
    }

    #[must_use]
    pub const fn x0(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y0(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub const fn x1(&self) -> i32 {
        self.x + self.w
    }

    #[must_use]
    pub const fn y1(&self) -> i32 {
        self.y + self.h
    }

    /// `true` when the two rects share any interior pixel.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x0() < other.x1() && other.x0() < self.x1() && self.y0() < other.y1() && other.y0() < self.y1()
    }

    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        self.x0() <= other.x0() && self.y0() <= other.y0() && self.x1() >= other.x1() && self.y1() >= other.y1()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<Rect> for RectF {
    fn from(r: Rect) -> Self {
        Self {
            x: f64::from(r.x),
            y: f64::from(r.y),
            w: f64::from(r.w),
            h: f64::from(r.h),
        }
    }
}

/// Outward expansion on each side of a rect, in sub-pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margin {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// `rect` grown outward by `margin` on every side.
#[must_use]
pub fn expand(rect: RectF, margin: Margin) -> RectF {
    RectF {
        x: rect.x - margin.x0,
        y: rect.y - margin.y0,
        w: rect.w + margin.x0 + margin.x1,
        h: rect.h + margin.y0 + margin.y1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorX {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorY {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// An (x, y) offset plus a reference corner/edge/center of the size it is
/// resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
    pub anchor_x: AnchorX,
    pub anchor_y: AnchorY,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorF {
    pub x: f64,
    pub y: f64,
    pub anchor_x: AnchorX,
    pub anchor_y: AnchorY,
}

/// Resolves an anchor against `size`: `offset + reference_point(size)`.
#[must_use]
pub fn anchor_coords(anchor: &Anchor, size: Size) -> Point {
    let mut coords = Point { x: anchor.x, y: anchor.y };
    coords.x += match anchor.anchor_x {
        AnchorX::Left => 0,
        AnchorX::Center => size.x / 2,
        AnchorX::Right => size.x,
    };
    coords.y += match anchor.anchor_y {
        AnchorY::Top => 0,
        AnchorY::Middle => size.y / 2,
        AnchorY::Bottom => size.y,
    };
    coords
}

#[must_use]
pub fn anchor_coords_f(anchor: &AnchorF, size: SizeF) -> PointF {
    let mut coords = PointF { x: anchor.x, y: anchor.y };
    coords.x += match anchor.anchor_x {
        AnchorX::Left => 0.0,
        AnchorX::Center => size.x / 2.0,
        AnchorX::Right => size.x,
    };
    coords.y += match anchor.anchor_y {
        AnchorY::Top => 0.0,
        AnchorY::Middle => size.y / 2.0,
        AnchorY::Bottom => size.y,
    };
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_to_multiple_zero_passthrough() {
        assert_eq!(ceil_to_multiple(17, 0), 17);
    }

    #[test]
    fn ceil_to_multiple_rounds_up() {
        assert_eq!(ceil_to_multiple(17, 4), 20);
        assert_eq!(ceil_to_multiple(16, 4), 16);
        assert_eq!(ceil_to_multiple(0, 4), 0);
    }

    #[test]
    fn pot_roundtrip() {
        for n in [0u32, 1, 2, 3, 5, 8, 9, 127, 128, 129, 8192] {
            let up = ceil_to_pot(n);
            assert!(up >= n);
            assert_eq!(ceil_to_pot(up), up);
            let down = floor_to_pot(n);
            if n > 0 {
                assert!(down <= n);
                assert!(down >= 1);
            }
        }
    }

    #[test]
    fn anchor_resolves_against_size() {
        let size = Size::new(10, 20);
        let a = Anchor {
            x: 1,
            y: 2,
            anchor_x: AnchorX::Center,
            anchor_y: AnchorY::Bottom,
        };
        let c = anchor_coords(&a, size);
        assert_eq!(c, Point { x: 1 + 5, y: 2 + 20 });
    }

    #[test]
    fn rects_overlap_detection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(9, 9, 10, 10);
        let c = Rect::new(10, 10, 10, 10);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
