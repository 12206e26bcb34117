//! Typed 2-D pixel buffer helpers: sub-rect views, cloning and byte-identity.
//!
//! Packing only ever needs RGBA pixel access and byte-level equality over a
//! rectangle, so this stays a thin layer on top of `image::RgbaImage` rather
//! than a bespoke buffer type (the teacher already leans on `image` for this;
//! see `image_util::crop_images` for the equivalent sub-rect pattern).

use crate::geometry::Rect;
use crate::sprite::Trim;
use image::{GenericImageView as _, Rgba, RgbaImage};

/// A read-only view into a sub-rectangle of an [`RgbaImage`].
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    image: &'a RgbaImage,
    rect: Rect,
}

impl<'a> ImageView<'a> {
    #[must_use]
    pub fn new(image: &'a RgbaImage, rect: Rect) -> Self {
        Self { image, rect }
    }

    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Pixel at `(x, y)` relative to the view's origin.
    #[must_use]
    pub fn value_at(&self, x: i32, y: i32) -> Rgba<u8> {
        self.image
            .get_pixel(u32::try_from(self.rect.x + x).unwrap_or(0), u32::try_from(self.rect.y + y).unwrap_or(0))
    }

    /// All pixels in the view, in raster order.
    pub fn values(&self) -> impl Iterator<Item = Rgba<u8>> + '_ {
        let (w, h) = (self.rect.w, self.rect.h);
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y))).map(move |(x, y)| self.value_at(x, y))
    }
}

/// `true` iff both rects have equal dimensions and byte-identical content.
#[must_use]
pub fn is_identical(img_a: &RgbaImage, rect_a: Rect, img_b: &RgbaImage, rect_b: Rect) -> bool {
    if rect_a.w != rect_b.w || rect_a.h != rect_b.h {
        return false;
    }

    let view_a = ImageView::new(img_a, rect_a);
    let view_b = ImageView::new(img_b, rect_b);
    view_a.values().eq(view_b.values())
}

/// Owned copy of `image`.
#[must_use]
pub fn clone_image(image: &RgbaImage) -> RgbaImage {
    image.clone()
}

/// Computes the tight bounding rectangle of pixels considered "non-empty"
/// within `rect`, the way `image_util::crop_images` scans for the common
/// crop bounds across a whole animation but restricted to one sprite. `Rect`
/// and `Convex` trim both resolve to the same bounding-box scan here (a
/// true convex-hull trim has no remaining use once only a rectangular region
/// is ever placed on a sheet); `None` returns `rect` unchanged.
#[must_use]
pub fn compute_trimmed_rect(image: &RgbaImage, rect: Rect, trim: Trim, threshold: i32, gray_levels: bool) -> Rect {
    if trim == Trim::None || rect.w <= 0 || rect.h <= 0 {
        return rect;
    }

    let is_empty = |pixel: Rgba<u8>| -> bool {
        if gray_levels {
            let luma = (u32::from(pixel.0[0]) + u32::from(pixel.0[1]) + u32::from(pixel.0[2])) / 3;
            i32::from(pixel.0[3]) <= threshold && luma == 0
        } else {
            i32::from(pixel.0[3]) <= threshold
        }
    };

    let view = ImageView::new(image, rect);
    let mut min_x = rect.w;
    let mut min_y = rect.h;
    let mut max_x = -1;
    let mut max_y = -1;

    for y in 0..rect.h {
        for x in 0..rect.w {
            if !is_empty(view.value_at(x, y)) {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if max_x < min_x || max_y < min_y {
        return Rect::new(rect.x, rect.y, 0, 0);
    }

    Rect::new(rect.x + min_x, rect.y + min_y, max_x - min_x + 1, max_y - min_y + 1)
}
