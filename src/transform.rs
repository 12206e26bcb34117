//! Scale/Resize/Rotate transform pipeline, applied once per sprite in
//! linear-light space, per `original_source/src/transforming.cpp`.
//!
//! Every step in a sprite's transform list is applied back-to-back against a
//! single linearized copy of the source image; the sRGB round-trip happens
//! once around the whole sequence rather than per step, so intermediate
//! scale/rotate blending never re-quantizes gamma-encoded values.

use crate::color;
use crate::geometry::{Size, SizeF};
use image::{imageops, ImageBuffer, Rgba, RgbaImage};

pub type LinearImage = ImageBuffer<Rgba<f32>, Vec<f32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ScaleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ScaleFilter> for imageops::FilterType {
    fn from(f: ScaleFilter) -> Self {
        match f {
            ScaleFilter::Nearest => Self::Nearest,
            ScaleFilter::Triangle => Self::Triangle,
            ScaleFilter::CatmullRom => Self::CatmullRom,
            ScaleFilter::Gaussian => Self::Gaussian,
            ScaleFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RotateMethod {
    Nearest,
    #[default]
    Bilinear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    Scale { scale: SizeF, filter: ScaleFilter },
    Resize { size: Size, filter: ScaleFilter },
    Rotate { angle_degrees: f64, method: RotateMethod },
}

/// Converts every pixel from sRGB to linear light, widening to `f32`.
#[must_use]
pub fn convert_to_linear(image: &RgbaImage) -> LinearImage {
    LinearImage::from_fn(image.width(), image.height(), |x, y| {
        Rgba(color::srgb_to_linear(*image.get_pixel(x, y)))
    })
}

/// Converts a linear-light buffer back to an 8-bit sRGB image.
#[must_use]
pub fn convert_to_srgb(image: &LinearImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        color::linear_to_srgb(image.get_pixel(x, y).0)
    })
}

fn resize_linear(image: &LinearImage, scale: SizeF, filter: ScaleFilter) -> LinearImage {
    let new_w = ((f64::from(image.width()) * scale.x).round().max(1.0)) as u32;
    let new_h = ((f64::from(image.height()) * scale.y).round().max(1.0)) as u32;
    imageops::resize(image, new_w, new_h, filter.into())
}

fn sample_bilinear(image: &LinearImage, x: f64, y: f64, background: Rgba<f32>) -> Rgba<f32> {
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    if x < -1.0 || y < -1.0 || x > w || y > h {
        return background;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let at = |ix: f64, iy: f64| -> Rgba<f32> {
        if ix < 0.0 || iy < 0.0 || ix >= w || iy >= h {
            background
        } else {
            *image.get_pixel(ix as u32, iy as u32)
        }
    };

    let p00 = at(x0, y0);
    let p10 = at(x0 + 1.0, y0);
    let p01 = at(x0, y0 + 1.0);
    let p11 = at(x0 + 1.0, y0 + 1.0);

    let mut out = [0.0f32; 4];
    for i in 0..4 {
        let top = p00.0[i] * (1.0 - fx) as f32 + p10.0[i] * fx as f32;
        let bot = p01.0[i] * (1.0 - fx) as f32 + p11.0[i] * fx as f32;
        out[i] = top * (1.0 - fy) as f32 + bot * fy as f32;
    }
    Rgba(out)
}

fn sample_nearest(image: &LinearImage, x: f64, y: f64, background: Rgba<f32>) -> Rgba<f32> {
    let ix = x.round();
    let iy = y.round();
    if ix < 0.0 || iy < 0.0 || ix >= f64::from(image.width()) || iy >= f64::from(image.height()) {
        background
    } else {
        *image.get_pixel(ix as u32, iy as u32)
    }
}

/// Rotates `image` by `angle_degrees` about its center, expanding the canvas
/// to fit the full rotated bounding box and filling uncovered area with
/// `background`.
#[must_use]
pub fn rotate_image(image: &LinearImage, angle_degrees: f64, background: Rgba<f32>, method: RotateMethod) -> LinearImage {
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    let radians = angle_degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
    let rotated: Vec<(f64, f64)> = corners
        .iter()
        .map(|&(cx, cy)| (cx * cos - cy * sin, cx * sin + cy * cos))
        .collect();
    let min_x = rotated.iter().fold(f64::MAX, |m, &(x, _)| m.min(x));
    let max_x = rotated.iter().fold(f64::MIN, |m, &(x, _)| m.max(x));
    let min_y = rotated.iter().fold(f64::MAX, |m, &(_, y)| m.min(y));
    let max_y = rotated.iter().fold(f64::MIN, |m, &(_, y)| m.max(y));

    let out_w = (max_x - min_x).round().max(1.0) as u32;
    let out_h = (max_y - min_y).round().max(1.0) as u32;

    let (cx, cy) = (w / 2.0, h / 2.0);

    let mut out = LinearImage::new(out_w, out_h);
    for oy in 0..out_h {
        for ox in 0..out_w {
            // rotate the output pixel's offset from the output center back
            // into source space by the inverse rotation.
            let rel_x = f64::from(ox) - f64::from(out_w) / 2.0;
            let rel_y = f64::from(oy) - f64::from(out_h) / 2.0;
            let src_x = rel_x * cos + rel_y * sin + cx;
            let src_y = -rel_x * sin + rel_y * cos + cy;

            let pixel = match method {
                RotateMethod::Nearest => sample_nearest(image, src_x, src_y, background),
                RotateMethod::Bilinear => sample_bilinear(image, src_x, src_y, background),
            };
            out.put_pixel(ox, oy, pixel);
        }
    }
    out
}

fn apply_step(image: LinearImage, step: &TransformStep, source: &RgbaImage) -> LinearImage {
    match *step {
        TransformStep::Scale { scale, filter } => resize_linear(&image, scale, filter),
        TransformStep::Resize { size, filter } => {
            let mut scale = SizeF { x: 1.0, y: 1.0 };
            if size.x != 0 {
                scale.x = f64::from(size.x) / f64::from(image.width());
            }
            if size.y != 0 {
                scale.y = f64::from(size.y) / f64::from(image.height());
            }
            if size.x == 0 {
                scale.x = scale.y;
            }
            if size.y == 0 {
                scale.y = scale.x;
            }
            resize_linear(&image, scale, filter)
        }
        TransformStep::Rotate { angle_degrees, method } => {
            let background = color::srgb_to_linear(color::guess_colorkey(source));
            rotate_image(&image, angle_degrees, Rgba(background), method)
        }
    }
}

/// Applies every step in `steps`, in order, converting to linear light once
/// at the start and back to sRGB once at the end.
#[must_use]
pub fn transform_sprite_image(source: &RgbaImage, steps: &[TransformStep]) -> RgbaImage {
    if steps.is_empty() {
        return source.clone();
    }
    let mut image = convert_to_linear(source);
    for step in steps {
        image = apply_step(image, step, source);
    }
    convert_to_srgb(&image)
}

/// Cumulative (x, y) scale factor implied by a step sequence; a Resize or
/// Rotate step resets tracking to `(1, 1)` since it does not imply a fixed
/// multiplicative scale.
#[must_use]
pub fn get_transform_scale(steps: &[TransformStep]) -> SizeF {
    let mut scale = SizeF { x: 1.0, y: 1.0 };
    for step in steps {
        match *step {
            TransformStep::Scale { scale: s, .. } => {
                scale.x *= s.x;
                scale.y *= s.y;
            }
            TransformStep::Resize { .. } | TransformStep::Rotate { .. } => {
                scale = SizeF { x: 1.0, y: 1.0 };
            }
        }
    }
    scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_steps_returns_identical_image() {
        let mut img = RgbaImage::new(3, 3);
        img.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let out = transform_sprite_image(&img, &[]);
        assert_eq!(img, out);
    }

    #[test]
    fn scale_step_doubles_dimensions() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 255]));
        let steps = [TransformStep::Scale {
            scale: SizeF { x: 2.0, y: 2.0 },
            filter: ScaleFilter::Nearest,
        }];
        let out = transform_sprite_image(&img, &steps);
        assert_eq!((out.width(), out.height()), (8, 8));
    }

    #[test]
    fn cumulative_scale_tracks_multiplicative_steps() {
        let steps = [
            TransformStep::Scale { scale: SizeF { x: 2.0, y: 2.0 }, filter: ScaleFilter::Nearest },
            TransformStep::Scale { scale: SizeF { x: 0.5, y: 1.0 }, filter: ScaleFilter::Nearest },
        ];
        let scale = get_transform_scale(&steps);
        assert!((scale.x - 1.0).abs() < 1e-9);
        assert!((scale.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn resize_step_resets_cumulative_scale() {
        let steps = [
            TransformStep::Scale { scale: SizeF { x: 2.0, y: 2.0 }, filter: ScaleFilter::Nearest },
            TransformStep::Resize { size: Size::new(10, 10), filter: ScaleFilter::Nearest },
        ];
        let scale = get_transform_scale(&steps);
        assert_eq!(scale, SizeF { x: 1.0, y: 1.0 });
    }

    #[test]
    fn rotate_by_360_preserves_dimensions() {
        let img = LinearImage::from_pixel(5, 5, Rgba([0.5, 0.5, 0.5, 1.0]));
        let out = rotate_image(&img, 360.0, Rgba([0.0, 0.0, 0.0, 0.0]), RotateMethod::Bilinear);
        assert_eq!((out.width(), out.height()), (5, 5));
    }
}
