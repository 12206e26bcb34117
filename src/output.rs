//! C10: animation palette generation and GIF assembly, ported from
//! `original_source/src/image_io.cpp`'s `generate_palette(Animation)` and
//! `write_gif`. Palette generation, dithering and quantization are our own
//! code (see [`crate::color`]); the GIF container itself is written with the
//! `gif` crate directly rather than through `image`'s `GifEncoder`, since
//! `image` always re-quantizes a frame's RGBA pixels through its own NeuQuant
//! palette on encode - there is no path through `image`'s public API to hand
//! it pre-built indexed pixels against our own palette. Writing through `gif`
//! instead gives us that path: one global palette per animation, a
//! transparent index resolved from the colorkey, and frames that carry
//! already-quantized indices straight through.

use crate::color::{self, Palette};
use crate::error::PackError;
use crate::scheduler;
use gif::{Encoder, Frame as GifFrame, Repeat};
use image::{GrayImage, Rgba, RgbaImage};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
    pub max_colors: u16,
    pub color_key: Option<Rgba<u8>>,
    pub loop_count: u16,
}

/// Builds a shared palette across every frame of an animation by stacking
/// their pixels into one buffer before running median-cut, so it covers
/// colors that only appear in later frames.
#[must_use]
pub fn generate_palette(frames: &[AnimationFrame], max_colors: usize) -> Palette {
    let mut pixels = Vec::new();
    for frame in frames {
        pixels.extend(frame.image.pixels().copied());
    }
    color::median_cut(&pixels, max_colors)
}

/// Quantizes one frame against `palette` into palette indices, dithering
/// only when the palette uses its full color budget (otherwise every color
/// is already representable and dithering would just add noise).
#[must_use]
pub fn quantize_frame_indexed(image: &RgbaImage, palette: &Palette, max_colors: usize) -> GrayImage {
    if palette.len() == max_colors {
        let mut dithered = image.clone();
        color::floyd_steinberg_dither(&mut dithered, palette);
        color::quantize_image(&dithered, palette)
    } else {
        color::quantize_image(image, palette)
    }
}

/// Packs `palette` into a GIF global color table: `1 << bits` RGB triplets,
/// `bits` the smallest value with `1 << bits >= palette.len()`, unused
/// trailing entries left black. Mirrors `image_io.cpp::write_gif`'s bit-depth
/// derivation exactly.
fn gif_global_palette(palette: &Palette) -> Vec<u8> {
    let mut bits = 0u32;
    let mut c = (palette.len().max(1) - 1) as u32;
    while c != 0 {
        bits += 1;
        c >>= 1;
    }
    let size = 1usize << bits;

    let mut bytes = Vec::with_capacity(size * 3);
    for i in 0..size {
        let color = palette.get(i).copied().unwrap_or(Rgba([0, 0, 0, 255]));
        bytes.extend_from_slice(&color.0[..3]);
    }
    bytes
}

/// Writes `animation` as an animated GIF to `path`.
pub fn write_gif_animation(path: &Path, animation: &Animation) -> Result<(), PackError> {
    if animation.frames.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut width = 0u32;
    let mut height = 0u32;
    for frame in &animation.frames {
        let (w, h) = frame.image.dimensions();
        width = width.max(w);
        height = height.max(h);
    }
    if width > 0xFFFF || height > 0xFFFF {
        log::warn!("gif '{}' exceeds the 65535x65535 GIF size limit, skipping", path.display());
        return Ok(());
    }

    let max_colors = usize::from(if animation.max_colors == 0 { 256 } else { animation.max_colors.min(256) });
    let palette = generate_palette(&animation.frames, max_colors);
    let transparent_index = animation.color_key.map(|key| color::nearest_palette_index(&palette, key) as u8);

    // Each entry doubles as its own scratch space: `source` feeds the
    // quantizer, `indices` receives the result, so every frame can be
    // processed concurrently via the shared scheduler.
    struct FrameWork {
        source: RgbaImage,
        indices: GrayImage,
    }
    let mut work: Vec<FrameWork> = animation
        .frames
        .iter()
        .map(|f| FrameWork { source: f.image.clone(), indices: GrayImage::new(f.image.width(), f.image.height()) })
        .collect();
    scheduler::for_each_parallel_infallible(&mut work, |w| {
        w.indices = quantize_frame_indexed(&w.source, &palette, max_colors);
    });
    let indexed: Vec<GrayImage> = work.into_iter().map(|w| w.indices).collect();

    let global_palette = gif_global_palette(&palette);
    let file = std::fs::File::create(path)?;
    let mut encoder = Encoder::new(file, width as u16, height as u16, &global_palette)?;
    encoder.set_repeat(if animation.loop_count == 0 { Repeat::Infinite } else { Repeat::Finite(animation.loop_count) })?;

    for (anim_frame, indices) in animation.frames.iter().zip(indexed) {
        let (w, h) = indices.dimensions();
        let mut frame = GifFrame::from_indexed_pixels(w as u16, h as u16, indices.into_raw(), transparent_index);
        frame.delay = ((anim_frame.duration_secs * 100.0).round() as u16).max(1);
        encoder.write_frame(&frame)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_covers_colors_across_frames() {
        let mut a = RgbaImage::new(2, 2);
        a.pixels_mut().for_each(|p| *p = Rgba([255, 0, 0, 255]));
        let mut b = RgbaImage::new(2, 2);
        b.pixels_mut().for_each(|p| *p = Rgba([0, 255, 0, 255]));
        let frames = vec![AnimationFrame { image: a, duration_secs: 0.1 }, AnimationFrame { image: b, duration_secs: 0.1 }];
        let palette = generate_palette(&frames, 8);
        assert!(palette.contains(&Rgba([255, 0, 0, 255])));
        assert!(palette.contains(&Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn full_budget_palette_dithers_into_palette_indices() {
        let palette: Palette = (0..4).map(|i| Rgba([i * 60, 0, 0, 255])).collect();
        let image = RgbaImage::from_pixel(2, 2, Rgba([10, 0, 0, 255]));
        let out = quantize_frame_indexed(&image, &palette, 4);
        for idx in out.pixels() {
            assert!((idx.0[0] as usize) < palette.len());
        }
    }

    #[test]
    fn global_palette_is_padded_to_a_power_of_two() {
        let palette: Palette = (0..5).map(|i| Rgba([i * 10, 0, 0, 255])).collect();
        let bytes = gif_global_palette(&palette);
        assert_eq!(bytes.len(), 8 * 3);
        assert_eq!(&bytes[0..3], &[0u8, 0, 0]);
        assert_eq!(&bytes[21..24], &[0u8, 0, 0]);
    }

    #[test]
    fn single_color_palette_packs_to_one_entry() {
        let palette: Palette = vec![Rgba([1, 2, 3, 255])];
        let bytes = gif_global_palette(&palette);
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
