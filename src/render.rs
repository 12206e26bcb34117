//! Compositing packed sprites onto their slice canvases. Not one of the
//! packing engine's own components — the geometry pipeline only computes
//! placement, ground truth for the actual blit is the teacher's
//! `imageops::replace` usage in `commands/spritesheet.rs::generate_spritesheet`.

use crate::sprite::{Extrude, Slice, Sprite, WrapMode};
use crate::transform::transform_sprite_image;
use image::{imageops, Rgba, RgbaImage};

fn wrapped_coord(i: i32, len: i32, mode: WrapMode) -> u32 {
    if len <= 0 {
        return 0;
    }
    match mode {
        WrapMode::Clamp => i.clamp(0, len - 1) as u32,
        WrapMode::Repeat => i.rem_euclid(len) as u32,
        WrapMode::Mirror => {
            let period = 2 * len;
            let m = i.rem_euclid(period);
            if m < len { m as u32 } else { (period - 1 - m) as u32 }
        }
    }
}

/// Replicates the sprite's edge pixels outward by `extrude.count` pixels,
/// sampled according to `extrude.mode`, directly on the slice canvas.
fn apply_extrude(canvas: &mut RgbaImage, content: &RgbaImage, dest_x: i32, dest_y: i32, extrude: Extrude) {
    let count = extrude.count;
    if count <= 0 {
        return;
    }
    let (w, h) = content.dimensions();
    let (w, h) = (w as i32, h as i32);

    for oy in -count..(h + count) {
        for ox in -count..(w + count) {
            if (0..w).contains(&ox) && (0..h).contains(&oy) {
                continue;
            }
            let sx = wrapped_coord(ox, w, extrude.mode);
            let sy = wrapped_coord(oy, h, extrude.mode);
            let pixel = *content.get_pixel(sx, sy);
            let (cx, cy) = (dest_x + ox, dest_y + oy);
            if cx >= 0 && cy >= 0 && (cx as u32) < canvas.width() && (cy as u32) < canvas.height() {
                canvas.put_pixel(cx as u32, cy as u32, pixel);
            }
        }
    }
}

/// Renders one slice's sprites onto a fresh canvas sized to `slice`.
///
/// `source_for` resolves a sprite's `source_index` to its decoded pixels;
/// sprites are drawn in ascending `index` order so overlapping extrude
/// borders resolve deterministically.
pub fn render_slice(slice: &Slice, sprites: &[Sprite], source_for: impl Fn(usize) -> Option<RgbaImage>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(slice.width.max(0) as u32, slice.height.max(0) as u32, Rgba([0, 0, 0, 0]));

    let mut members: Vec<&Sprite> = sprites.iter().filter(|s| slice.sprite_ids.contains(&s.index)).collect();
    members.sort_by_key(|s| s.index);

    for sprite in members {
        let Some(source) = source_for(sprite.source_index) else { continue };
        let cropped = imageops::crop_imm(
            &source,
            sprite.trimmed_source_rect.x.max(0) as u32,
            sprite.trimmed_source_rect.y.max(0) as u32,
            sprite.trimmed_source_rect.w.max(0) as u32,
            sprite.trimmed_source_rect.h.max(0) as u32,
        )
        .to_image();

        let content = if sprite.transforms.is_empty() { cropped } else { transform_sprite_image(&cropped, &sprite.transforms) };

        let content = if sprite.rotated { imageops::rotate90(&content) } else { content };

        imageops::replace(&mut canvas, &content, i64::from(sprite.trimmed_rect.x), i64::from(sprite.trimmed_rect.y));
        apply_extrude(&mut canvas, &content, sprite.trimmed_rect.x, sprite.trimmed_rect.y, sprite.extrude);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn wrapped_coord_clamp_stays_in_range() {
        assert_eq!(wrapped_coord(-3, 5, WrapMode::Clamp), 0);
        assert_eq!(wrapped_coord(7, 5, WrapMode::Clamp), 4);
    }

    #[test]
    fn wrapped_coord_mirror_reflects() {
        assert_eq!(wrapped_coord(-1, 5, WrapMode::Mirror), 0);
        assert_eq!(wrapped_coord(5, 5, WrapMode::Mirror), 4);
    }

    #[test]
    fn render_slice_places_sprite_at_trimmed_rect() {
        let mut sprite = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, 2, 2));
        sprite.trimmed_source_rect = Rect::new(0, 0, 2, 2);
        sprite.trimmed_rect = Rect::new(3, 1, 2, 2);

        let slice = Slice { index: 0, sheet_index: 0, width: 8, height: 8, sprite_ids: vec![0] };
        let source = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));

        let canvas = render_slice(&slice, std::slice::from_ref(&sprite), |_| Some(source.clone()));
        assert_eq!(*canvas.get_pixel(3, 1), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }
}
