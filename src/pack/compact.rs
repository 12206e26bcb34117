//! Skyline (per-column height profile) packing that grows the canvas to fit,
//! rather than filling a fixed bin. No original source for `compact` was
//! retrieved, so this follows the well-known skyline/bottom-left placement
//! scheme (see Jukka Jylänki's "A Thousand Ways to Pack the Bin" §3.2) rather
//! than a ported original; sprites are placed in their input order, with
//! `sheet.allow_rotate` considered per sprite like every other strategy.

use crate::error::PackingError;
use crate::geometry::Rect;
use crate::sprite::{Sheet, Slice, Sprite};

#[derive(Debug, Clone, Copy)]
struct Segment {
    x: i32,
    width: i32,
    height: i32,
}

/// A contiguous height profile across `[0, width)`, the classic skyline
/// packing structure: placing a rect raises the skyline over the span it
/// covers.
struct Skyline {
    segments: Vec<Segment>,
}

impl Skyline {
    fn new(width: i32) -> Self {
        Self { segments: vec![Segment { x: 0, width, height: 0 }] }
    }

    /// Height a `w`-wide rect would rest at if placed starting at the
    /// segment with index `start`, or `None` if it runs past `total_width`.
    fn span_height(&self, start: usize, w: i32, total_width: i32) -> Option<i32> {
        let x = self.segments[start].x;
        if x + w > total_width {
            return None;
        }
        let mut y = 0;
        let mut covered = 0;
        for seg in &self.segments[start..] {
            y = y.max(seg.height);
            covered += seg.width;
            if covered >= w {
                return Some(y);
            }
        }
        None
    }

    /// Lowest-y placement for a `w` x `h` rect (bottom-left heuristic: ties
    /// keep the first, i.e. leftmost, candidate).
    fn best_fit(&self, w: i32, h: i32, total_width: i32, total_height: i32) -> Option<(i32, i32)> {
        let mut best: Option<(i32, i32)> = None;
        for i in 0..self.segments.len() {
            let Some(y) = self.span_height(i, w, total_width) else { continue };
            if y + h > total_height {
                continue;
            }
            let x = self.segments[i].x;
            if best.is_none_or(|(_, best_y)| y < best_y) {
                best = Some((x, y));
            }
        }
        best
    }

    fn place(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let new_height = y + h;
        let mut next = Vec::with_capacity(self.segments.len() + 2);
        for seg in &self.segments {
            let seg_end = seg.x + seg.width;
            if seg_end <= x || seg.x >= x + w {
                next.push(*seg);
                continue;
            }
            if seg.x < x {
                next.push(Segment { x: seg.x, width: x - seg.x, height: seg.height });
            }
            if seg_end > x + w {
                next.push(Segment { x: x + w, width: seg_end - (x + w), height: seg.height });
            }
        }
        next.push(Segment { x, width: w, height: new_height });
        next.sort_by_key(|s| s.x);

        let mut merged: Vec<Segment> = Vec::with_capacity(next.len());
        for seg in next {
            if let Some(last) = merged.last_mut() {
                if last.height == seg.height && last.x + last.width == seg.x {
                    last.width += seg.width;
                    continue;
                }
            }
            merged.push(seg);
        }
        self.segments = merged;
    }
}

/// Places every sprite on a fresh skyline sized `width` x `height`, in input
/// order. Returns the index of the first sprite that doesn't fit so the
/// caller can tell a real misfit from "needs a bigger canvas".
fn skyline_place_all(sheet: &Sheet, sprites: &[Sprite], width: i32, height: i32) -> Result<Vec<(i32, i32, bool)>, usize> {
    let mut skyline = Skyline::new(width);
    let mut placements = Vec::with_capacity(sprites.len());

    for (i, sprite) in sprites.iter().enumerate() {
        let w0 = sprite.size.x + sheet.shape_padding;
        let h0 = sprite.size.y + sheet.shape_padding;

        let mut best = skyline.best_fit(w0, h0, width, height).map(|(x, y)| (x, y, w0, h0, false));

        if sheet.allow_rotate && w0 != h0 {
            if let Some((x, y)) = skyline.best_fit(h0, w0, width, height) {
                let better = match best {
                    Some((_, best_y, ..)) => y < best_y,
                    None => true,
                };
                if better {
                    best = Some((x, y, h0, w0, true));
                }
            }
        }

        let (x, y, w, h, rotated) = best.ok_or(i)?;
        skyline.place(x, y, w, h);
        placements.push((x, y, rotated));
    }

    Ok(placements)
}

/// Packs sprites in input order onto a skyline canvas that grows (doubling
/// whichever axis keeps the aspect ratio closer to square) until every
/// sprite fits or the sheet's configured maximum is reached.
pub fn pack_compact(sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>) -> Result<(), PackingError> {
    let (max_width, max_height) = super::slice_max_size(sheet);
    let max_width = (max_width - sheet.border_padding * 2).max(1);
    let max_height = (max_height - sheet.border_padding * 2).max(1);

    let mut width = 1;
    let mut height = 1;
    for sprite in sprites.iter() {
        width = width.max((sprite.size.x + sheet.shape_padding).min(max_width));
        height = height.max((sprite.size.y + sheet.shape_padding).min(max_height));
    }

    let placements = loop {
        match skyline_place_all(sheet, sprites, width, height) {
            Ok(placements) => break placements,
            Err(i) => {
                if width * 2 <= max_width && width <= height {
                    width = (width * 2).min(max_width);
                } else if height * 2 <= max_height {
                    height = (height * 2).min(max_height);
                } else if width < max_width {
                    width = max_width;
                } else if height < max_height {
                    height = max_height;
                } else {
                    return Err(PackingError::SpriteDoesNotFit(sprites[i].id.clone(), max_width, max_height));
                }
            }
        }
    };

    for (sprite, (x, y, rotated)) in sprites.iter_mut().zip(placements) {
        sprite.rotated = rotated;
        let (rw, rh) = if rotated { (sprite.size.y, sprite.size.x) } else { (sprite.size.x, sprite.size.y) };
        sprite.rect = Rect::new(x + sheet.border_padding, y + sheet.border_padding, rw, rh);
    }

    super::push_slice(sheet, sprites, slices);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{initialize_sprite_size, update_sprite_rect, Sprite};

    fn make(index: usize, w: i32, h: i32) -> Sprite {
        let mut s = Sprite::new(index, format!("s{index}"), 0, 0, Rect::new(0, 0, w, h));
        s.trimmed_source_rect = Rect::new(0, 0, w, h);
        initialize_sprite_size(&mut s);
        update_sprite_rect(&mut s);
        s
    }

    #[test]
    fn packs_without_overlap() {
        let sheet = Sheet { index: 0, ..Sheet::default() };
        let mut sprites = vec![make(0, 40, 20), make(1, 10, 10), make(2, 5, 30)];
        let mut slices = Vec::new();
        pack_compact(&sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(slices.len(), 1);
        for a in 0..sprites.len() {
            for b in (a + 1)..sprites.len() {
                assert!(!sprites[a].rect.overlaps(&sprites[b].rect));
            }
        }
    }

    #[test]
    fn grows_canvas_when_it_does_not_fit_initially() {
        let sheet = Sheet { index: 0, max_width: 1000, max_height: 1000, ..Sheet::default() };
        let mut sprites: Vec<Sprite> = (0..20).map(|i| make(i, 30, 30)).collect();
        let mut slices = Vec::new();
        pack_compact(&sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(slices.len(), 1);
        for a in 0..sprites.len() {
            for b in (a + 1)..sprites.len() {
                assert!(!sprites[a].rect.overlaps(&sprites[b].rect));
            }
        }
    }

    #[test]
    fn preserves_input_order_rather_than_sorting_by_size() {
        let sheet = Sheet { index: 0, max_width: 1000, max_height: 1000, ..Sheet::default() };
        let mut sprites = vec![make(0, 5, 5), make(1, 40, 40), make(2, 8, 8)];
        let mut slices = Vec::new();
        pack_compact(&sheet, &mut sprites, &mut slices).unwrap();
        // the smallest sprite was presented first, so the skyline places it
        // at the origin instead of a largest-first packer placing it later.
        assert_eq!(sprites[0].rect.xy(), crate::geometry::Point { x: 0, y: 0 });
    }

    #[test]
    fn rotates_a_sprite_that_only_fits_sideways() {
        let sheet = Sheet { index: 0, width: 12, max_width: 12, height: 100, max_height: 100, allow_rotate: true, ..Sheet::default() };
        let mut sprites = vec![make(0, 30, 10)];
        let mut slices = Vec::new();
        pack_compact(&sheet, &mut sprites, &mut slices).unwrap();
        assert!(sprites[0].rotated);
        assert_eq!(sprites[0].rect.size(), crate::geometry::Size::new(10, 30));
    }
}
