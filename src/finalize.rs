//! C8: post-pack finalization and the top-level `pack_sprites` orchestration.
//!
//! Ported from `packing.cpp`'s `recompute_slice_size`, `update_sprite_trimmed_rect`,
//! `update_sprite_margin`, `update_sprite_pivot_point` and `pack_sprites`.

use crate::dedup;
use crate::geometry::{anchor_coords_f, expand, RectF, SizeF};
use crate::pack;
use crate::sprite::{Pack, Sheet, Slice, Sprite};

/// Recomputes a slice's pixel dimensions from the sprites placed on it,
/// then applies the sheet's divisible-width/power-of-two/square rounding.
pub fn recompute_slice_size(sheet: &Sheet, sprites: &[Sprite], slice: &mut Slice) {
    let mut max_x = 0;
    let mut max_y = 0;
    for sprite in sprites {
        let (sx, sy) = if sprite.rotated { (sprite.size.y, sprite.size.x) } else { (sprite.size.x, sprite.size.y) };
        max_x = max_x.max(sprite.rect.x + sx);
        max_y = max_y.max(sprite.rect.y + sy);
    }
    slice.width = sheet.width.max(max_x + sheet.border_padding);
    slice.height = sheet.height.max(max_y + sheet.border_padding);

    if sheet.divisible_width != 0 {
        slice.width = crate::geometry::ceil_to_multiple(slice.width, sheet.divisible_width);
    }
    if sheet.power_of_two {
        slice.width = crate::geometry::ceil_to_pot(slice.width as u32) as i32;
        slice.height = crate::geometry::ceil_to_pot(slice.height as u32) as i32;
    }
    if sheet.square {
        slice.width = slice.width.max(slice.height);
        slice.height = slice.width;
    }
}

/// Derives `trimmed_rect` from the packed `rect`, adding the alignment
/// offset unless the sheet uses `Pack::Keep` (where sprites sit at their
/// original offsets already).
pub fn update_sprite_trimmed_rect(sprite: &mut Sprite, sheet: &Sheet) {
    let mut x = sprite.rect.x;
    let mut y = sprite.rect.y;
    if sheet.pack != Pack::Keep {
        x += sprite.align.x;
        y += sprite.align.y;
    }
    sprite.trimmed_rect = crate::geometry::Rect::new(x, y, sprite.trimmed_source_rect.w, sprite.trimmed_source_rect.h);
}

/// Reconciles the margin recorded before packing with the final placement,
/// including the rotated-rect correction the original found empirically.
/// That correction is preserved bit-for-bit rather than re-derived.
pub fn update_sprite_margin(sprite: &mut Sprite) {
    if sprite.crop {
        sprite.margin.x0 += f64::from(sprite.rect.x0() - sprite.trimmed_rect.x0());
        sprite.margin.y0 += f64::from(sprite.rect.y0() - sprite.trimmed_rect.y0());
        sprite.margin.x1 += f64::from(sprite.trimmed_rect.x1() - sprite.rect.x1());
        sprite.margin.y1 += f64::from(sprite.trimmed_rect.y1() - sprite.rect.y1());
    } else {
        let mut source_bounds = RectF::from(sprite.source_rect);
        let mut bounds = expand(RectF::from(sprite.rect), sprite.margin);
        source_bounds.x -= f64::from(sprite.trimmed_source_rect.x);
        source_bounds.y -= f64::from(sprite.trimmed_source_rect.y);
        bounds.x -= f64::from(sprite.trimmed_rect.x);
        bounds.y -= f64::from(sprite.trimmed_rect.y);

        let grow_w = (source_bounds.w - bounds.w).max(0.0);
        let grow_h = (source_bounds.h - bounds.h).max(0.0);
        let offset_x = (bounds.x - source_bounds.x).min(grow_w).max(0.0);
        let offset_y = (bounds.y - source_bounds.y).min(grow_h).max(0.0);

        sprite.margin.x0 += offset_x;
        sprite.margin.y0 += offset_y;
        sprite.margin.x1 += grow_w - offset_x;
        sprite.margin.y1 += grow_h - offset_y;
    }

    if sprite.margin.x0 + sprite.margin.x1 <= -f64::from(sprite.rect.w) {
        sprite.margin.x0 = -f64::from(sprite.rect.w) / 2.0;
        sprite.margin.x1 = sprite.margin.x0;
    }
    if sprite.margin.y0 + sprite.margin.y1 <= -f64::from(sprite.rect.h) {
        sprite.margin.y0 = -f64::from(sprite.rect.h) / 2.0;
        sprite.margin.y1 = sprite.margin.y0;
    }

    // found out empirically
    if sprite.rotated {
        let m = sprite.size - sprite.trimmed_source_rect.size();
        sprite.trimmed_rect.x += -sprite.align.x + (m.y - sprite.align.y);
        sprite.trimmed_rect.y += -sprite.align.y + sprite.align.x;
    }
}

/// Resolves `pivot` from an anchor spec into concrete output coordinates.
pub fn update_sprite_pivot_point(sprite: &mut Sprite) {
    let size = if sprite.crop_pivot { sprite.trimmed_rect.size() } else { sprite.rect.size() };
    let coords = anchor_coords_f(&sprite.pivot, SizeF { x: f64::from(size.x), y: f64::from(size.y) });
    sprite.pivot.x = coords.x;
    sprite.pivot.y = coords.y;
    if sprite.crop_pivot {
        sprite.pivot.x += f64::from(sprite.align.x);
        sprite.pivot.y += f64::from(sprite.align.y);
    }
}

/// Classifies why a sprite was left unplaced, mirroring
/// `packing.cpp::get_packing_failed_reason`. Our `Sheet` carries no
/// configured slice-count limit (the field was dropped from this crate's
/// data model), so "limited slice count exceeded" is reachable only once a
/// sheet has actually produced more than one slice; a sheet that produced
/// just one slice collapses to the single-slice case, matching the
/// original's `slice_count == 1` special case within `slice_count ==
/// get_max_slice_count(sheet)`.
fn get_packing_failed_reason(sprite: &Sprite, sheet: &Sheet, slice_count: usize) -> &'static str {
    let (max_width, max_height) = pack::slice_max_size(sheet);
    if sprite.size.x + sheet.border_padding > max_width {
        return "max-width exceeded";
    }
    if sprite.size.y + sheet.border_padding > max_height {
        return "max-height exceeded";
    }
    if slice_count <= 1 {
        "does not fit on single slice"
    } else {
        "limited slice count exceeded"
    }
}

/// Packs every sprite onto its sheet's slices and finalizes their placement
/// fields. Sprites are grouped and packed by `(sheet_index, index)` order
/// internally but are restored to their original input order before return.
pub fn pack_sprites(sprites: &mut [Sprite], sheets: &[Sheet], sources: &[image::RgbaImage]) -> Result<Vec<Slice>, crate::error::PackError> {
    crate::sprite::prepass(sprites);

    sprites.sort_by_key(|s| (s.sheet_index, s.index));

    let mut slices = Vec::new();
    let mut start = 0;
    while start < sprites.len() {
        let sheet_index = sprites[start].sheet_index;
        let mut end = start + 1;
        while end < sprites.len() && sprites[end].sheet_index == sheet_index {
            end += 1;
        }
        let sheet = sheets
            .iter()
            .find(|s| s.index as usize == sheet_index)
            .ok_or_else(|| crate::error::ConfigError::EmptySheet(sheet_index.to_string()))?;

        let group = &mut sprites[start..end];
        if sheet.duplicates != crate::sprite::Duplicates::Keep {
            dedup::pack_slice_deduplicate(sheet, group, sources, &mut slices)?;
        } else {
            pack::pack_slice(sheet, group, &mut slices)?;
        }
        start = end;
    }

    // Shared duplicates (Duplicates::Share) get their trimmed_rect copied
    // from their canonical below rather than re-derived here, since a
    // duplicate can carry a different align/crop than its canonical and
    // independently re-deriving it would break the "every duplicate's
    // trimmed_rect equals its canonical's" invariant.
    for sprite in sprites.iter_mut() {
        let Some(sheet) = sheets.iter().find(|s| s.index as usize == sprite.sheet_index) else {
            continue;
        };
        if sprite.duplicate_of_index < 0 || sprite.dropped {
            update_sprite_trimmed_rect(sprite, sheet);
        }
    }

    let duplicate_trimmed_rects: Vec<(usize, crate::geometry::Rect)> = sprites
        .iter()
        .enumerate()
        .filter(|(_, s)| s.duplicate_of_index >= 0 && !s.dropped)
        .filter_map(|(i, s)| sprites.iter().find(|c| c.index as i32 == s.duplicate_of_index).map(|c| (i, c.trimmed_rect)))
        .collect();
    for (i, trimmed_rect) in duplicate_trimmed_rects {
        sprites[i].trimmed_rect = trimmed_rect;
    }

    for sprite in sprites.iter_mut() {
        let Some(sheet) = sheets.iter().find(|s| s.index as usize == sprite.sheet_index) else {
            continue;
        };
        update_sprite_margin(sprite);
        update_sprite_pivot_point(sprite);

        if sprite.slice_index < 0 && !sprite.dropped {
            let slice_count = slices.iter().filter(|s| s.sheet_index == sprite.sheet_index).count();
            let reason = get_packing_failed_reason(sprite, sheet, slice_count);
            log::warn!("packing sprite failed: '{}' did not fit on any slice ({reason})", sprite.id);
        }
    }

    sprites.sort_by_key(|s| s.index);

    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Anchor, AnchorF, Rect};
    use crate::sprite::Sprite;

    fn sheet() -> Sheet {
        Sheet { index: 0, ..Sheet::default() }
    }

    #[test]
    fn recompute_slice_size_accounts_for_rotation() {
        let sheet = sheet();
        let mut sprite = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, 10, 20));
        sprite.size = crate::geometry::Size::new(10, 20);
        sprite.rect = Rect::new(0, 0, 10, 20);
        sprite.rotated = true;
        let mut slice = Slice::default();
        recompute_slice_size(&sheet, std::slice::from_ref(&sprite), &mut slice);
        assert_eq!(slice.width, 20);
        assert_eq!(slice.height, 10);
    }

    #[test]
    fn trimmed_rect_adds_align_unless_keep() {
        let mut sheet = sheet();
        let mut sprite = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, 10, 10));
        sprite.rect = Rect::new(5, 5, 10, 10);
        sprite.align = Anchor { x: 2, y: 3, ..Anchor::default() };
        sprite.trimmed_source_rect = Rect::new(0, 0, 6, 6);

        update_sprite_trimmed_rect(&mut sprite, &sheet);
        assert_eq!(sprite.trimmed_rect, Rect::new(7, 8, 6, 6));

        sheet.pack = Pack::Keep;
        update_sprite_trimmed_rect(&mut sprite, &sheet);
        assert_eq!(sprite.trimmed_rect, Rect::new(5, 5, 6, 6));
    }

    #[test]
    fn failed_reason_flags_an_oversized_sprite_dimension() {
        let sheet = Sheet { index: 0, width: 50, max_width: 50, height: 50, max_height: 50, ..Sheet::default() };
        let mut sprite = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, 100, 10));
        sprite.size = crate::geometry::Size::new(100, 10);
        assert_eq!(get_packing_failed_reason(&sprite, &sheet, 1), "max-width exceeded");

        sprite.size = crate::geometry::Size::new(10, 100);
        assert_eq!(get_packing_failed_reason(&sprite, &sheet, 1), "max-height exceeded");
    }

    #[test]
    fn failed_reason_blames_the_single_slice_when_the_sprite_itself_fits() {
        let sheet = Sheet { index: 0, width: 50, max_width: 50, height: 50, max_height: 50, ..Sheet::default() };
        let mut sprite = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, 10, 10));
        sprite.size = crate::geometry::Size::new(10, 10);
        assert_eq!(get_packing_failed_reason(&sprite, &sheet, 1), "does not fit on single slice");
        assert_eq!(get_packing_failed_reason(&sprite, &sheet, 3), "limited slice count exceeded");
    }

    #[test]
    fn pivot_point_resolves_against_rect() {
        let mut sprite = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, 10, 10));
        sprite.rect = Rect::new(0, 0, 10, 10);
        sprite.pivot = AnchorF { x: 0.0, y: 0.0, anchor_x: crate::geometry::AnchorX::Center, anchor_y: crate::geometry::AnchorY::Middle };
        update_sprite_pivot_point(&mut sprite);
        assert_eq!(sprite.pivot.x, 5.0);
        assert_eq!(sprite.pivot.y, 5.0);
    }
}
