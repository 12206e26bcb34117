//! Shelf-style row/column packing, ported verbatim (including the `d`/`p`
//! axis abstraction) from `original_source/src/pack_lines.cpp`. Like that
//! file, the usable bounds come from `sheet.max_width`/`max_height` alone
//! (0 meaning unbounded) - an explicit `sheet.width`/`height` minimum with no
//! matching `max_width`/`max_height` does not constrain wrapping here, unlike
//! the other strategies, which size bins from `pack::slice_max_size`.

use crate::error::PackingError;
use crate::geometry::{Point, Rect};
use crate::sprite::{Sheet, Slice, Sprite};

fn get_d(p: Point, horizontal: bool) -> i32 {
    if horizontal { p.x } else { p.y }
}
fn set_d(p: &mut Point, horizontal: bool, v: i32) {
    if horizontal { p.x = v } else { p.y = v }
}
fn get_p(p: Point, horizontal: bool) -> i32 {
    if horizontal { p.y } else { p.x }
}
fn set_p(p: &mut Point, horizontal: bool, v: i32) {
    if horizontal { p.y = v } else { p.x = v }
}

/// Packs `sprites` into one or more slices, laying them out along the
/// primary axis (`horizontal`: left-to-right rows; else top-to-bottom
/// columns) and wrapping to a new line, then a new slice, when the sheet's
/// usable bounds are exceeded.
pub fn pack_lines(horizontal: bool, sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>) -> Result<(), PackingError> {
    let max_width = if sheet.max_width > 0 { sheet.max_width } else { i32::MAX };
    let max_height = if sheet.max_height > 0 { sheet.max_height } else { i32::MAX };
    let max_width = max_width - sheet.border_padding * 2;
    let max_height = max_height - sheet.border_padding * 2;
    let max_d = if horizontal { max_width } else { max_height };
    let max_p = if horizontal { max_height } else { max_width };

    let mut pos = Point::default();
    let mut line_size = 0;
    let mut first = 0usize;
    let mut i = 0usize;

    while i < sprites.len() {
        let mut size = sprites[i].size;
        size.x += sheet.shape_padding;
        size.y += sheet.shape_padding;
        let size_d = if horizontal { size.x } else { size.y };
        let size_p = if horizontal { size.y } else { size.x };

        if get_d(pos, horizontal) + size_d > max_d {
            set_d(&mut pos, horizontal, 0);
            set_p(&mut pos, horizontal, get_p(pos, horizontal) + line_size);
            line_size = 0;
        }
        if get_p(pos, horizontal) + size_p > max_p {
            super::push_slice(sheet, &mut sprites[first..i], slices);
            first = i;
            pos = Point::default();
            line_size = 0;
        }
        if pos.x + size.x > max_width || pos.y + size.y > max_height {
            break;
        }

        sprites[i].rect = Rect::new(pos.x + sheet.border_padding, pos.y + sheet.border_padding, sprites[i].size.x, sprites[i].size.y);
        sprites[i].rotated = false;

        set_d(&mut pos, horizontal, get_d(pos, horizontal) + size_d);
        line_size = line_size.max(size_p);
        i += 1;
    }

    if i != sprites.len() {
        let failed = &sprites[i];
        return Err(PackingError::SpriteDoesNotFit(failed.id.clone(), max_width, max_height));
    }

    super::push_slice(sheet, &mut sprites[first..i], slices);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{initialize_sprite_size, update_sprite_rect};

    fn make(index: usize, w: i32, h: i32) -> Sprite {
        let mut s = Sprite::new(index, format!("s{index}"), 0, 0, Rect::new(0, 0, w, h));
        s.trimmed_source_rect = Rect::new(0, 0, w, h);
        initialize_sprite_size(&mut s);
        update_sprite_rect(&mut s);
        s
    }

    #[test]
    fn rows_place_sprites_left_to_right() {
        let sheet = Sheet { index: 0, width: 100, height: 100, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10), make(1, 10, 10)];
        let mut slices = Vec::new();
        pack_lines(true, &sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(sprites[0].rect.xy(), crate::geometry::Point { x: 0, y: 0 });
        assert_eq!(sprites[1].rect.xy(), crate::geometry::Point { x: 10, y: 0 });
    }

    #[test]
    fn columns_place_sprites_top_to_bottom() {
        let sheet = Sheet { index: 0, width: 100, height: 100, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10), make(1, 10, 10)];
        let mut slices = Vec::new();
        pack_lines(false, &sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(sprites[1].rect.xy(), crate::geometry::Point { x: 0, y: 10 });
    }

    #[test]
    fn overflow_wraps_to_new_slice() {
        let sheet = Sheet { index: 0, width: 15, max_width: 15, height: 1000, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10), make(1, 10, 10)];
        let mut slices = Vec::new();
        pack_lines(true, &sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(sprites[0].slice_index, 0);
        assert_eq!(sprites[1].slice_index, 1);
    }

    #[test]
    fn explicit_width_without_max_width_does_not_wrap() {
        // Only an explicit sheet.max_width should cap a line's extent; a
        // sheet.width minimum with no max_width leaves wrapping unbounded,
        // matching pack_lines.cpp.
        let sheet = Sheet { index: 0, width: 15, height: 1000, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10), make(1, 10, 10)];
        let mut slices = Vec::new();
        pack_lines(true, &sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(sprites[1].rect.xy(), crate::geometry::Point { x: 10, y: 0 });
    }

    #[test]
    fn sprite_too_large_for_any_slice_errors() {
        let sheet = Sheet { index: 0, width: 5, max_width: 5, height: 5, max_height: 5, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10)];
        let mut slices = Vec::new();
        let err = pack_lines(true, &sheet, &mut sprites, &mut slices).unwrap_err();
        assert!(matches!(err, PackingError::SpriteDoesNotFit(_, _, _)));
    }
}
