//! The four non-bin-packing strategies: `single` (one row, overflow left
//! unplaced), `origin`/`layers` (every sprite kept at its own source
//! position, either on one shared slice or on one slice per distinct source
//! image), and `keep` (sprites stay at their already-seeded rect, i.e. their
//! source position).

use crate::error::PackingError;
use crate::geometry::Rect;
use crate::sprite::{Sheet, Slice, Sprite};

/// Lays sprites out in a single row (shelf), left to right. Sprites past
/// the sheet's usable width are left unplaced (`slice_index` stays `-1`)
/// rather than spilling to a second slice; the top-level finalize pass logs
/// a warning for each one.
pub fn pack_single(sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>) -> Result<(), PackingError> {
    let (max_width, max_height) = super::slice_max_size(sheet);
    let max_width = max_width - sheet.border_padding * 2;
    let max_height = max_height - sheet.border_padding * 2;

    let mut x = 0;
    let mut end = 0;
    for sprite in sprites.iter_mut() {
        let w = sprite.size.x + sheet.shape_padding;
        let h = sprite.size.y;
        if x + w > max_width || h > max_height {
            break;
        }
        sprite.rect = Rect::new(x + sheet.border_padding, sheet.border_padding, sprite.size.x, sprite.size.y);
        sprite.rotated = false;
        x += w;
        end += 1;
    }

    super::push_slice(sheet, &mut sprites[..end], slices);
    Ok(())
}

/// Places every sprite at its own source position. With `layered`, sprites
/// are grouped by `source_index` and each group gets its own slice at its
/// source coordinates (one layer per distinct source image, frames of the
/// same source sharing a slice); otherwise every sprite is placed on a
/// single shared slice.
pub fn pack_origin(sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>, layered: bool) -> Result<(), PackingError> {
    for sprite in sprites.iter_mut() {
        sprite.rect = Rect::new(sprite.source_rect.x + sheet.border_padding, sprite.source_rect.y + sheet.border_padding, sprite.size.x, sprite.size.y);
        sprite.rotated = false;
    }

    if layered {
        sprites.sort_by_key(|s| s.source_index);
        let mut start = 0;
        while start < sprites.len() {
            let source_index = sprites[start].source_index;
            let mut end = start + 1;
            while end < sprites.len() && sprites[end].source_index == source_index {
                end += 1;
            }
            super::push_slice(sheet, &mut sprites[start..end], slices);
            start = end;
        }
    } else {
        super::push_slice(sheet, sprites, slices);
    }
    Ok(())
}

/// Leaves sprites at the rect seeded by the prepass (their source position)
/// and assigns them all to a single slice, reconstructing the original
/// layout rather than repacking it.
pub fn pack_keep(sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>) -> Result<(), PackingError> {
    super::push_slice(sheet, sprites, slices);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{initialize_sprite_size, update_sprite_rect, Sprite};

    fn make(index: usize, w: i32, h: i32) -> Sprite {
        make_from(index, 0, w, h)
    }

    fn make_from(index: usize, source_index: usize, w: i32, h: i32) -> Sprite {
        let mut s = Sprite::new(index, format!("s{index}"), 0, source_index, Rect::new(0, 0, w, h));
        s.trimmed_source_rect = Rect::new(0, 0, w, h);
        initialize_sprite_size(&mut s);
        update_sprite_rect(&mut s);
        s
    }

    #[test]
    fn single_leaves_overflow_sprites_unplaced() {
        let sheet = Sheet { index: 0, width: 15, max_width: 15, height: 50, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10), make(1, 10, 10)];
        let mut slices = Vec::new();
        pack_single(&sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(sprites[0].slice_index, 0);
        assert_eq!(sprites[1].slice_index, -1);
    }

    #[test]
    fn origin_shares_one_slice_when_not_layered() {
        let sheet = Sheet { index: 0, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10), make(1, 20, 5)];
        let mut slices = Vec::new();
        pack_origin(&sheet, &mut sprites, &mut slices, false).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(sprites[0].rect.xy(), sprites[1].rect.xy());
    }

    #[test]
    fn layers_gives_each_distinct_source_its_own_slice() {
        let sheet = Sheet { index: 0, ..Sheet::default() };
        let mut sprites = vec![make_from(0, 0, 10, 10), make_from(1, 1, 20, 5)];
        let mut slices = Vec::new();
        pack_origin(&sheet, &mut sprites, &mut slices, true).unwrap();
        assert_eq!(slices.len(), 2);
        assert_ne!(
            sprites.iter().find(|s| s.index == 0).unwrap().slice_index,
            sprites.iter().find(|s| s.index == 1).unwrap().slice_index
        );
    }

    #[test]
    fn layers_shares_a_slice_for_the_same_source() {
        let sheet = Sheet { index: 0, ..Sheet::default() };
        let mut sprites = vec![make_from(0, 3, 10, 10), make_from(1, 3, 20, 5)];
        let mut slices = Vec::new();
        pack_origin(&sheet, &mut sprites, &mut slices, true).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(
            sprites.iter().find(|s| s.index == 0).unwrap().slice_index,
            sprites.iter().find(|s| s.index == 1).unwrap().slice_index
        );
    }

    #[test]
    fn origin_places_sprites_at_their_source_position() {
        let sheet = Sheet { index: 0, border_padding: 2, ..Sheet::default() };
        let mut sprites = vec![make_from(0, 0, 10, 10)];
        sprites[0].source_rect = Rect::new(7, 4, 10, 10);
        let mut slices = Vec::new();
        pack_origin(&sheet, &mut sprites, &mut slices, false).unwrap();
        assert_eq!(sprites[0].rect.xy(), crate::geometry::Point { x: 9, y: 6 });
    }

    #[test]
    fn keep_leaves_rect_untouched() {
        let sheet = Sheet { index: 0, pack: crate::sprite::Pack::Keep, ..Sheet::default() };
        let mut sprites = vec![make(0, 10, 10)];
        let original_rect = sprites[0].rect;
        let mut slices = Vec::new();
        pack_keep(&sheet, &mut sprites, &mut slices).unwrap();
        assert_eq!(sprites[0].rect, original_rect);
        assert_eq!(sprites[0].slice_index, 0);
    }
}
