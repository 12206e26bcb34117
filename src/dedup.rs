//! C7: duplicate detection within one sheet's sprite group, ported from
//! `packing.cpp::pack_slice_deduplicate`.

use crate::error::PackError;
use crate::imagebuf;
use crate::pack;
use crate::sprite::{Duplicates, Sheet, Slice, Sprite};
use image::RgbaImage;

/// Moves sprites whose source pixels are byte-identical to an earlier
/// sprite to the back of `sprites`, packs only the unique front portion,
/// then mirrors or drops the duplicates depending on `sheet.duplicates`.
///
/// The scan intentionally does not re-examine a just-relocated tail element
/// against earlier entries before moving on to the next `i` — this mirrors
/// the original's control flow exactly rather than closing that gap.
pub fn pack_slice_deduplicate(sheet: &Sheet, sprites: &mut [Sprite], sources: &[RgbaImage], slices: &mut Vec<Slice>) -> Result<(), PackError> {
    debug_assert!(!sprites.is_empty());

    let n = sprites.len();
    let mut unique_len = n;

    if n > 1 {
        let mut i = n - 1;
        loop {
            for j in 0..i {
                let identical = imagebuf::is_identical(
                    &sources[sprites[i].source_index],
                    sprites[i].trimmed_source_rect,
                    &sources[sprites[j].source_index],
                    sprites[j].trimmed_source_rect,
                );
                if identical {
                    sprites[i].duplicate_of_index = sprites[j].index as i32;
                    sprites.swap(i, unique_len - 1);
                    unique_len -= 1;
                    break;
                }
            }
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }

    sprites[..unique_len].sort_by_key(|s| s.index);

    if unique_len > 0 {
        pack::pack_slice(sheet, &mut sprites[..unique_len], slices)?;
    }

    if sheet.duplicates == Duplicates::Drop {
        for sprite in sprites[unique_len..].iter_mut() {
            sprite.dropped = true;
        }
    } else {
        let unique_index = sprites[..unique_len].len();
        let (unique, duplicates) = sprites.split_at_mut(unique_index);
        for duplicate in duplicates {
            if let Some(source) = unique.iter().find(|s| s.index as i32 == duplicate.duplicate_of_index) {
                duplicate.slice_index = source.slice_index;
                duplicate.rect = source.rect;
                duplicate.rotated = source.rotated;
                // `trimmed_rect` isn't finalized yet at this point (that
                // happens in finalize::pack_sprites after every sheet's
                // groups are packed); finalize copies it from this same
                // canonical verbatim rather than re-deriving it, so the
                // invariant holds even when align/crop differ between the
                // two sprites.
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn sprite(index: usize, rect: Rect) -> Sprite {
        let mut s = Sprite::new(index, format!("s{index}"), 0, 0, rect);
        s.trimmed_source_rect = rect;
        s
    }

    #[test]
    fn identical_sprites_share_placement() {
        let mut image = RgbaImage::new(4, 4);
        for p in image.pixels_mut() {
            *p = image::Rgba([1, 2, 3, 255]);
        }
        let sources = vec![image];

        let sheet = Sheet { index: 0, duplicates: Duplicates::Share, pack: crate::sprite::Pack::Rows, ..Sheet::default() };
        let mut sprites = vec![sprite(0, Rect::new(0, 0, 4, 4)), sprite(1, Rect::new(0, 0, 4, 4))];
        for s in &mut sprites {
            crate::sprite::initialize_sprite_size(s);
            crate::sprite::update_sprite_rect(s);
        }
        let mut slices = Vec::new();
        pack_slice_deduplicate(&sheet, &mut sprites, &sources, &mut slices).unwrap();

        sprites.sort_by_key(|s| s.index);
        assert_eq!(slices.len(), 1);
        assert_eq!(sprites[1].slice_index, sprites[0].slice_index);
        assert_eq!(sprites[1].rect, sprites[0].rect);
    }

    #[test]
    fn drop_marks_duplicates_without_packing_them() {
        let mut image = RgbaImage::new(2, 2);
        for p in image.pixels_mut() {
            *p = image::Rgba([9, 9, 9, 255]);
        }
        let sources = vec![image];

        let sheet = Sheet { index: 0, duplicates: Duplicates::Drop, pack: crate::sprite::Pack::Rows, ..Sheet::default() };
        let mut sprites = vec![sprite(0, Rect::new(0, 0, 2, 2)), sprite(1, Rect::new(0, 0, 2, 2))];
        for s in &mut sprites {
            crate::sprite::initialize_sprite_size(s);
            crate::sprite::update_sprite_rect(s);
        }
        let mut slices = Vec::new();
        pack_slice_deduplicate(&sheet, &mut sprites, &sources, &mut slices).unwrap();

        sprites.sort_by_key(|s| s.index);
        assert!(sprites[1].dropped);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].sprite_ids.len(), 1);
    }
}
