//! Pack strategy dispatch (C6). Each strategy takes one sheet's sprites
//! (already sorted by `Sprite::index`, already deduplicated if the sheet
//! asks for it) and places them into one or more [`Slice`]s, appending to a
//! shared slice vector so a sprite's `slice_index` can be fixed at the
//! moment its slice is pushed, per `packing.cpp::pack_sprites_by_sheet`.

mod binpack;
mod compact;
mod lines;
mod simple;

use crate::error::PackingError;
use crate::sprite::{Pack, Sheet, Slice, Sprite};

/// `get_max_size` from `packing.cpp`: folds an explicit size, a max-size cap
/// and power-of-two rounding into a single usable bound.
fn get_max_size(size: i32, max_size: i32, power_of_two: bool) -> i32 {
    let size = if power_of_two && size != 0 { crate::geometry::ceil_to_pot(size as u32) as i32 } else { size };
    let max_size = if power_of_two && max_size != 0 { crate::geometry::floor_to_pot(max_size as u32) as i32 } else { max_size };

    match (size > 0, max_size > 0) {
        (true, true) => size.min(max_size),
        (true, false) => size,
        (false, true) => max_size,
        (false, false) => i32::MAX,
    }
}

/// `get_slice_max_size`: usable width/height of one slice, minus the border
/// padding reserved on both ends.
#[must_use]
pub fn slice_max_size(sheet: &Sheet) -> (i32, i32) {
    (get_max_size(sheet.width, sheet.max_width, sheet.power_of_two), get_max_size(sheet.height, sheet.max_height, sheet.power_of_two))
}

/// Dispatches to the strategy named by `sheet.pack`. `sprites` must be
/// non-empty and belong entirely to `sheet`.
pub fn pack_slice(sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>) -> Result<(), PackingError> {
    debug_assert!(!sprites.is_empty());
    match sheet.pack {
        Pack::Binpack => binpack::pack_binpack(sheet, sprites, slices),
        Pack::Rows => lines::pack_lines(true, sheet, sprites, slices),
        Pack::Columns => lines::pack_lines(false, sheet, sprites, slices),
        Pack::Compact => compact::pack_compact(sheet, sprites, slices),
        Pack::Single => simple::pack_single(sheet, sprites, slices),
        Pack::Origin => simple::pack_origin(sheet, sprites, slices, false),
        Pack::Layers => simple::pack_origin(sheet, sprites, slices, true),
        Pack::Keep => simple::pack_keep(sheet, sprites, slices),
    }
}

/// Appends `sprites[range]` as a new slice of `sheet`, fixing each member's
/// `slice_index` to the slice's (final, append-only) position.
fn push_slice(sheet: &Sheet, sprites: &mut [Sprite], slices: &mut Vec<Slice>) {
    let slice_index = slices.len() as i32;
    let sprite_ids = sprites.iter().map(|s| s.index).collect();
    for sprite in sprites.iter_mut() {
        sprite.slice_index = slice_index;
    }
    let mut slice = Slice {
        index: slice_index,
        sheet_index: sheet.index as usize,
        width: 0,
        height: 0,
        sprite_ids,
    };
    crate::finalize::recompute_slice_size(sheet, sprites, &mut slice);
    slices.push(slice);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_size_prefers_explicit_over_cap() {
        assert_eq!(get_max_size(100, 200, false), 100);
        assert_eq!(get_max_size(0, 200, false), 200);
        assert_eq!(get_max_size(0, 0, false), i32::MAX);
    }

    #[test]
    fn max_size_rounds_to_power_of_two() {
        assert_eq!(get_max_size(100, 0, true), 128);
        assert_eq!(get_max_size(0, 100, true), 64);
    }
}
