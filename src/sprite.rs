//! Sheet/sprite/slice data model and the pre-pack prepass.
//!
//! Mirrors `input.h`'s `Sheet`/`Sprite`/`Extrude` structs, with the C++
//! `shared_ptr<const ImageFile>` fields replaced by plain indices into an
//! arena the caller owns (see `io::SourceImage`), since Rust has no implicit
//! shared ownership of immutable data the way the original leans on
//! `shared_ptr`.

use crate::geometry::{Anchor, AnchorF, Margin, Point, Rect, Size};
use crate::transform::TransformStep;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Trim {
    #[default]
    None,
    Rect,
    Convex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Alpha {
    #[default]
    Keep,
    Opaque,
    Clear,
    Bleed,
    Premultiply,
    Colorkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Pack {
    #[default]
    Binpack,
    Rows,
    Columns,
    Compact,
    Origin,
    Single,
    Layers,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Duplicates {
    #[default]
    Keep,
    Share,
    Drop,
}

/// How extruded border pixels are sourced. Not present in the retrieved
/// original sources; `Clamp` matches the original's un-flagged extrude
/// behavior (repeat the edge pixel) and is kept as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum WrapMode {
    #[default]
    Clamp,
    Mirror,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extrude {
    pub count: i32,
    pub mode: WrapMode,
}

/// A pack target: the configuration shared by every sprite placed on it.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub index: i32,
    pub id: String,
    pub width: i32,
    pub height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub power_of_two: bool,
    pub square: bool,
    pub divisible_width: i32,
    pub allow_rotate: bool,
    pub border_padding: i32,
    pub shape_padding: i32,
    pub duplicates: Duplicates,
    pub pack: Pack,
}

impl Default for Sheet {
    fn default() -> Self {
        Self {
            index: 0,
            id: String::new(),
            width: 0,
            height: 0,
            max_width: 0,
            max_height: 0,
            power_of_two: false,
            square: false,
            divisible_width: 0,
            allow_rotate: false,
            border_padding: 0,
            shape_padding: 0,
            duplicates: Duplicates::default(),
            pack: Pack::default(),
        }
    }
}

/// A single input image's packing configuration and (after packing) its
/// placement.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub index: usize,
    pub id: String,
    pub sheet_index: usize,
    pub source_index: usize,
    pub source_rect: Rect,
    pub trimmed_source_rect: Rect,
    pub pivot: AnchorF,
    pub trim: Trim,
    pub trim_margin: Margin,
    pub trim_threshold: i32,
    pub trim_gray_levels: bool,
    pub crop: bool,
    pub crop_pivot: bool,
    pub margin: Margin,
    pub extrude: Extrude,
    pub min_size: Size,
    pub divisible_size: Size,
    pub common_size: Option<String>,
    pub align: Anchor,
    pub align_pivot: Option<String>,
    pub tags: HashMap<String, String>,

    pub transforms: Vec<TransformStep>,
    pub untransformed_source_rect: Option<Rect>,

    pub slice_index: i32,
    pub size: Size,
    pub rect: Rect,
    pub trimmed_rect: Rect,
    pub rotated: bool,
    pub duplicate_of_index: i32,
    /// Set when `Duplicates::Drop` removes this sprite as a duplicate; keeps
    /// it out of the "failed to pack" warning despite `slice_index < 0`.
    pub dropped: bool,
}

impl Sprite {
    #[must_use]
    pub fn new(index: usize, id: String, sheet_index: usize, source_index: usize, source_rect: Rect) -> Self {
        Self {
            index,
            id,
            sheet_index,
            source_index,
            source_rect,
            trimmed_source_rect: source_rect,
            pivot: AnchorF::default(),
            trim: Trim::default(),
            trim_margin: Margin::default(),
            trim_threshold: 0,
            trim_gray_levels: false,
            crop: false,
            crop_pivot: false,
            margin: Margin::default(),
            extrude: Extrude::default(),
            min_size: Size::default(),
            divisible_size: Size::default(),
            common_size: None,
            align: Anchor::default(),
            align_pivot: None,
            tags: HashMap::new(),
            transforms: Vec::new(),
            untransformed_source_rect: None,
            slice_index: -1,
            size: Size::default(),
            rect: Rect::default(),
            trimmed_rect: Rect::default(),
            rotated: false,
            duplicate_of_index: -1,
            dropped: false,
        }
    }
}

/// One packed output image: a fixed-size canvas plus the sprites placed on
/// it, referenced by stable `Sprite::index`.
#[derive(Debug, Clone, Default)]
pub struct Slice {
    pub index: i32,
    pub sheet_index: usize,
    pub width: i32,
    pub height: i32,
    pub sprite_ids: Vec<usize>,
}

/// C5 step 1: size from the trimmed source rect, extrude padding and
/// `min_size`/`divisible_size` rounding. Margin and shape padding are applied
/// later (margin during finalize, shape padding inline by the packer).
pub fn initialize_sprite_size(sprite: &mut Sprite) {
    let trimmed = sprite.trimmed_source_rect;
    let extra = sprite.extrude.count * 2;
    let w = sprite.min_size.x.max(crate::geometry::ceil_to_multiple(trimmed.w + extra, sprite.divisible_size.x));
    let h = sprite.min_size.y.max(crate::geometry::ceil_to_multiple(trimmed.h + extra, sprite.divisible_size.y));
    sprite.size = Size::new(w, h);
}

/// C5 step 2: resolves `align` into a concrete, non-negative pixel offset of
/// the trimmed content inside the sprite's allocated box, growing the box if
/// the alignment pushes content past its current edge.
pub fn update_sprite_alignment(sprite: &mut Sprite) {
    let margin = sprite.size - sprite.trimmed_source_rect.size();
    let coords = crate::geometry::anchor_coords(&sprite.align, margin);
    sprite.align.x += coords.x;
    sprite.align.y += coords.y;
    sprite.align.x = sprite.align.x.max(0);
    sprite.align.y = sprite.align.y.max(0);
    sprite.size.x = sprite.size.x.max(sprite.trimmed_source_rect.w + sprite.align.x);
    sprite.size.y = sprite.size.y.max(sprite.trimmed_source_rect.h + sprite.align.y);
}

fn pivot_coords(sprite: &Sprite) -> crate::geometry::PointF {
    let size = if sprite.crop_pivot { sprite.trimmed_source_rect.size() } else { sprite.source_rect.size() };
    crate::geometry::anchor_coords_f(&sprite.pivot, crate::geometry::SizeF { x: f64::from(size.x), y: f64::from(size.y) })
}

/// C5 step 3: sprites sharing an `align_pivot` group key are shifted so
/// their declared pivots land on a common point, growing each sprite's size
/// by the shift so the pivot position does not move off-canvas.
pub fn update_aligned_pivot(sprites: &mut [Sprite]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, sprite) in sprites.iter().enumerate() {
        if let Some(key) = &sprite.align_pivot {
            groups.entry(key.clone()).or_default().push(i);
        }
    }

    for members in groups.values() {
        let mut max_pivot = crate::geometry::PointF { x: f64::MIN, y: f64::MIN };
        for &i in members {
            let p = pivot_coords(&sprites[i]);
            max_pivot.x = max_pivot.x.max(p.x);
            max_pivot.y = max_pivot.y.max(p.y);
        }
        for &i in members {
            let p = pivot_coords(&sprites[i]);
            let offset = Point { x: (max_pivot.x - p.x).round() as i32, y: (max_pivot.y - p.y).round() as i32 };
            let sprite = &mut sprites[i];
            sprite.align = Anchor {
                x: offset.x,
                y: offset.y,
                anchor_x: crate::geometry::AnchorX::Left,
                anchor_y: crate::geometry::AnchorY::Top,
            };
            sprite.size.x += offset.x;
            sprite.size.y += offset.y;
        }
    }
}

/// C5 step 4: sprites sharing a `common_size` tag grow to their group's
/// maximum width/height, so animation frames of varying silhouette still
/// land on a uniform cell.
pub fn update_common_size(sprites: &mut [Sprite]) {
    let mut max_by_group: HashMap<String, Size> = HashMap::new();
    for sprite in sprites.iter() {
        if let Some(group) = &sprite.common_size {
            let entry = max_by_group.entry(group.clone()).or_insert(Size::new(0, 0));
            entry.x = entry.x.max(sprite.size.x);
            entry.y = entry.y.max(sprite.size.y);
        }
    }
    for sprite in sprites.iter_mut() {
        if let Some(group) = &sprite.common_size {
            if let Some(&size) = max_by_group.get(group) {
                sprite.size = size;
            }
        }
    }
}

/// C5 step 5: seeds `rect` at the sprite's untransformed source position;
/// packing strategies overwrite `rect.x`/`rect.y` with the slice placement.
pub fn update_sprite_rect(sprite: &mut Sprite) {
    sprite.rect = Rect::new(sprite.trimmed_source_rect.x, sprite.trimmed_source_rect.y, sprite.size.x, sprite.size.y);
}

/// Runs the full prepass in the original's exact order: sizing; alignment
/// for pivot-grouped sprites (so their size is final before the pivot
/// group-max is computed); pivot grouping; common-size reconciliation;
/// alignment for the remaining sprites; final rect seeding.
pub fn prepass(sprites: &mut [Sprite]) {
    for sprite in sprites.iter_mut() {
        initialize_sprite_size(sprite);
    }
    for sprite in sprites.iter_mut() {
        if sprite.align_pivot.is_some() {
            update_sprite_alignment(sprite);
        }
    }
    update_aligned_pivot(sprites);
    update_common_size(sprites);
    for sprite in sprites.iter_mut() {
        if sprite.align_pivot.is_none() {
            update_sprite_alignment(sprite);
        }
    }
    for sprite in sprites.iter_mut() {
        update_sprite_rect(sprite);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(size: Size) -> Sprite {
        let mut s = Sprite::new(0, "s".into(), 0, 0, Rect::new(0, 0, size.x, size.y));
        s.trimmed_source_rect = Rect::new(0, 0, size.x, size.y);
        s
    }

    #[test]
    fn initialize_size_adds_extrude_padding() {
        let mut s = sprite(Size::new(10, 10));
        s.extrude = Extrude { count: 2, mode: WrapMode::Clamp };
        initialize_sprite_size(&mut s);
        assert_eq!(s.size, Size::new(14, 14));
    }

    #[test]
    fn common_size_grows_to_group_max() {
        let mut a = sprite(Size::new(10, 10));
        a.common_size = Some("walk".into());
        let mut b = sprite(Size::new(20, 15));
        b.common_size = Some("walk".into());
        let mut sprites = vec![a, b];
        for s in &mut sprites {
            initialize_sprite_size(s);
        }
        update_common_size(&mut sprites);
        assert_eq!(sprites[0].size, Size::new(20, 15));
        assert_eq!(sprites[1].size, Size::new(20, 15));
    }

    #[test]
    fn divisible_size_rounds_up() {
        let mut s = sprite(Size::new(10, 10));
        s.divisible_size = Size::new(16, 16);
        initialize_sprite_size(&mut s);
        assert_eq!(s.size, Size::new(16, 16));
    }

    #[test]
    fn prepass_runs_all_steps_without_panicking() {
        let mut sprites = vec![sprite(Size::new(8, 8)), sprite(Size::new(12, 4))];
        prepass(&mut sprites);
        assert_eq!(sprites[0].rect.size(), sprites[0].size);
    }
}
