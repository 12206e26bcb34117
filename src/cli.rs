//! Thin `clap` front end that drives the packing pipeline end to end over a
//! directory of sprite PNGs, in the teacher's `#[derive(Args)]` /
//! `SharedArgs`-deref style (`commands/spritesheet.rs::SpritesheetArgs`).
//! Not the configuration-DSL / filename-sequence-expansion surface the
//! distilled spec places out of scope — just the minimum ambient entry
//! point a shippable crate needs.

use crate::error::PackError;
use crate::finalize;
use crate::io;
use crate::render;
use crate::sprite::{Duplicates, Pack, Sheet, Sprite, Trim};
use clap::Args;
use std::path::PathBuf;

#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Folder containing the individual sprite images.
    pub source: PathBuf,

    /// Output folder the packed slices are written to.
    pub output: PathBuf,

    /// Packing strategy to use for this sheet.
    #[clap(long, default_value_t = Pack::Binpack)]
    pub pack: Pack,

    /// Allow sprites to be rotated 90 degrees when it improves packing.
    #[clap(long, action)]
    pub allow_rotate: bool,

    /// Duplicate-sprite policy.
    #[clap(long, default_value_t = Duplicates::Keep)]
    pub duplicates: Duplicates,

    /// Minimum sheet width; 0 lets the packer size it from content.
    #[clap(long, default_value_t = 0)]
    pub width: i32,

    /// Minimum sheet height; 0 lets the packer size it from content.
    #[clap(long, default_value_t = 0)]
    pub height: i32,

    /// Maximum sheet width; 0 means unbounded.
    #[clap(long, default_value_t = 0)]
    pub max_width: i32,

    /// Maximum sheet height; 0 means unbounded.
    #[clap(long, default_value_t = 0)]
    pub max_height: i32,

    /// Round the final sheet size up to a power of two.
    #[clap(long, action)]
    pub power_of_two: bool,

    /// Force the final sheet to be square.
    #[clap(long, action)]
    pub square: bool,

    /// Round sheet width up to a multiple of this value; 0 disables it.
    #[clap(long, default_value_t = 0)]
    pub divisible_width: i32,

    /// Empty border kept around the whole sheet.
    #[clap(long, default_value_t = 0)]
    pub border_padding: i32,

    /// Empty gap kept between sprites.
    #[clap(long, default_value_t = 0)]
    pub shape_padding: i32,

    /// How far to trim fully-transparent borders off each sprite before
    /// packing.
    #[clap(long, default_value_t = Trim::Rect)]
    pub trim: Trim,

    /// Alpha value at or below which a pixel counts as empty for trimming.
    #[clap(long, default_value_t = 0)]
    pub trim_threshold: i32,

    /// Outward pixel replication added around each sprite, e.g. to avoid
    /// bilinear bleeding at its edges.
    #[clap(long, default_value_t = 0)]
    pub extrude: i32,
}

impl PackArgs {
    pub fn execute(&self) -> Result<(), PackError> {
        let sources = io::load_sources_from_dir(&self.source)?;
        if sources.is_empty() {
            log::warn!("{}: no source images found", self.source.display());
            return Ok(());
        }
        log::info!("loaded {} source image(s) from {}", sources.len(), self.source.display());

        let images: Vec<image::RgbaImage> = sources.iter().map(|(_, image)| image.clone()).collect();

        let sheet = Sheet {
            index: 0,
            id: "sheet".into(),
            width: self.width,
            height: self.height,
            max_width: self.max_width,
            max_height: self.max_height,
            power_of_two: self.power_of_two,
            square: self.square,
            divisible_width: self.divisible_width,
            allow_rotate: self.allow_rotate,
            border_padding: self.border_padding,
            shape_padding: self.shape_padding,
            duplicates: self.duplicates,
            pack: self.pack,
        };

        let mut sprites: Vec<Sprite> = sources
            .iter()
            .enumerate()
            .map(|(index, (path, image))| {
                let id = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| index.to_string());
                let source_rect = crate::geometry::Rect::new(0, 0, image.width() as i32, image.height() as i32);
                let mut sprite = Sprite::new(index, id, 0, index, source_rect);
                sprite.trim = self.trim;
                sprite.trim_threshold = self.trim_threshold;
                sprite.trimmed_source_rect = crate::imagebuf::compute_trimmed_rect(image, source_rect, self.trim, self.trim_threshold, sprite.trim_gray_levels);
                sprite.extrude = crate::sprite::Extrude { count: self.extrude, mode: crate::sprite::WrapMode::Clamp };
                sprite
            })
            .collect();

        let slices = finalize::pack_sprites(&mut sprites, std::slice::from_ref(&sheet), &images)?;
        log::info!("packed {} sprite(s) into {} slice(s)", sprites.len(), slices.len());

        std::fs::create_dir_all(&self.output)?;
        for slice in &slices {
            let canvas = render::render_slice(slice, &sprites, |source_index| images.get(source_index).cloned());
            let out_path = self.output.join(format!("{}-{}.png", sheet.id, slice.index));
            io::save_image(&canvas, &out_path)?;
            log::info!("wrote {} ({}x{})", out_path.display(), slice.width, slice.height);
        }

        Ok(())
    }
}
