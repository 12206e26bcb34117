//! Loading sources from disk and saving packed sheets/animations back out,
//! grounded on `image_util::load_from_path_with_path`/`load_image_from_file`
//! (directory scan, natural filename order, `ImageReader` with guessed
//! format) and on `original_source/src/image_io.cpp`'s `load_image`/
//! `save_image` extension dispatch.

use crate::error::PackError;
use crate::output::{self, Animation, AnimationFrame};
use image::{ImageReader, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A source image whose pixels are only decoded on first access, mirroring
/// the original's mutex-guarded lazy load behind an `ImageFile` handle.
pub struct SourceImage {
    path: PathBuf,
    color_key: Option<Rgba<u8>>,
    cached: OnceLock<RgbaImage>,
}

impl SourceImage {
    #[must_use]
    pub fn new(path: PathBuf, color_key: Option<Rgba<u8>>) -> Self {
        Self { path, color_key, cached: OnceLock::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the decoded image, loading and caching it on first call.
    pub fn get(&self) -> Result<&RgbaImage, PackError> {
        if let Some(image) = self.cached.get() {
            return Ok(image);
        }
        let mut image = load_image(&self.path)?;
        if let Some(key) = self.color_key {
            for pixel in image.pixels_mut() {
                if pixel.0[0] == key.0[0] && pixel.0[1] == key.0[1] && pixel.0[2] == key.0[2] {
                    pixel.0[3] = 0;
                }
            }
        }
        Ok(self.cached.get_or_init(|| image))
    }

    /// Decodes only enough of the file to report its dimensions.
    pub fn dimensions(&self) -> Result<(u32, u32), PackError> {
        if let Some(image) = self.cached.get() {
            return Ok(image.dimensions());
        }
        load_image_header(&self.path)
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "bmp", "tga", "gif"];

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Decodes an image file to RGBA8, guessing the format from its contents
/// rather than trusting the extension.
pub fn load_image(path: &Path) -> Result<RgbaImage, PackError> {
    log::trace!("loading image from {}", path.display());
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgba8();
    Ok(image)
}

/// Reads an image's dimensions without decoding its pixel data.
pub fn load_image_header(path: &Path) -> Result<(u32, u32), PackError> {
    Ok(image::image_dimensions(path)?)
}

/// Loads every image file directly inside `dir` (no recursion), in natural
/// filename order, pairing each with its source path.
pub fn load_sources_from_dir(dir: &Path) -> Result<Vec<(PathBuf, RgbaImage)>, PackError> {
    if !dir.is_dir() {
        return Err(PackError::SourceNotDir(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();

    paths.sort_by(|a, b| {
        natord::compare(&a.to_string_lossy(), &b.to_string_lossy())
    });

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let image = load_image(&path)?;
        images.push((path, image));
    }
    Ok(images)
}

fn ensure_parent_dir(path: &Path) -> Result<(), PackError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Saves a single image, dispatching the container format by extension
/// (`.gif` wraps the image as a one-frame animation, everything else goes
/// through `image`'s own encoder for that format; an unrecognized or
/// missing extension falls back to PNG).
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), PackError> {
    ensure_parent_dir(path)?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "gif" => {
            let animation = Animation {
                frames: vec![AnimationFrame { image: image.clone(), duration_secs: 0.0 }],
                max_colors: 256,
                color_key: None,
                loop_count: 0,
            };
            output::write_gif_animation(path, &animation)
        }
        "bmp" => {
            image.save_with_format(path, image::ImageFormat::Bmp)?;
            Ok(())
        }
        "tga" => {
            image.save_with_format(path, image::ImageFormat::Tga)?;
            Ok(())
        }
        _ => {
            image.save_with_format(path, image::ImageFormat::Png)?;
            Ok(())
        }
    }
}

/// Saves a multi-frame animation; GIF is the only supported animated
/// container, matching the original's `save_animation`.
pub fn save_animation(animation: &Animation, path: &Path) -> Result<(), PackError> {
    ensure_parent_dir(path)?;
    output::write_gif_animation(path, animation)
}

/// Returns the file's last-modified time, used to skip re-packing sheets
/// whose sources haven't changed since the last run.
pub fn get_last_write_time(path: &Path) -> Result<std::time::SystemTime, PackError> {
    Ok(fs::metadata(path)?.modified()?)
}
