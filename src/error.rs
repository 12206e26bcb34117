//! Crate-wide error types, layered the way `commands::CommandError` wraps
//! `image_util::ImgUtilError` in the teacher: a top-level `PackError` that
//! `#[from]`-wraps the per-stage errors plus the io/image errors they bubble
//! up from.

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("gif encoding error: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Pack(#[from] PackingError),

    #[error("source directory is not a directory: {0}")]
    SourceNotDir(std::path::PathBuf),
}

/// Errors from parsing or validating sheet/sprite configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sheet '{0}' has no sprites")]
    EmptySheet(String),

    #[error("invalid divisible-by value: {0}")]
    InvalidDivisibleBy(i32),

    #[error("slice width/height exceeds max texture size: {0}x{1} > {2}")]
    SliceTooLarge(i32, i32, i32),

    #[error("unknown pack mode: {0}")]
    UnknownPackMode(String),
}

/// Errors raised while packing sprites into slices.
#[derive(Debug, thiserror::Error)]
pub enum PackingError {
    #[error("sprite '{0}' does not fit in any slice of size {1}x{2}")]
    SpriteDoesNotFit(String, i32, i32),

    #[error("could not find a slice arrangement within {0} attempts")]
    NoArrangementFound(u32),
}

pub type PackResult<T> = std::result::Result<T, PackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = PackError::Config(ConfigError::EmptySheet("hero".into()));
        assert_eq!(err.to_string(), "sheet 'hero' has no sprites");
    }

    #[test]
    fn io_errors_convert_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PackError = io_err.into();
        assert!(matches!(err, PackError::Io(_)));
    }
}
