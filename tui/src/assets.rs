//! Expression Images
//!
//! Loads optional pre-authored PNGs, one per expression, named
//! `<expression>.png`. When all five are registered the presenter runs in
//! image mode; otherwise it falls back to the synthesized sheet.

use std::path::{Path, PathBuf};

use companion_core::{Expression, Raster, Stage};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from loading expression images
#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset directory does not exist
    #[error("asset directory not found: {0}")]
    MissingDir(PathBuf),

    /// A file exists but is not a decodable image
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Image path for an expression
#[must_use]
pub fn image_path(dir: &Path, expression: Expression) -> PathBuf {
    dir.join(format!("{}.png", expression.name()))
}

/// Register every `<expression>.png` found in `dir` on the stage
///
/// Missing files are skipped; returns how many were registered.
///
/// # Errors
///
/// Returns an error if `dir` does not exist or a present file fails to decode.
pub fn load_expression_images(stage: &mut Stage, dir: &Path) -> Result<usize, AssetError> {
    if !dir.is_dir() {
        return Err(AssetError::MissingDir(dir.to_path_buf()));
    }

    let mut loaded = 0;
    for expression in Expression::ALL {
        let path = image_path(dir, expression);
        if !path.exists() {
            debug!(path = %path.display(), "no image for expression");
            continue;
        }
        let pixels = image::open(&path)
            .map_err(|source| AssetError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        if stage.add_texture(&expression.image_key(), Raster::from_image(pixels)) {
            loaded += 1;
        }
    }

    if loaded == Expression::ALL.len() {
        info!(dir = %dir.display(), "loaded expression images");
    } else if loaded > 0 {
        warn!(
            dir = %dir.display(),
            loaded,
            "incomplete image set, using synthesized sheet"
        );
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::{AssetMode, Presenter, PresenterConfig};
    use image::RgbaImage;
    use tempfile::TempDir;

    fn write_png(dir: &Path, expression: Expression) {
        RgbaImage::new(8, 8)
            .save(image_path(dir, expression))
            .expect("write png");
    }

    #[test]
    fn test_full_set_enables_image_mode() {
        let dir = TempDir::new().unwrap();
        for expression in Expression::ALL {
            write_png(dir.path(), expression);
        }

        let mut stage = Stage::new(640.0, 480.0);
        assert_eq!(load_expression_images(&mut stage, dir.path()).unwrap(), 5);

        let presenter = Presenter::new(&mut stage, PresenterConfig::default());
        assert_eq!(presenter.mode(), AssetMode::Image);
    }

    #[test]
    fn test_partial_set_is_loaded_but_not_used() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), Expression::Greet);

        let mut stage = Stage::new(640.0, 480.0);
        assert_eq!(load_expression_images(&mut stage, dir.path()).unwrap(), 1);

        let presenter = Presenter::new(&mut stage, PresenterConfig::default());
        assert_eq!(presenter.mode(), AssetMode::Procedural);
    }

    #[test]
    fn test_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let mut stage = Stage::new(640.0, 480.0);
        assert!(matches!(
            load_expression_images(&mut stage, &missing),
            Err(AssetError::MissingDir(_))
        ));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(image_path(dir.path(), Expression::Think), b"not a png").unwrap();
        let mut stage = Stage::new(640.0, 480.0);
        assert!(matches!(
            load_expression_images(&mut stage, dir.path()),
            Err(AssetError::Decode { .. })
        ));
    }
}
