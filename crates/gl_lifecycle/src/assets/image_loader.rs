//! Image loading utilities for texture data
//!
//! Provides PNG decoding (and any other format enabled on the `image` crate)
//! into tightly packed RGBA8 pixels ready for texture upload.

use std::path::Path;

use crate::assets::AssetError;
use crate::error::{GfxError, GfxResult};

/// Decoded RGBA8 pixels ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Row-major RGBA pixels, four bytes each
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels, checking the buffer size
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> GfxResult<Self> {
        let data = Self { width, height, pixels };
        data.validate()?;
        Ok(data)
    }

    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref).map_err(|source| AssetError::Decode {
            path: path_ref.display().to_string(),
            source,
        })?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::info!("Loaded image {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            width,
            height,
            pixels: rgba_img.into_raw(),
        })
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
            path: "<memory>".to_string(),
            source,
        })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Loaded image {}x{} from memory", width, height);

        Ok(Self {
            width,
            height,
            pixels: rgba_img.into_raw(),
        })
    }

    /// Create a solid color image (useful for testing and defaults)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: color.repeat(pixel_count),
        }
    }

    /// Whether both dimensions are powers of two
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    /// Check that the image is non-empty and the buffer matches its size
    pub fn validate(&self) -> GfxResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GfxError::invalid_argument(format!(
                "texture dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(GfxError::invalid_argument(format!(
                "expected {expected} bytes of RGBA8 data for {}x{}, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}
