//! Asset loading
//!
//! A thin file access layer rooted at an asset directory: shader sources as
//! text, arbitrary binary blobs, and images decoded into [`TextureData`].

pub mod image_loader;

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub use image_loader::TextureData;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The file could not be read
    #[error("Failed to read asset {path}: {source}")]
    Io {
        /// Resolved path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file was read but could not be decoded as an image
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        /// Resolved path
        path: String,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// The requested path escapes the asset root or is absolute
    #[error("Illegal asset path: {0}")]
    IllegalPath(String),
}

/// Loads files relative to a root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    /// Create a loader for files below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory all paths are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative asset path, rejecting absolute paths and `..`
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, AssetError> {
        let path = path.as_ref();
        let legal = path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !legal || path.as_os_str().is_empty() {
            return Err(AssetError::IllegalPath(path.display().to_string()));
        }
        Ok(self.root.join(path))
    }

    /// Read a text asset such as a shader source
    pub fn load_text(&self, path: impl AsRef<Path>) -> Result<String, AssetError> {
        let full = self.resolve(path)?;
        std::fs::read_to_string(&full).map_err(|source| AssetError::Io {
            path: full.display().to_string(),
            source,
        })
    }

    /// Read a binary asset
    pub fn load_bytes(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
        let full = self.resolve(path)?;
        std::fs::read(&full).map_err(|source| AssetError::Io {
            path: full.display().to_string(),
            source,
        })
    }

    /// Decode an image asset into RGBA8 texture data
    pub fn load_image(&self, path: impl AsRef<Path>) -> Result<TextureData, AssetError> {
        TextureData::from_file(self.resolve(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gl_lifecycle_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let loader = AssetLoader::new("assets");
        assert_eq!(loader.resolve("shaders/basic.vert").unwrap(), Path::new("assets/shaders/basic.vert"));
        assert!(matches!(loader.resolve("../secret"), Err(AssetError::IllegalPath(_))));
        assert!(matches!(loader.resolve("/etc/passwd"), Err(AssetError::IllegalPath(_))));
        assert!(matches!(loader.resolve(""), Err(AssetError::IllegalPath(_))));
    }

    #[test]
    fn test_load_text_and_bytes() {
        let dir = scratch_dir("text");
        std::fs::write(dir.join("basic.vert"), "#version 330 core\n").unwrap();
        let loader = AssetLoader::new(&dir);

        assert_eq!(loader.load_text("basic.vert").unwrap(), "#version 330 core\n");
        assert_eq!(loader.load_bytes("basic.vert").unwrap().len(), 18);
        assert!(matches!(loader.load_text("missing.frag"), Err(AssetError::Io { .. })));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_image_from_root() {
        let dir = scratch_dir("image");
        std::fs::create_dir_all(dir.join("textures")).unwrap();
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(dir.join("textures/checker.png"))
            .unwrap();
        std::fs::write(dir.join("textures/not_an_image.png"), b"plain text").unwrap();
        let loader = AssetLoader::new(&dir);

        let data = loader.load_image("textures/checker.png").unwrap();
        assert_eq!((data.width, data.height), (4, 2));
        assert_eq!(&data.pixels[0..4], &[10, 20, 30, 255]);
        assert!(data.validate().is_ok());

        assert!(matches!(
            loader.load_image("textures/not_an_image.png"),
            Err(AssetError::Decode { .. })
        ));
        assert!(matches!(loader.load_image("../checker.png"), Err(AssetError::IllegalPath(_))));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
