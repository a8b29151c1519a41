use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("pixel data length {actual} does not match {width}x{height} RGBA")]
    BadDimensions { width: u32, height: u32, actual: usize },
}

/// An RGBA image held in memory, drawable through the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Texture {
    pub fn load(path: impl AsRef<Path>) -> Result<Texture, TextureError> {
        let path = path.as_ref();
        let reader = ImageReader::open(path).map_err(|source| TextureError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let image = reader
            .decode()
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Texture {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Texture, TextureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::BadDimensions {
                width,
                height,
                actual: rgba.len(),
            });
        }
        Ok(Texture { width, height, rgba })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Copies a rectangular region out of this texture. Returns `None` when
    /// the region falls outside the bounds.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Texture> {
        if x.checked_add(width)? > self.width || y.checked_add(height)? > self.height {
            return None;
        }
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for row in y..y + height {
            let start = (row as usize * self.width as usize + x as usize) * 4;
            let end = start + width as usize * 4;
            rgba.extend_from_slice(&self.rgba[start..end]);
        }
        Some(Texture {
            width,
            height,
            rgba,
        })
    }
}
