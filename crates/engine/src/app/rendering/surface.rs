use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use winit::window::Window;

/// Presentation failure, wrapped so the `Surface` trait does not leak a
/// backend error type.
#[derive(Debug, Error)]
#[error("failed to present frame: {0}")]
pub struct PresentError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// The narrow view of the platform surface the renderer consumes: dimensions,
/// a drawable RGBA frame, and a present call. `frame_mut` returning `None`
/// means the backing drawable does not exist yet; drawing is skipped, not an
/// error.
pub trait Surface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn frame_mut(&mut self) -> Option<&mut [u8]>;
    /// Swaps the frame to the display. May block for vertical sync under
    /// platform control.
    fn present(&mut self) -> Result<(), PresentError>;
}

/// `pixels`-backed surface over a winit window.
pub struct PixelSurface {
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl PixelSurface {
    pub fn new(window: Arc<Window>) -> Result<PixelSurface, pixels::Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(window, size.width, size.height)?;
        Ok(PixelSurface {
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn resize(&mut self, window: Arc<Window>, width: u32, height: u32) -> Result<(), pixels::Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(window, width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, pixels::Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame_mut(&mut self) -> Option<&mut [u8]> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.pixels.frame_mut())
    }

    fn present(&mut self) -> Result<(), PresentError> {
        self.pixels
            .render()
            .map_err(|error| PresentError(Box::new(error)))
    }
}
