use crate::foundation::error::{FrescoError, FrescoResult};

pub use kurbo::Affine;

/// A rectangle of straight (non-premultiplied) RGBA8 pixels.
///
/// This is the unit the software pipeline mutates in place and the payload a
/// copy-out writes into a [`Surface2d`]. Rows are tightly packed, top-down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a transparent-black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Create a buffer from existing RGBA8 bytes.
    ///
    /// Fails when `data` does not hold exactly `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> FrescoResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(FrescoError::validation(format!(
                "pixel buffer is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// RGBA8 components of the pixel at `(x, y)`.
    ///
    /// Test and diagnostics helper. Panics outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// A 2D drawing surface owned by the surrounding scene graph.
///
/// The filter pipeline reads sources and writes targets through this type.
/// Only pixel storage, dimensions, and the current drawing transform are
/// modeled; everything else about the host surface is opaque to the engine.
#[derive(Clone, Debug)]
pub struct Surface2d {
    pixels: PixelBuffer,
    /// Current drawing transform. The backend resets this to identity after
    /// copying filtered output onto the surface.
    pub transform: Affine,
}

impl Surface2d {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: PixelBuffer::new(width, height),
            transform: Affine::IDENTITY,
        }
    }

    /// Create a surface over existing RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> FrescoResult<Self> {
        Ok(Self {
            pixels: PixelBuffer::from_rgba8(width, height, data)?,
            transform: Affine::IDENTITY,
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height
    }

    /// Borrow the surface pixels.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Mutably borrow the surface pixels.
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    /// Resize the surface in place. Content is cleared to transparent black,
    /// matching host-canvas resize semantics.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = PixelBuffer::new(width, height);
    }

    /// Replace the surface pixels wholesale, resizing as needed.
    pub fn put_pixels(&mut self, pixels: PixelBuffer) {
        self.pixels = pixels;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
