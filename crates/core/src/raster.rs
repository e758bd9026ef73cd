//! RGBA8 pixel storage with 2-D addressing.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::CoreError;

const CHANNELS: usize = 4;

/// Row-major RGBA8 buffer. All access goes through `(x, y)` accessors
/// that bounds-check against `width` and `height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// A fully transparent raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * CHANNELS],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) * CHANNELS)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        let at = self.offset(x, y)?;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[at..at + CHANNELS]);
        Some(rgba)
    }

    /// Write one pixel. Returns `false` (and writes nothing) when the
    /// coordinate is outside the raster.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) -> bool {
        match self.offset(x, y) {
            Some(at) => {
                self.pixels[at..at + CHANNELS].copy_from_slice(&rgba);
                true
            }
            None => false,
        }
    }

    /// Raw row-major bytes, four per pixel.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage, CoreError> {
        let (w, h) = (dimension(self.width)?, dimension(self.height)?);
        RgbaImage::from_raw(w, h, self.pixels.clone())
            .ok_or_else(|| CoreError::Encoding("pixel buffer does not match dimensions".into()))
    }
}

fn dimension(value: usize) -> Result<u32, CoreError> {
    u32::try_from(value).map_err(|_| CoreError::Encoding(format!("dimension {value} too large")))
}

/// A rendered heatmap: the raster plus the value range it was scaled to.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    raster: Raster,
    /// Value mapped to the first palette entry (legend bottom).
    min_value: f64,
    /// Value mapped to the last palette entry (legend top).
    max_value: f64,
}

impl Bitmap {
    pub fn new(raster: Raster, min_value: f64, max_value: f64) -> Self {
        Self {
            raster,
            min_value,
            max_value,
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn width(&self) -> usize {
        self.raster.width()
    }

    pub fn height(&self) -> usize {
        self.raster.height()
    }

    /// Encode as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, CoreError> {
        let image = self.raster.to_rgba_image()?;
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(out.into_inner())
    }
}
