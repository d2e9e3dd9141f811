use crate::foundation::error::{VeilError, VeilResult};

/// Bytes per pixel of every [`Frame`] (RGB8).
pub const CHANNELS: usize = 3;

/// An immutable RGB8 raster, row-major and tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap packed RGB8 bytes. `data.len()` must equal `width * height * 3`.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> VeilResult<Self> {
        if width == 0 || height == 0 {
            return Err(VeilError::validation("frame width/height must be non-zero"));
        }
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(VeilError::validation(format!(
                "frame data has {} bytes, expected {expected} for {width}x{height} rgb8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a frame with the same shape as `self` from already-sized bytes.
    pub(crate) fn with_same_shape(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// A frame filled with a single color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> VeilResult<Self> {
        let len = byte_len(width, height)?;
        let data = rgb.iter().copied().cycle().take(len).collect();
        Self::from_rgb8(width, height, data)
    }

    /// An all-black frame with the same shape as `self`.
    pub fn black_like(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: vec![0; self.data.len()],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Packed RGB8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGB value of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([self.data[off], self.data[off + 1], self.data[off + 2]])
    }

    /// Two frames are shape-compatible when width and height match.
    pub fn is_shape_compatible(&self, other: &Frame) -> bool {
        self.dims() == other.dims()
    }

    /// Return a [`VeilError::ShapeMismatch`] unless `other` has the same shape.
    pub fn ensure_shape_compatible(&self, other: &Frame) -> VeilResult<()> {
        if self.is_shape_compatible(other) {
            return Ok(());
        }
        Err(VeilError::ShapeMismatch {
            left_w: self.width,
            left_h: self.height,
            right_w: other.width,
            right_h: other.height,
        })
    }

    /// Consume the frame into its packed RGB8 bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn into_image(self) -> VeilResult<image::RgbImage> {
        let Self {
            width,
            height,
            data,
        } = self;
        image::RgbImage::from_raw(width, height, data)
            .ok_or_else(|| VeilError::validation("frame buffer does not match its dimensions"))
    }

    pub(crate) fn from_image(img: image::RgbImage) -> VeilResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_rgb8(width, height, img.into_raw())
    }
}

fn byte_len(width: u32, height: u32) -> VeilResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or_else(|| VeilError::validation("frame buffer size overflow"))
}
