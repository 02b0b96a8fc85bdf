use std::path::Path;

use crate::gl::PixelFormat;

/// CPU-side pixels ready for upload: tightly packed 8-bit channels, rows bottom-up
/// when loaded with `flip_vertically`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Self {
        Self { width, height, channels, pixels }
    }

    /// Decodes `path`, keeping the file's own channel count (widened to 8 bits per channel).
    pub fn open(path: &Path, flip_vertically: bool) -> Result<Self, String> {
        let image = image::open(path).map_err(|e| e.to_string())?;
        let image = if flip_vertically { image.flipv() } else { image };
        Ok(Self::from_dynamic(image))
    }

    /// Decodes `path` and converts it to 3-channel RGB.
    pub fn open_rgb(path: &Path) -> Result<Self, String> {
        let image = image::open(path).map_err(|e| e.to_string())?;
        let rgb = image.into_rgb8();
        Ok(Self::new(rgb.width(), rgb.height(), 3, rgb.into_raw()))
    }

    pub fn from_dynamic(image: image::DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let channels = image.color().channel_count();
        let pixels = match channels {
            1 => image.into_luma8().into_raw(),
            2 => image.into_luma_alpha8().into_raw(),
            3 => image.into_rgb8().into_raw(),
            _ => image.into_rgba8().into_raw(),
        };
        Self::new(width, height, channels.min(4), pixels)
    }

    /// Bytes a tightly packed image of this size and channel count occupies.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Client pixel layout matching the channel count, if there is one.
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        match self.channels {
            1 => Some(PixelFormat::Red),
            2 => Some(PixelFormat::Rg),
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_rgba_keeps_four_channels() {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 4])));
        let decoded = DecodedImage::from_dynamic(img);
        assert_eq!((decoded.width, decoded.height, decoded.channels), (2, 3, 4));
        assert_eq!(decoded.pixels.len(), 2 * 3 * 4);
        assert_eq!(decoded.pixel_format(), Some(PixelFormat::Rgba));
    }

    #[test]
    fn dynamic_luma_alpha_reports_two_channels() {
        let img = image::DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(4, 4));
        assert_eq!(DecodedImage::from_dynamic(img).channels, 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(DecodedImage::open(Path::new("does/not/exist.png"), true).is_err());
    }

    #[test]
    fn png_round_trips_through_disk_flipped() {
        let dir = std::env::temp_dir().join("glearn-decoded-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("two_rows.png");
        let mut img = image::RgbImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(0, 1, image::Rgb([0, 0, 255]));
        img.save(&path).unwrap();

        let flipped = DecodedImage::open(&path, true).unwrap();
        assert_eq!(flipped.channels, 3);
        assert_eq!(&flipped.pixels[..3], &[0, 0, 255]);

        let upright = DecodedImage::open_rgb(&path).unwrap();
        assert_eq!(&upright.pixels[..3], &[255, 0, 0]);
    }
}
