use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use maskpaint_shared::{fit_display, Dimensions};

use crate::data_uri;
use crate::error::EditorError;

/// A decoded user image together with the size it is displayed at.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    /// The original file bytes as a data URI, untouched by decoding.
    pub data_uri: String,
    pub natural: Dimensions,
    pub display: Dimensions,
    pixels: Arc<RgbaImage>,
}

impl LoadedImage {
    pub fn from_bytes(bytes: &[u8], max_display_width: u32) -> Result<Self, EditorError> {
        let format =
            image::guess_format(bytes).map_err(|error| EditorError::Decode(error.to_string()))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|error| EditorError::Decode(error.to_string()))?
            .to_rgba8();
        let natural = Dimensions::new(decoded.width(), decoded.height());
        if natural.is_empty() {
            return Err(EditorError::Decode(format!("image has no pixels ({natural})")));
        }
        let display = fit_display(natural, max_display_width);
        log::info!(
            "Loaded {} image natural={natural} display={display}",
            format.to_mime_type()
        );
        Ok(Self {
            data_uri: data_uri::encode(format.to_mime_type(), bytes),
            natural,
            display,
            pixels: Arc::new(decoded),
        })
    }

    pub fn from_data_uri(uri: &str, max_display_width: u32) -> Result<Self, EditorError> {
        let bytes = data_uri::decode(uri)?;
        Self::from_bytes(&bytes, max_display_width)
    }

    pub fn open(path: impl AsRef<Path>, max_display_width: u32) -> Result<Self, EditorError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| EditorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes, max_display_width)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn shared_pixels(&self) -> Arc<RgbaImage> {
        self.pixels.clone()
    }

    /// Factor that maps display coordinates onto natural pixels.
    pub fn display_scale(&self) -> (f32, f32) {
        (
            self.natural.width as f32 / self.display.width as f32,
            self.natural.height as f32 / self.display.height as f32,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    pub(crate) fn png_bytes(width: u32, height: u32, fill: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(fill));
        data_uri::encode_png(&image).unwrap()
    }

    #[test]
    fn wide_image_gets_scaled_display_size() {
        let loaded = LoadedImage::from_bytes(&png_bytes(1600, 900, [255; 4]), 800).unwrap();
        assert_eq!(loaded.natural, Dimensions::new(1600, 900));
        assert_eq!(loaded.display, Dimensions::new(800, 450));
        assert_eq!(loaded.display_scale(), (2.0, 2.0));
        assert!(loaded.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn narrow_image_keeps_natural_size() {
        let loaded = LoadedImage::from_bytes(&png_bytes(320, 200, [0, 0, 0, 255]), 800).unwrap();
        assert_eq!(loaded.display, loaded.natural);
    }

    #[test]
    fn data_uri_keeps_original_bytes() {
        let bytes = png_bytes(4, 4, [1, 2, 3, 255]);
        let loaded = LoadedImage::from_bytes(&bytes, 800).unwrap();
        assert_eq!(data_uri::decode(&loaded.data_uri).unwrap(), bytes);
        let again = LoadedImage::from_data_uri(&loaded.data_uri, 800).unwrap();
        assert_eq!(again.natural, loaded.natural);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = LoadedImage::from_bytes(b"definitely not an image", 800);
        assert!(matches!(result, Err(EditorError::Decode(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = LoadedImage::open("/nonexistent/maskpaint/input.png", 800);
        assert!(matches!(result, Err(EditorError::Io { .. })));
    }
}
