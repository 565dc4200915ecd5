use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::data_uri;
use crate::error::EditorError;

/// Flattens a mask raster over its original image at the original's
/// native resolution.
///
/// The off-screen canvas is kept between calls and only reallocated when
/// the original's dimensions change.
#[derive(Default)]
pub struct Compositor {
    canvas: RgbaImage,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `original`, then `mask` stretched to the same size, and returns
    /// the flattened canvas.
    pub fn compose(&mut self, original: &RgbaImage, mask: &RgbaImage) -> &RgbaImage {
        let (width, height) = original.dimensions();
        if self.canvas.dimensions() != (width, height) {
            self.canvas = RgbaImage::new(width, height);
        }
        self.canvas.copy_from_slice(original.as_raw());
        let scaled = scale_to(mask, width, height);
        imageops::overlay(&mut self.canvas, scaled.as_ref(), 0, 0);
        &self.canvas
    }

    /// Same as [`Compositor::compose`] for data URI inputs, producing a PNG
    /// data URI. The original is decoded before the mask.
    pub fn compose_data_uris(
        &mut self,
        original_uri: &str,
        mask_uri: &str,
    ) -> Result<String, EditorError> {
        let original = decode_rgba(original_uri)?;
        let mask = decode_rgba(mask_uri)?;
        data_uri::png_data_uri(self.compose(&original, &mask))
    }
}

/// Resamples `image` to `width`x`height` with bilinear filtering, borrowing
/// it unchanged when it already has that size.
pub fn scale_to(image: &RgbaImage, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    if image.dimensions() == (width, height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
    }
}

fn decode_rgba(uri: &str) -> Result<RgbaImage, EditorError> {
    let bytes = data_uri::decode(uri)?;
    image::load_from_memory(&bytes)
        .map(|image| image.to_rgba8())
        .map_err(|error| EditorError::Decode(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::rasterize;
    use image::Rgba;
    use maskpaint_shared::{Color, Dimensions, Point, Stroke};

    fn assert_near(actual: Rgba<u8>, expected: [u8; 4]) {
        for (channel, (a, e)) in actual.0.iter().zip(expected).enumerate() {
            assert!(
                a.abs_diff(e) <= 2,
                "channel {channel}: got {:?}, expected {expected:?}",
                actual.0
            );
        }
    }

    fn red_line_mask() -> RgbaImage {
        rasterize(
            &[Stroke {
                color: Color::RED,
                width: 10,
                points: vec![Point::new(100.0, 100.0), Point::new(300.0, 100.0)],
            }],
            Dimensions::new(800, 450),
        )
    }

    #[test]
    fn composite_has_native_resolution_with_scaled_mask() {
        let original = RgbaImage::from_pixel(1600, 900, Rgba([255, 255, 255, 255]));
        let mut compositor = Compositor::new();
        let composite = compositor.compose(&original, &red_line_mask());

        assert_eq!(composite.dimensions(), (1600, 900));
        // (200, 100) in display space lands on (400, 200) natively.
        assert_near(*composite.get_pixel(400, 200), [255, 0, 0, 255]);
        assert_near(*composite.get_pixel(400, 192), [255, 0, 0, 255]);
        assert_eq!(composite.get_pixel(1500, 800).0, [255, 255, 255, 255]);
        assert_eq!(composite.get_pixel(400, 260).0, [255, 255, 255, 255]);
    }

    #[test]
    fn canvas_is_reused_and_reset_between_calls() {
        let mut compositor = Compositor::new();
        let original = RgbaImage::from_pixel(1600, 900, Rgba([0, 0, 255, 255]));
        compositor.compose(&original, &red_line_mask());

        let empty_mask = RgbaImage::new(800, 450);
        let composite = compositor.compose(&original, &empty_mask);
        assert_eq!(composite.get_pixel(400, 200).0, [0, 0, 255, 255]);

        let smaller = RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255]));
        assert_eq!(compositor.compose(&smaller, &empty_mask).dimensions(), (10, 10));
    }

    #[test]
    fn composes_data_uris() {
        let original = RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255]));
        let mask = rasterize(
            &[Stroke {
                color: Color::BLACK,
                width: 4,
                points: vec![Point::new(5.0, 5.0)],
            }],
            Dimensions::new(20, 10),
        );
        let original_uri = data_uri::png_data_uri(&original).unwrap();
        let mask_uri = data_uri::png_data_uri(&mask).unwrap();

        let composite_uri = Compositor::new()
            .compose_data_uris(&original_uri, &mask_uri)
            .unwrap();
        let composite = decode_rgba(&composite_uri).unwrap();
        assert_eq!(composite.dimensions(), (40, 20));
        assert_near(*composite.get_pixel(10, 10), [0, 0, 0, 255]);
    }

    #[test]
    fn undecodable_original_is_reported() {
        let result = Compositor::new().compose_data_uris(
            "data:image/png;base64,AAAA",
            "data:image/png;base64,AAAA",
        );
        assert!(matches!(result, Err(EditorError::Decode(_))));
    }
}
