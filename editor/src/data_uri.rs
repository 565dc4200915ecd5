//! `data:` URI helpers. Images move between the loader, the compositor and
//! the submission client as base64 data URIs, the same form a browser's
//! `FileReader::readAsDataURL` and `canvas.toDataURL` produce.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};

use crate::error::EditorError;

pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
    pub base64: bool,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, EditorError> {
        let rest = uri
            .trim_start()
            .strip_prefix("data:")
            .ok_or_else(|| EditorError::InvalidDataUri("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EditorError::InvalidDataUri("missing payload separator".into()))?;
        let (mime, base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        Ok(Self {
            mime,
            payload: payload.trim_end(),
            base64,
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>, EditorError> {
        if !self.base64 {
            return Err(EditorError::InvalidDataUri(
                "only base64 payloads are supported".into(),
            ));
        }
        general_purpose::STANDARD
            .decode(self.payload)
            .map_err(|error| EditorError::InvalidDataUri(error.to_string()))
    }
}

/// Returns the raw payload after the `data:<mime>;base64,` prefix. Input that
/// is not a data URI is assumed to be a bare payload already.
pub fn strip_prefix(uri: &str) -> &str {
    match DataUri::parse(uri) {
        Ok(parsed) => parsed.payload,
        Err(_) => uri.trim(),
    }
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

pub fn decode(uri: &str) -> Result<Vec<u8>, EditorError> {
    DataUri::parse(uri)?.decode()
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|error| EditorError::Encode(error.to_string()))?;
    Ok(buffer.into_inner())
}

pub fn png_data_uri(image: &RgbaImage) -> Result<String, EditorError> {
    Ok(encode(PNG_MIME, &encode_png(image)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base64_uri() {
        let uri = DataUri::parse("data:image/jpeg;base64,AAEC").unwrap();
        assert_eq!(uri.mime, "image/jpeg");
        assert_eq!(uri.payload, "AAEC");
        assert!(uri.base64);
        assert_eq!(uri.decode().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn strip_prefix_drops_only_the_header() {
        assert_eq!(strip_prefix("data:image/png;base64,iVBORw0K"), "iVBORw0K");
        assert_eq!(strip_prefix("iVBORw0K"), "iVBORw0K");
    }

    #[test]
    fn rejects_non_data_uris() {
        assert!(matches!(
            DataUri::parse("https://example.test/a.png"),
            Err(EditorError::InvalidDataUri(_))
        ));
        assert!(matches!(
            DataUri::parse("data:image/png;base64"),
            Err(EditorError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn plain_payloads_cannot_be_decoded() {
        let uri = DataUri::parse("data:text/plain,hello").unwrap();
        assert!(!uri.base64);
        assert!(uri.decode().is_err());
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let image = RgbaImage::new(3, 2);
        let uri = png_data_uri(&image).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        let decoded = image::load_from_memory(&decode(&uri).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
