use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::{Dimensions, Stroke};

pub const DRAFT_FILE_MAGIC: [u8; 4] = *b"MPDR";
pub const DRAFT_FILE_VERSION: u32 = 1;
const DRAFT_HEADER_LEN: usize = DRAFT_FILE_MAGIC.len() + std::mem::size_of::<u32>();
/// Upper bound on what decoding a draft body may allocate.
const DRAFT_DECODE_LIMIT: usize = 16 * 1024 * 1024;

/// Strokes drawn over an image, in the display coordinates of `display`.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct MaskDraft {
    #[serde(default)]
    pub display: Option<Dimensions>,
    pub strokes: Vec<Stroke>,
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Unsupported draft file version: {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid draft data: {0}")]
    InvalidData(String),
}

pub fn encode_draft_file(draft: &MaskDraft) -> Result<Vec<u8>, DraftError> {
    let body = bincode::encode_to_vec(draft, bincode::config::standard())
        .map_err(|error| DraftError::InvalidData(error.to_string()))?;
    let mut payload = Vec::with_capacity(DRAFT_HEADER_LEN + body.len());
    payload.extend_from_slice(&DRAFT_FILE_MAGIC);
    payload.extend_from_slice(&DRAFT_FILE_VERSION.to_le_bytes());
    payload.extend_from_slice(&body);
    Ok(payload)
}

pub fn decode_draft_file(payload: &[u8]) -> Result<MaskDraft, DraftError> {
    if !(payload.len() >= DRAFT_HEADER_LEN && payload.starts_with(&DRAFT_FILE_MAGIC)) {
        return Err(DraftError::InvalidData("missing draft header".into()));
    }
    let version = u32::from_le_bytes(
        payload[DRAFT_FILE_MAGIC.len()..DRAFT_HEADER_LEN]
            .try_into()
            .map_err(|_| DraftError::InvalidData("truncated header".into()))?,
    );
    let body = &payload[DRAFT_HEADER_LEN..];
    match version {
        1 => bincode::decode_from_slice(
            body,
            bincode::config::standard().with_limit::<DRAFT_DECODE_LIMIT>(),
        )
        .map(|(draft, _)| draft)
            .map_err(|error| DraftError::InvalidData(error.to_string())),
        _ => Err(DraftError::UnsupportedVersion(version)),
    }
}

/// Accepts the binary draft format, a JSON draft object, or a bare JSON
/// array of strokes.
pub fn parse_draft(bytes: &[u8]) -> Result<MaskDraft, DraftError> {
    if bytes.starts_with(&DRAFT_FILE_MAGIC) {
        return decode_draft_file(bytes);
    }
    if let Ok(draft) = serde_json::from_slice::<MaskDraft>(bytes) {
        return Ok(draft);
    }
    serde_json::from_slice::<Vec<Stroke>>(bytes)
        .map(|strokes| MaskDraft {
            display: None,
            strokes,
        })
        .map_err(|error| DraftError::InvalidData(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Point};

    fn sample() -> MaskDraft {
        MaskDraft {
            display: Some(Dimensions::new(800, 450)),
            strokes: vec![Stroke {
                color: Color::RED,
                width: 12,
                points: vec![Point::new(10.0, 10.0), Point::new(40.5, 22.25)],
            }],
        }
    }

    #[test]
    fn binary_draft_survives_encoding() {
        let bytes = encode_draft_file(&sample()).unwrap();
        assert!(bytes.starts_with(&DRAFT_FILE_MAGIC));
        assert_eq!(parse_draft(&bytes).unwrap(), sample());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode_draft_file(&sample()).unwrap();
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            decode_draft_file(&bytes),
            Err(DraftError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(matches!(
            decode_draft_file(b"MPD"),
            Err(DraftError::InvalidData(_))
        ));
    }

    #[test]
    fn oversized_stroke_count_is_rejected() {
        let mut bytes = Vec::from(DRAFT_FILE_MAGIC);
        bytes.extend_from_slice(&DRAFT_FILE_VERSION.to_le_bytes());
        // No display, then a varint u64 length of 2^40 strokes.
        bytes.extend_from_slice(&[0x00, 0xFD]);
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        assert!(matches!(parse_draft(&bytes), Err(DraftError::InvalidData(_))));
    }

    #[test]
    fn parses_bare_json_stroke_list() {
        let json = r##"[{"color":"#00FF00","width":5,"points":[{"x":1.0,"y":2.0}]}]"##;
        let draft = parse_draft(json.as_bytes()).unwrap();
        assert_eq!(draft.display, None);
        assert_eq!(draft.strokes.len(), 1);
        assert_eq!(draft.strokes[0].color, Color::GREEN);
    }

    #[test]
    fn parses_json_draft_object() {
        let json = r##"{"display":{"width":100,"height":50},"strokes":[]}"##;
        let draft = parse_draft(json.as_bytes()).unwrap();
        assert_eq!(draft.display, Some(Dimensions::new(100, 50)));
        assert!(draft.strokes.is_empty());
    }
}
