use super::{GrayFrame, QrDecoder};
use crate::DecodeError;

/// Locates and decodes QR codes in greyscale frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    type Frame = GrayFrame;

    /// Returns the first grid that decodes. A grid that is found but cannot be read is an
    /// engine error, not an empty frame.
    fn decode(&self, frame: &GrayFrame) -> Result<String, DecodeError> {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width() as usize,
            frame.height() as usize,
            |x, y| frame.pixel(x, y),
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(DecodeError::NotFound);
        }

        let mut failure = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(content),
                Err(e) => failure = Some(format!("{e:?}")),
            }
        }
        Err(DecodeError::Engine(
            failure.unwrap_or_else(|| "unreadable QR code".into()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrcode::{Color, QrCode};

    const SCALE: usize = 6;
    const QUIET_ZONE: usize = 4;

    /// Render `payload` as a black-on-white frame with a quiet zone.
    fn render(payload: &str) -> GrayFrame {
        let code = QrCode::new(payload.as_bytes()).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let side = (modules + 2 * QUIET_ZONE) * SCALE;

        let mut pixels = vec![255u8; side * side];
        for (i, color) in colors.iter().enumerate() {
            if *color != Color::Dark {
                continue;
            }
            let (mx, my) = (i % modules + QUIET_ZONE, i / modules + QUIET_ZONE);
            for y in my * SCALE..(my + 1) * SCALE {
                for x in mx * SCALE..(mx + 1) * SCALE {
                    pixels[y * side + x] = 0;
                }
            }
        }
        GrayFrame::new(side as u32, side as u32, pixels).unwrap()
    }

    #[test]
    fn decodes_structured_payload() {
        let frame = render(r#"{"patientId":"42"}"#);
        assert_eq!(
            RqrrDecoder.decode(&frame),
            Ok(r#"{"patientId":"42"}"#.to_string())
        );
    }

    #[test]
    fn decodes_sentinel_token() {
        let frame = render(crate::constants::SENTINEL_PAYLOAD);
        assert_eq!(
            RqrrDecoder.decode(&frame).unwrap(),
            crate::constants::SENTINEL_PAYLOAD
        );
    }

    #[test]
    fn blank_frame_is_not_found() {
        let frame = GrayFrame::new(64, 64, vec![255; 64 * 64]).unwrap();
        assert_eq!(RqrrDecoder.decode(&frame), Err(DecodeError::NotFound));
    }

    #[test]
    fn decodes_snapshot_written_to_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let frame = render("55");
        let path = tmp.path().join("scan.png");
        image::GrayImage::from_raw(frame.width(), frame.height(), {
            let mut raw = Vec::new();
            for y in 0..frame.height() as usize {
                for x in 0..frame.width() as usize {
                    raw.push(frame.pixel(x, y));
                }
            }
            raw
        })
        .unwrap()
        .save(&path)
        .unwrap();

        let loaded = GrayFrame::load(&path).unwrap();
        assert_eq!(RqrrDecoder.decode(&loaded).unwrap(), "55");
    }
}
