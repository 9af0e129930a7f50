use super::{Camera, Facing, QrDecoder};
use crate::{CameraError, DecodeError};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// A hand-held scanner that types each decoded code as one line of text.
///
/// The device (or FIFO) is read on a dedicated thread. A capture returns at most one line
/// per tick; no line means no code in view.
#[derive(Debug)]
pub struct WedgeCamera {
    path: PathBuf,
    lines: Option<Receiver<std::io::Result<String>>>,
}

impl WedgeCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
        }
    }
}

impl Camera for WedgeCamera {
    type Frame = String;

    fn open(&mut self, _facing: Facing) -> Result<(), CameraError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            ErrorKind::NotFound => CameraError::NotFound(self.path.display().to_string()),
            _ => CameraError::Device(e.to_string()),
        })?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in BufReader::new(file).lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        self.lines = Some(rx);
        tracing::debug!(device = %self.path.display(), "scanner device opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<String>, CameraError> {
        let lines = self
            .lines
            .as_ref()
            .ok_or_else(|| CameraError::Device("scanner device is not open".into()))?;

        match lines.try_recv() {
            Ok(Ok(line)) => Ok(Some(line)),
            Ok(Err(e)) => Err(CameraError::Device(e.to_string())),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(CameraError::Device("scanner device closed".into()))
            }
        }
    }

    fn release(&mut self) {
        self.lines = None;
    }
}

/// Treats a text frame as the payload itself. Blank lines are empty frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl QrDecoder for TextDecoder {
    type Frame = String;

    fn decode(&self, frame: &String) -> Result<String, DecodeError> {
        let payload = frame.trim();
        if payload.is_empty() {
            return Err(DecodeError::NotFound);
        }
        Ok(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn next_line(camera: &mut WedgeCamera) -> Result<Option<String>, CameraError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match camera.capture() {
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(5))
                }
                other => return other,
            }
        }
    }

    #[test]
    fn reads_one_line_per_capture_then_reports_closed() {
        let tmp = TempDir::new().unwrap();
        let device = tmp.path().join("scanner");
        std::fs::write(&device, "55\n{\"patientId\":\"42\"}\n").unwrap();

        let mut camera = WedgeCamera::new(&device);
        camera.open(Facing::Environment).unwrap();

        assert_eq!(next_line(&mut camera).unwrap().as_deref(), Some("55"));
        assert_eq!(
            next_line(&mut camera).unwrap().as_deref(),
            Some("{\"patientId\":\"42\"}")
        );
        assert!(matches!(
            next_line(&mut camera),
            Err(CameraError::Device(_))
        ));
    }

    #[test]
    fn missing_device_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut camera = WedgeCamera::new(tmp.path().join("ttyACM9"));
        assert!(matches!(
            camera.open(Facing::Environment),
            Err(CameraError::NotFound(_))
        ));
    }

    #[test]
    fn text_decoder_trims_and_skips_blank_lines() {
        assert_eq!(TextDecoder.decode(&"  55 \r".to_string()), Ok("55".into()));
        assert_eq!(
            TextDecoder.decode(&"   ".to_string()),
            Err(DecodeError::NotFound)
        );
    }
}
