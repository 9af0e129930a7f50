use super::{Camera, Facing};
use crate::CameraError;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An 8-bit greyscale frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl GrayFrame {
    /// Returns `None` if `pixels` does not hold exactly `width * height` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_image(image: image::DynamicImage) -> Self {
        let gray = image.to_luma8();
        Self {
            width: gray.width(),
            height: gray.height(),
            pixels: gray.into_raw(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, image::ImageError> {
        image::open(path).map(Self::from_image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width as usize + x]
    }
}

/// A camera backed by a snapshot directory.
///
/// Each capture yields the next image file that appeared in the directory since the camera was
/// opened, oldest name first. Files already present at open time are skipped so a stale
/// snapshot is never rescanned.
#[derive(Debug)]
pub struct ImageDirCamera {
    dir: PathBuf,
    seen: HashSet<PathBuf>,
    open: bool,
}

impl ImageDirCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seen: HashSet::new(),
            open: false,
        }
    }

    fn snapshots(&self) -> Result<Vec<PathBuf>, CameraError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            ErrorKind::NotFound => CameraError::NotFound(self.dir.display().to_string()),
            _ => CameraError::Device(e.to_string()),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl Camera for ImageDirCamera {
    type Frame = GrayFrame;

    fn open(&mut self, _facing: Facing) -> Result<(), CameraError> {
        if !self.dir.is_dir() {
            return Err(CameraError::NotFound(self.dir.display().to_string()));
        }
        self.seen = self.snapshots()?.into_iter().collect();
        self.open = true;
        tracing::debug!(dir = %self.dir.display(), skipped = self.seen.len(), "snapshot directory opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<GrayFrame>, CameraError> {
        if !self.open {
            return Err(CameraError::Device("camera is not open".into()));
        }

        let Some(path) = self
            .snapshots()?
            .into_iter()
            .find(|path| !self.seen.contains(path))
        else {
            return Ok(None);
        };
        self.seen.insert(path.clone());

        match GrayFrame::load(&path) {
            Ok(frame) => Ok(Some(frame)),
            Err(e) => {
                // Often a snapshot caught mid-write; treat as an empty frame.
                tracing::warn!(path = %path.display(), error = %e, "unreadable snapshot");
                Ok(None)
            }
        }
    }

    fn release(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str) {
        let img = image::GrayImage::from_raw(2, 2, vec![0, 255, 255, 0]).unwrap();
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn frame_rejects_wrong_buffer_size() {
        assert!(GrayFrame::new(2, 2, vec![0; 3]).is_none());
        let frame = GrayFrame::new(2, 1, vec![10, 20]).unwrap();
        assert_eq!(frame.pixel(1, 0), 20);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut camera = ImageDirCamera::new(tmp.path().join("absent"));
        assert!(matches!(
            camera.open(Facing::Environment),
            Err(CameraError::NotFound(_))
        ));
    }

    #[test]
    fn yields_only_new_snapshots_in_order() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "0-stale.png");

        let mut camera = ImageDirCamera::new(tmp.path());
        camera.open(Facing::Environment).unwrap();
        assert_eq!(camera.capture().unwrap(), None);

        write_png(tmp.path(), "2-second.png");
        write_png(tmp.path(), "1-first.png");
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let first = camera.capture().unwrap().unwrap();
        assert_eq!((first.width(), first.height()), (2, 2));
        assert!(camera.capture().unwrap().is_some());
        assert_eq!(camera.capture().unwrap(), None);
    }

    #[test]
    fn unreadable_snapshot_is_an_empty_frame() {
        let tmp = TempDir::new().unwrap();
        let mut camera = ImageDirCamera::new(tmp.path());
        camera.open(Facing::Environment).unwrap();

        std::fs::write(tmp.path().join("half.png"), b"\x89PNG").unwrap();
        assert_eq!(camera.capture().unwrap(), None);
    }

    #[test]
    fn capture_after_release_fails() {
        let tmp = TempDir::new().unwrap();
        let mut camera = ImageDirCamera::new(tmp.path());
        camera.open(Facing::Environment).unwrap();
        camera.release();
        assert!(matches!(camera.capture(), Err(CameraError::Device(_))));
    }
}
